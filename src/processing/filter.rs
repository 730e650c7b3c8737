// Filter operations for data processing
// Author: Gabriel Demetrios Lafis

use log::debug;

use crate::data::names::require_non_empty;
use crate::data::{DataError, DataFrame, Record, RecordLayout, Schema};
use super::{check_input, DataProcessor, ProcessingError, ProcessorType};

/// Keep the rows for which a predicate holds.
///
/// The selection only limits what the predicate can see; every column is kept
/// and the surviving rows stay in their original order. A predicate error,
/// such as a [`DataError::Callback`], aborts the query and is returned as is.
///
/// ```rust
/// use columnar_frame_engine::data::{DataError, DataFrame, SchemaBuilder};
/// use columnar_frame_engine::processing::ProcessingError;
/// use columnar_frame_engine::values;
///
/// let schema = SchemaBuilder::new().add_integer("age").build().unwrap();
/// let mut frame = DataFrame::new(schema);
/// frame.insert(values![30]).unwrap();
/// frame.insert(values![-1]).unwrap();
///
/// let result = frame.query(|r| match r.integer("age")? {
///     age if age < 0 => Err(DataError::Callback(format!("negative age {}", age))),
///     age => Ok(age < 60),
/// });
/// assert!(matches!(result, Err(ProcessingError::Data(DataError::Callback(_)))));
/// ```
pub struct QueryFilter<F> {
    layout: RecordLayout,
    predicate: F,
    schema: Schema,
}

impl<F> QueryFilter<F>
where
    F: Fn(&Record<'_>) -> Result<bool, DataError>,
{
    /// Create a new query filter over `selection` (every column when `None`)
    pub fn new(schema: &Schema, selection: Option<&[&str]>, predicate: F) -> Result<Self, ProcessingError> {
        if let Some(names) = selection {
            require_non_empty(names, "selection")?;
        }
        let layout = RecordLayout::new(schema, selection)?;
        debug!("query: predicate sees {:?}", layout.names());

        Ok(QueryFilter {
            layout,
            predicate,
            schema: schema.clone(),
        })
    }
}

impl<F> DataProcessor for QueryFilter<F>
where
    F: Fn(&Record<'_>) -> Result<bool, DataError>,
{
    fn process(&self, input: &DataFrame) -> Result<DataFrame, ProcessingError> {
        check_input(&self.schema, input)?;

        let mut matches = Vec::new();
        for row in 0..input.size() {
            if (self.predicate)(&self.layout.record(input.columns(), row))? {
                matches.push(row);
            }
        }

        debug!("query: kept {} of {} rows", matches.len(), input.size());
        Ok(input.take_rows(&matches))
    }

    fn name(&self) -> &str {
        "query"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Filter
    }

    fn input_schema(&self) -> &Schema {
        &self.schema
    }

    fn output_schema(&self) -> &Schema {
        &self.schema
    }
}
