// Transform operations for data processing
// Author: Gabriel Demetrios Lafis

use std::marker::PhantomData;

use log::debug;

use crate::data::names::{require_non_empty, require_valid_identifier};
use crate::data::{ColumnType, DataError, DataFrame, Field, Record, RecordLayout, Schema};
use super::{check_input, DataProcessor, ProcessingError, ProcessorType};

/// Select specific columns from a dataframe, in the given order
pub struct SelectTransform {
    input_schema: Schema,
    output_schema: Schema,
    indices: Vec<usize>,
}

impl SelectTransform {
    /// Create a new select transform with the given column names
    pub fn new(schema: &Schema, names: &[&str]) -> Result<Self, ProcessingError> {
        require_non_empty(names, "selection")?;
        let indices = schema.resolve(names, "selection")?;
        let output_schema = schema.project(names)?;
        debug!("select: output columns {:?}", output_schema.names());

        Ok(SelectTransform {
            input_schema: schema.clone(),
            output_schema,
            indices,
        })
    }
}

impl DataProcessor for SelectTransform {
    fn process(&self, input: &DataFrame) -> Result<DataFrame, ProcessingError> {
        check_input(&self.input_schema, input)?;

        let columns = self
            .indices
            .iter()
            .map(|&i| input.columns()[i].clone())
            .collect();

        Ok(DataFrame::from_columns(self.output_schema.clone(), columns)?)
    }

    fn name(&self) -> &str {
        "select"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Transform
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }
}

/// Append a column computed per row by a user function.
///
/// The function sees a [`Record`] of the selected columns (all columns when no
/// selection is given). The output holds the selected columns followed by the
/// new column, whose type is the function's return type.
pub struct ApplyTransform<T, F> {
    column: String,
    layout: RecordLayout,
    function: F,
    input_schema: Schema,
    output_schema: Schema,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> ApplyTransform<T, F>
where
    T: ColumnType,
    F: Fn(&Record<'_>) -> Result<T, DataError>,
{
    /// Create a new apply transform producing column `name`
    pub fn new(
        schema: &Schema,
        name: &str,
        selection: Option<&[&str]>,
        function: F,
    ) -> Result<Self, ProcessingError> {
        require_valid_identifier(name)?;
        if let Some(names) = selection {
            require_non_empty(names, "selection")?;
        }

        let layout = RecordLayout::new(schema, selection)?;
        let mut fields: Vec<Field> = layout
            .column_indices()
            .iter()
            .map(|&i| schema.fields()[i].clone())
            .collect();
        fields.push(Field::new(name, T::DATA_TYPE));
        let output_schema = Schema::new(fields)?;
        debug!("apply: output columns {:?}", output_schema.names());

        Ok(ApplyTransform {
            column: name.to_string(),
            layout,
            function,
            input_schema: schema.clone(),
            output_schema,
            _marker: PhantomData,
        })
    }

    /// Get the name of the derived column
    pub fn column(&self) -> &str {
        &self.column
    }
}

impl<T, F> DataProcessor for ApplyTransform<T, F>
where
    T: ColumnType,
    F: Fn(&Record<'_>) -> Result<T, DataError>,
{
    fn process(&self, input: &DataFrame) -> Result<DataFrame, ProcessingError> {
        check_input(&self.input_schema, input)?;

        let mut derived = Vec::with_capacity(input.size());
        for row in 0..input.size() {
            let record = self.layout.record(input.columns(), row);
            derived.push((self.function)(&record)?);
        }

        let mut columns: Vec<_> = self
            .layout
            .column_indices()
            .iter()
            .map(|&i| input.columns()[i].clone())
            .collect();
        columns.push(T::into_column(derived));

        Ok(DataFrame::from_columns(self.output_schema.clone(), columns)?)
    }

    fn name(&self) -> &str {
        "apply"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Transform
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataType, SchemaBuilder};
    use crate::values;

    fn people() -> DataFrame {
        let schema = SchemaBuilder::new()
            .add_string("name")
            .add_integer("age")
            .add_float("size_in_m")
            .add_float("weight_in_kg")
            .build()
            .unwrap();
        let mut frame = DataFrame::new(schema);
        frame.insert(values!["NameA", 30, 1.75, 75.2]).unwrap();
        frame.insert(values!["NameB", 62, 1.60, 63.0]).unwrap();
        frame
    }

    #[test]
    fn test_select_uses_given_order() {
        let frame = people();
        let selected = frame.select(&["age", "name"]).unwrap();

        assert_eq!(selected.column_names(), vec!["age", "name"]);
        assert_eq!(selected.size(), 2);
        assert_eq!(selected.column("age").unwrap(), frame.column("age").unwrap());
    }

    #[test]
    fn test_select_processor_copies_whole_columns() {
        let mut frame = people();
        frame.append(&people()).unwrap();
        frame.insert(values!["NameC", 20, 1.82, 80.1]).unwrap();

        let select = SelectTransform::new(frame.schema(), &["weight_in_kg", "name"]).unwrap();
        let selected = select.process(&frame).unwrap();

        assert_eq!(selected.schema(), select.output_schema());
        assert_eq!(selected.size(), 5);
        assert_eq!(selected.columns()[0], *frame.column("weight_in_kg").unwrap());
        assert_eq!(selected.columns()[1], *frame.column("name").unwrap());
        assert!(select.process(&selected).is_err());
    }

    #[test]
    fn test_select_validation() {
        let schema = people().schema().clone();
        assert!(SelectTransform::new(&schema, &[]).is_err());
        assert!(SelectTransform::new(&schema, &["age", "age"]).is_err());
        assert!(matches!(
            SelectTransform::new(&schema, &["height"]),
            Err(ProcessingError::Data(DataError::ColumnNotFound(_)))
        ));
    }

    #[test]
    fn test_apply_appends_typed_column() {
        let frame = people();
        let result = frame
            .apply("bmi", |r| {
                let size = r.float("size_in_m")?;
                Ok(r.float("weight_in_kg")? / (size * size))
            })
            .unwrap();

        assert_eq!(result.size(), frame.size());
        assert_eq!(result.column_names().last(), Some(&"bmi"));
        assert_eq!(result.schema().field("bmi").unwrap().data_type, DataType::Float);

        let bmi = result.column("bmi").unwrap().as_floats().unwrap();
        assert!((bmi[0] - 24.555).abs() < 1e-3);
    }

    #[test]
    fn test_apply_with_selection() {
        let frame = people();
        let result = frame
            .apply_with("senior", &["age"], |r| Ok(r.integer("age")? >= 60))
            .unwrap();

        assert_eq!(result.column_names(), vec!["age", "senior"]);
        assert_eq!(
            result.column("senior").unwrap().as_booleans(),
            Some(&[false, true][..])
        );
    }

    #[test]
    fn test_apply_hides_unselected_columns() {
        let frame = people();
        let result = frame.apply_with("label", &["age"], |r| Ok(r.string("name")?.to_string()));
        assert!(matches!(
            result,
            Err(ProcessingError::Data(DataError::ColumnNotFound(_)))
        ));
    }

    #[test]
    fn test_apply_name_must_be_new() {
        let frame = people();
        assert!(frame.apply("age", |r| r.integer("age")).is_err());
        assert!(frame.apply("", |r| r.integer("age")).is_err());
        // Dropped by the selection, so the name is free again
        assert!(frame.apply_with("age", &["name"], |_| Ok(1i64)).is_ok());
    }
}
