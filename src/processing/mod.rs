// Processing module: relational operators over dataframes
// Author: Gabriel Demetrios Lafis

mod aggregate;
mod filter;
mod join;
mod sort;
mod transform;

pub use aggregate::*;
pub use filter::*;
pub use join::*;
pub use sort::*;
pub use transform::*;

use log::debug;
use thiserror::Error;

use crate::data::{ColumnType, DataError, DataFrame, Record, Schema};

/// A single-input operator, validated against its input schema when defined
pub trait DataProcessor {
    /// Process a dataframe and return a new dataframe
    fn process(&self, input: &DataFrame) -> Result<DataFrame, ProcessingError>;

    /// Get the processor name
    fn name(&self) -> &str;

    /// Get the processor type
    fn processor_type(&self) -> ProcessorType;

    /// Get the schema the processor was defined against
    fn input_schema(&self) -> &Schema;

    /// Get the schema of the frames the processor produces
    fn output_schema(&self) -> &Schema;
}

/// Represents a processor type
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorType {
    Transform,
    Filter,
    Aggregate,
    Join,
    Sort,
    Custom(String),
}

/// Represents an error in the processing module
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Fail unless `input` has exactly the schema a processor was defined against
pub(crate) fn check_input(expected: &Schema, input: &DataFrame) -> Result<(), ProcessingError> {
    if input.schema() != expected {
        return Err(DataError::SchemaMismatch.into());
    }
    Ok(())
}

/// Pipeline for chaining multiple processors.
///
/// Each added processor must accept the output schema of the previous one,
/// so a malformed chain is rejected before any row is processed.
pub struct Pipeline {
    name: String,
    input_schema: Schema,
    output_schema: Schema,
    processors: Vec<Box<dyn DataProcessor>>,
}

impl Pipeline {
    /// Create a new pipeline with the given name and input schema
    pub fn new(name: &str, input_schema: &Schema) -> Self {
        Pipeline {
            name: name.to_string(),
            input_schema: input_schema.clone(),
            output_schema: input_schema.clone(),
            processors: Vec::new(),
        }
    }

    /// Add a processor to the pipeline
    pub fn add<P: DataProcessor + 'static>(mut self, processor: P) -> Result<Self, ProcessingError> {
        if processor.input_schema() != &self.output_schema {
            return Err(ProcessingError::InvalidOperation(format!(
                "Processor '{}' does not accept the output of '{}'",
                processor.name(),
                self.processors
                    .last()
                    .map_or(self.name.as_str(), |p| p.name())
            )));
        }

        self.output_schema = processor.output_schema().clone();
        self.processors.push(Box::new(processor));
        Ok(self)
    }

    /// Get the number of processors
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Check if the pipeline has no processors
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Execute the pipeline on a dataframe
    pub fn execute(&self, input: &DataFrame) -> Result<DataFrame, ProcessingError> {
        check_input(&self.input_schema, input)?;

        let mut current = input.clone();
        for processor in &self.processors {
            current = processor.process(&current)?;
            debug!("{}: {} rows after {}", self.name, current.size(), processor.name());
        }

        Ok(current)
    }
}

impl DataProcessor for Pipeline {
    fn process(&self, input: &DataFrame) -> Result<DataFrame, ProcessingError> {
        self.execute(input)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Custom("Pipeline".to_string())
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }
}

/// One-call forms of the operators: define against this frame's schema, then run
impl DataFrame {
    /// Project onto `names`, in that order
    pub fn select(&self, names: &[&str]) -> Result<DataFrame, ProcessingError> {
        SelectTransform::new(self.schema(), names)?.process(self)
    }

    /// Append a column computed from every column of each row
    pub fn apply<T, F>(&self, name: &str, function: F) -> Result<DataFrame, ProcessingError>
    where
        T: ColumnType,
        F: Fn(&Record<'_>) -> Result<T, DataError>,
    {
        ApplyTransform::new(self.schema(), name, None, function)?.process(self)
    }

    /// Keep `selection` and append a column computed from it
    pub fn apply_with<T, F>(
        &self,
        name: &str,
        selection: &[&str],
        function: F,
    ) -> Result<DataFrame, ProcessingError>
    where
        T: ColumnType,
        F: Fn(&Record<'_>) -> Result<T, DataError>,
    {
        ApplyTransform::new(self.schema(), name, Some(selection), function)?.process(self)
    }

    /// Keep the rows for which `predicate` holds
    pub fn query<F>(&self, predicate: F) -> Result<DataFrame, ProcessingError>
    where
        F: Fn(&Record<'_>) -> Result<bool, DataError>,
    {
        QueryFilter::new(self.schema(), None, predicate)?.process(self)
    }

    /// Keep the rows for which `predicate`, seeing only `selection`, holds
    pub fn query_with<F>(&self, selection: &[&str], predicate: F) -> Result<DataFrame, ProcessingError>
    where
        F: Fn(&Record<'_>) -> Result<bool, DataError>,
    {
        QueryFilter::new(self.schema(), Some(selection), predicate)?.process(self)
    }

    /// Equi-join with `other` on `keys`
    pub fn join(
        &self,
        other: &DataFrame,
        join_type: JoinType,
        keys: &[&str],
    ) -> Result<DataFrame, ProcessingError> {
        self.join_with_strategy(other, join_type, keys, JoinStrategy::default())
    }

    /// Equi-join with `other` on `keys` using an explicit matching strategy
    pub fn join_with_strategy(
        &self,
        other: &DataFrame,
        join_type: JoinType,
        keys: &[&str],
        strategy: JoinStrategy,
    ) -> Result<DataFrame, ProcessingError> {
        JoinProcessor::new(join_type, self.schema(), other.schema(), keys)?
            .with_strategy(strategy)
            .join(self, other)
    }

    /// Aggregate per distinct `group_by` key (one group when empty)
    pub fn summarize(
        &self,
        group_by: &[&str],
        aggregations: &[Aggregation],
    ) -> Result<DataFrame, ProcessingError> {
        SummarizeProcessor::new(self.schema(), group_by, aggregations)?.process(self)
    }

    /// Sort rows lexicographically by `keys`
    pub fn sort_by(&self, order: SortOrder, keys: &[&str]) -> Result<DataFrame, ProcessingError> {
        SortProcessor::new(self.schema(), order, keys)?.process(self)
    }
}
