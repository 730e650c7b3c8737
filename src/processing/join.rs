// Join operations for data processing
// Author: Gabriel Demetrios Lafis

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::Hasher;

use log::debug;

use crate::data::names::require_non_empty;
use crate::data::{Column, DataError, DataFrame, Field, Schema};
use super::{check_input, DataProcessor, ProcessingError, ProcessorType};

/// Join type for joining dataframes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
}

/// How matching row pairs are found.
///
/// Both strategies emit the same rows in the same order: left rows in order,
/// and for each of them the matching right rows in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStrategy {
    /// Compare every left row with every right row
    #[default]
    NestedLoop,
    /// Index the right key tuples in a hash table and probe it per left row
    Hash,
}

/// Equi-join processor for two dataframes
#[derive(Debug, Clone)]
pub struct JoinProcessor {
    join_type: JoinType,
    strategy: JoinStrategy,
    left_schema: Schema,
    right_schema: Schema,
    output_schema: Schema,
    left_keys: Vec<usize>,
    right_keys: Vec<usize>,
    right_values: Vec<usize>,
}

impl JoinProcessor {
    /// Create a new join processor on the key columns `keys`.
    ///
    /// The keys must exist with the same type on both sides. The output holds
    /// every left column followed by the non-key right columns, and these
    /// names must not collide.
    pub fn new(
        join_type: JoinType,
        left: &Schema,
        right: &Schema,
        keys: &[&str],
    ) -> Result<Self, ProcessingError> {
        require_non_empty(keys, "join keys")?;
        let left_keys = left.resolve(keys, "join keys")?;
        let right_keys = right.resolve(keys, "join keys")?;

        for ((name, &l), &r) in keys.iter().zip(&left_keys).zip(&right_keys) {
            let expected = left.fields()[l].data_type;
            let found = right.fields()[r].data_type;
            if expected != found {
                return Err(DataError::TypeMismatch {
                    column: name.to_string(),
                    expected,
                    found,
                }
                .into());
            }
        }

        let right_values: Vec<usize> = (0..right.len())
            .filter(|i| !right_keys.contains(i))
            .collect();

        let mut fields: Vec<Field> = left.fields().to_vec();
        fields.extend(right_values.iter().map(|&i| right.fields()[i].clone()));
        let output_schema = Schema::new(fields)?;
        debug!("join: output columns {:?}", output_schema.names());

        Ok(JoinProcessor {
            join_type,
            strategy: JoinStrategy::default(),
            left_schema: left.clone(),
            right_schema: right.clone(),
            output_schema,
            left_keys,
            right_keys,
            right_values,
        })
    }

    /// Create a new inner join processor
    pub fn inner(left: &Schema, right: &Schema, keys: &[&str]) -> Result<Self, ProcessingError> {
        Self::new(JoinType::Inner, left, right, keys)
    }

    /// Use the given matching strategy
    pub fn with_strategy(mut self, strategy: JoinStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Get the join type
    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// Get the matching strategy
    pub fn strategy(&self) -> JoinStrategy {
        self.strategy
    }

    /// Get the schema of the joined frame
    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    /// Fix the right-hand frame, turning the join into a single-input processor
    pub fn with_right(self, right: DataFrame) -> Result<JoinWith, ProcessingError> {
        check_input(&self.right_schema, &right)?;
        Ok(JoinWith {
            processor: self,
            right,
        })
    }

    /// Join two dataframes
    pub fn join(&self, left: &DataFrame, right: &DataFrame) -> Result<DataFrame, ProcessingError> {
        check_input(&self.left_schema, left)?;
        check_input(&self.right_schema, right)?;

        let (left_rows, right_rows) = match self.strategy {
            JoinStrategy::NestedLoop => self.nested_loop_matches(left, right),
            JoinStrategy::Hash => self.hash_matches(left, right),
        };
        debug!(
            "join: {} x {} rows gave {} matches",
            left.size(),
            right.size(),
            left_rows.len()
        );

        let mut columns: Vec<Column> = left.columns().iter().map(|c| c.take(&left_rows)).collect();
        columns.extend(
            self.right_values
                .iter()
                .map(|&i| right.columns()[i].take(&right_rows)),
        );

        Ok(DataFrame::from_columns(self.output_schema.clone(), columns)?)
    }

    fn keys_match(&self, left: &DataFrame, i: usize, right: &DataFrame, j: usize) -> bool {
        self.left_keys
            .iter()
            .zip(&self.right_keys)
            .all(|(&l, &r)| left.columns()[l].rows_equal(i, &right.columns()[r], j))
    }

    fn nested_loop_matches(&self, left: &DataFrame, right: &DataFrame) -> (Vec<usize>, Vec<usize>) {
        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();

        for i in 0..left.size() {
            for j in 0..right.size() {
                if self.keys_match(left, i, right, j) {
                    left_rows.push(i);
                    right_rows.push(j);
                }
            }
        }

        (left_rows, right_rows)
    }

    fn hash_matches(&self, left: &DataFrame, right: &DataFrame) -> (Vec<usize>, Vec<usize>) {
        // Buckets list right rows in ascending order
        let mut index: HashMap<u64, Vec<usize>> = HashMap::new();
        for j in 0..right.size() {
            let hash = key_hash(right.columns(), &self.right_keys, j);
            index.entry(hash).or_default().push(j);
        }

        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();

        for i in 0..left.size() {
            let hash = key_hash(left.columns(), &self.left_keys, i);
            if let Some(candidates) = index.get(&hash) {
                for &j in candidates {
                    if self.keys_match(left, i, right, j) {
                        left_rows.push(i);
                        right_rows.push(j);
                    }
                }
            }
        }

        (left_rows, right_rows)
    }
}

fn key_hash(columns: &[Column], keys: &[usize], row: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    for &k in keys {
        columns[k].hash_row(row, &mut hasher);
    }
    hasher.finish()
}

/// A join whose right-hand frame is fixed, usable inside a pipeline
pub struct JoinWith {
    processor: JoinProcessor,
    right: DataFrame,
}

impl DataProcessor for JoinWith {
    fn process(&self, input: &DataFrame) -> Result<DataFrame, ProcessingError> {
        self.processor.join(input, &self.right)
    }

    fn name(&self) -> &str {
        match self.processor.join_type {
            JoinType::Inner => "inner_join",
        }
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Join
    }

    fn input_schema(&self) -> &Schema {
        &self.processor.left_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.processor.output_schema
    }
}
