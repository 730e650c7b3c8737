// Multi-key sort for dataframes
// Author: Gabriel Demetrios Lafis

use std::cmp::Ordering;
use std::str::FromStr;

use log::debug;

use crate::data::names::require_non_empty;
use crate::data::{DataFrame, Schema};
use super::{check_input, DataProcessor, ProcessingError, ProcessorType};

/// Sort direction, applied to every key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(ProcessingError::InvalidArgument(format!(
                "Unknown sort order '{}'",
                other
            ))),
        }
    }
}

/// Sort rows lexicographically by a list of key columns
pub struct SortProcessor {
    order: SortOrder,
    keys: Vec<usize>,
    schema: Schema,
}

impl SortProcessor {
    /// Create a new sort processor; earlier keys take precedence
    pub fn new(schema: &Schema, order: SortOrder, keys: &[&str]) -> Result<Self, ProcessingError> {
        require_non_empty(keys, "sort keys")?;
        let keys = schema.resolve(keys, "sort keys")?;
        debug!("sort: {:?} on columns {:?}", order, keys);

        Ok(SortProcessor {
            order,
            keys,
            schema: schema.clone(),
        })
    }

    fn compare(&self, input: &DataFrame, lhs: usize, rhs: usize) -> Ordering {
        let ordering = self
            .keys
            .iter()
            .map(|&k| input.columns()[k].compare_rows(lhs, rhs))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal);

        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

impl DataProcessor for SortProcessor {
    fn process(&self, input: &DataFrame) -> Result<DataFrame, ProcessingError> {
        check_input(&self.schema, input)?;

        let mut indices: Vec<usize> = (0..input.size()).collect();
        indices.sort_unstable_by(|&a, &b| self.compare(input, a, b));

        Ok(input.take_rows(&indices))
    }

    fn name(&self) -> &str {
        "sort"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Sort
    }

    fn input_schema(&self) -> &Schema {
        &self.schema
    }

    fn output_schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SchemaBuilder, Value};
    use crate::values;

    fn frame() -> DataFrame {
        let schema = SchemaBuilder::new()
            .add_integer("a")
            .add_string("b")
            .build()
            .unwrap();
        let mut frame = DataFrame::new(schema);
        frame.insert(values![10, "x"]).unwrap();
        frame.insert(values![5, "y"]).unwrap();
        frame.insert(values![20, "z"]).unwrap();
        frame.insert(values![10, "a"]).unwrap();
        frame
    }

    #[test]
    fn test_sort_single_key() {
        let sorted = frame().sort_by(SortOrder::Ascending, &["a"]).unwrap();
        assert_eq!(sorted.column("a").unwrap().as_integers(), Some(&[5, 10, 10, 20][..]));
    }

    #[test]
    fn test_sort_breaks_ties_with_second_key() {
        let sorted = frame().sort_by(SortOrder::Ascending, &["a", "b"]).unwrap();
        let b: Vec<&str> = sorted
            .column("b")
            .unwrap()
            .as_strings()
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(b, vec!["y", "a", "x", "z"]);
    }

    #[test]
    fn test_sort_descending() {
        let sorted = frame().sort_by(SortOrder::Descending, &["a", "b"]).unwrap();
        assert_eq!(sorted.column("a").unwrap().as_integers(), Some(&[20, 10, 10, 5][..]));
        assert_eq!(sorted.value(1, "b").unwrap(), Value::from("x"));
    }

    #[test]
    fn test_sort_validation() {
        let schema = frame().schema().clone();
        assert!(SortProcessor::new(&schema, SortOrder::Ascending, &[]).is_err());
        assert!(SortProcessor::new(&schema, SortOrder::Ascending, &["c"]).is_err());
        assert!(SortProcessor::new(&schema, SortOrder::Ascending, &["a", "a"]).is_err());
    }

    #[test]
    fn test_parse_order() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Descending);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
