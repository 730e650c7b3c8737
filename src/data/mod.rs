// Data module: values, schemas and the columnar dataframe
// Author: Gabriel Demetrios Lafis

mod column;
mod csv;
pub mod names;
mod print;
mod record;
mod schema;

pub use self::column::*;
pub use self::csv::*;
pub use self::print::*;
pub use self::record::*;
pub use self::schema::*;

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents a generic data source that fills a dataframe of a known schema
pub trait DataSource {
    /// Load the source into a new dataframe of the given schema
    fn load(&self, schema: &Schema) -> Result<DataFrame, DataError>;

    /// Get the source name
    fn name(&self) -> &str;
}

/// Represents a generic data sink
pub trait DataSink {
    /// Write a dataframe to the sink
    fn write(&self, frame: &DataFrame) -> Result<(), DataError>;

    /// Get the sink name
    fn name(&self) -> &str;
}

/// A table of named, typed, equal-length columns.
///
/// The schema is fixed for the lifetime of the value. Only [`insert`],
/// [`insert_ranges`] and [`append`] mutate an existing frame, and all of them
/// keep every column at the same length.
///
/// [`insert`]: DataFrame::insert
/// [`insert_ranges`]: DataFrame::insert_ranges
/// [`append`]: DataFrame::append
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    schema: Schema,
    columns: Vec<Column>,
}

impl DataFrame {
    /// Create a new empty dataframe
    pub fn new(schema: Schema) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|field| Column::new(field.data_type))
            .collect();

        DataFrame { schema, columns }
    }

    /// Create a dataframe from already materialized columns
    pub fn from_columns(schema: Schema, columns: Vec<Column>) -> Result<Self, DataError> {
        if columns.len() != schema.len() {
            return Err(DataError::ArityMismatch {
                expected: schema.len(),
                found: columns.len(),
            });
        }

        for (field, column) in schema.fields().iter().zip(&columns) {
            if field.data_type != column.data_type() {
                return Err(DataError::TypeMismatch {
                    column: field.name.clone(),
                    expected: field.data_type,
                    found: column.data_type(),
                });
            }
        }

        if let Some(first) = columns.first() {
            if let Some((field, column)) = schema
                .fields()
                .iter()
                .zip(&columns)
                .find(|(_, column)| column.len() != first.len())
            {
                return Err(DataError::Schema(format!(
                    "Column '{}' has {} rows, expected {}",
                    field.name,
                    column.len(),
                    first.len()
                )));
            }
        }

        Ok(DataFrame { schema, columns })
    }

    /// Get the schema of the dataframe
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the column names in schema order
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.names()
    }

    /// Get the number of rows (the length of the first column, 0 without columns)
    pub fn size(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Alias for [`DataFrame::size`]
    pub fn len(&self) -> usize {
        self.size()
    }

    /// Check if the dataframe has no rows
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Get the number of rows that fit without growing the columns
    pub fn capacity(&self) -> usize {
        self.columns.first().map_or(0, Column::capacity)
    }

    /// Get read-only access to a column by name
    pub fn column(&self, name: &str) -> Result<&Column, DataError> {
        let index = self.schema.require_index(name)?;
        Ok(&self.columns[index])
    }

    /// Get read-only access to a column by position
    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Get all columns in schema order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get a single cell value
    pub fn value(&self, row: usize, name: &str) -> Result<Value, DataError> {
        let column = self.column(name)?;
        column.get(row).ok_or(DataError::RowOutOfBounds {
            index: row,
            len: column.len(),
        })
    }

    /// Get a copy of the values of one row
    pub fn row(&self, index: usize) -> Option<Row> {
        if index >= self.size() {
            return None;
        }

        let values = self
            .columns
            .iter()
            .filter_map(|column| column.get(index))
            .collect();

        Some(Row::new(values))
    }

    /// Iterate over copies of all rows in order
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.size()).filter_map(move |index| self.row(index))
    }

    /// Append one value to each column, in schema order.
    ///
    /// Every value is checked (and widened if needed) before any column is
    /// touched, so a rejected row leaves the frame unchanged.
    pub fn insert(&mut self, values: Vec<Value>) -> Result<(), DataError> {
        if values.len() != self.schema.len() {
            return Err(DataError::ArityMismatch {
                expected: self.schema.len(),
                found: values.len(),
            });
        }

        let mut coerced = Vec::with_capacity(values.len());
        for (field, value) in self.schema.fields().iter().zip(values) {
            let found = value.data_type();
            match field.data_type.coerce(value) {
                Some(value) => coerced.push(value),
                None => {
                    return Err(DataError::TypeMismatch {
                        column: field.name.clone(),
                        expected: field.data_type,
                        found,
                    })
                }
            }
        }

        self.reserve(1);
        for (column, value) in self.columns.iter_mut().zip(coerced) {
            column.push(value)?;
        }

        Ok(())
    }

    /// Append a row to the dataframe
    pub fn insert_row(&mut self, row: Row) -> Result<(), DataError> {
        self.insert(row.values)
    }

    /// Bulk insert one range per column.
    ///
    /// Exactly `min(len(range_i))` rows are appended; longer ranges are
    /// truncated to the shortest one. Returns the number of rows inserted.
    pub fn insert_ranges(&mut self, ranges: Vec<Column>) -> Result<usize, DataError> {
        if ranges.len() != self.schema.len() {
            return Err(DataError::ArityMismatch {
                expected: self.schema.len(),
                found: ranges.len(),
            });
        }

        let refs: Vec<&Column> = ranges.iter().collect();
        self.extend_from_columns(&refs)
    }

    /// Append all rows of another dataframe with an identical schema
    pub fn append(&mut self, other: &DataFrame) -> Result<usize, DataError> {
        if self.schema != other.schema {
            return Err(DataError::SchemaMismatch);
        }

        let refs: Vec<&Column> = other.columns.iter().collect();
        self.extend_from_columns(&refs)
    }

    fn extend_from_columns(&mut self, sources: &[&Column]) -> Result<usize, DataError> {
        for (field, source) in self.schema.fields().iter().zip(sources) {
            if !field.data_type.accepts(source.data_type()) {
                return Err(DataError::TypeMismatch {
                    column: field.name.clone(),
                    expected: field.data_type,
                    found: source.data_type(),
                });
            }
        }

        let count = sources.iter().map(|c| c.len()).min().unwrap_or(0);
        self.reserve(count);
        for (column, source) in self.columns.iter_mut().zip(sources) {
            column.extend_from(source, 0..count)?;
        }

        Ok(count)
    }

    /// Reserve room for `additional` rows in every column at once.
    ///
    /// New capacity is `max(len + additional, 1.5 * capacity)`.
    pub fn reserve(&mut self, additional: usize) {
        let len = self.size();
        let capacity = self.capacity();
        let needed = len + additional;

        if needed <= capacity {
            return;
        }

        let target = needed.max(capacity + capacity / 2);
        trace!("growing columns from {} to {} rows", capacity, target);
        for column in &mut self.columns {
            column.reserve_exact(target - column.len());
        }
    }

    /// Materialize a new dataframe from the given row positions, in order
    pub(crate) fn take_rows(&self, indices: &[usize]) -> DataFrame {
        DataFrame {
            schema: self.schema.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
        }
    }

    /// Copy a contiguous row range into a new dataframe
    pub fn slice(&self, range: Range<usize>) -> DataFrame {
        let end = range.end.min(self.size());
        let start = range.start.min(end);
        let indices: Vec<usize> = (start..end).collect();
        self.take_rows(&indices)
    }
}

/// Represents a row in a dataframe
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    /// Create a new row with the given values
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    /// Get a reference to a value by index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Represents a single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Get the data type of the value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::String(_) => DataType::String,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

/// Build a `Vec<Value>` from heterogeneous literals
#[macro_export]
macro_rules! values {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::data::Value::from($value)),*]
    };
}

/// Represents the element type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Integer,
    Float,
    String,
}

impl DataType {
    /// Get the lowercase name of the type
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::String => "string",
        }
    }

    /// Check if the type supports arithmetic aggregation
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }

    /// Check if values of `other` can be stored in a column of this type
    pub fn accepts(&self, other: DataType) -> bool {
        *self == other || (*self == DataType::Float && other == DataType::Integer)
    }

    /// Convert a value into this type, widening integers to floats
    pub fn coerce(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (DataType::Float, Value::Integer(i)) => Some(Value::Float(i as f64)),
            (data_type, value) if value.data_type() == *data_type => Some(value),
            _ => None,
        }
    }

    /// Parse the textual form of a value of this type
    pub fn parse_value(&self, text: &str) -> Option<Value> {
        match self {
            DataType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Value::Boolean(true)),
                "false" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },
            DataType::Integer => text.trim().parse().ok().map(Value::Integer),
            DataType::Float => text.trim().parse().ok().map(Value::Float),
            DataType::String => Some(Value::String(text.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(DataType::Boolean),
            "int" | "integer" | "i64" => Ok(DataType::Integer),
            "float" | "double" | "f64" => Ok(DataType::Float),
            "str" | "string" => Ok(DataType::String),
            other => Err(DataError::Schema(format!("Unknown data type '{}'", other))),
        }
    }
}

/// Represents an error in the data module
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Schema mismatch")]
    SchemaMismatch,

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Column '{column}' has type {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: DataType,
    },

    #[error("Cannot store a {found} value in a {expected} column")]
    ValueType { expected: DataType, found: DataType },

    #[error("Expected {expected} values, got {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("Row {index} out of bounds for {len} rows")]
    RowOutOfBounds { index: usize, len: usize },

    #[error("Cannot convert '{value}' to {data_type} (line {line}, column '{column}')")]
    Conversion {
        line: u64,
        column: String,
        value: String,
        data_type: DataType,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(char),

    /// Returned by user callbacks that fail for their own reasons
    #[error("Callback error: {0}")]
    Callback(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        SchemaBuilder::new()
            .add_integer("a")
            .add_float("b")
            .add_string("c")
            .build()
            .unwrap()
    }

    #[test]
    fn test_size_of_empty_schema_is_zero() {
        let frame = DataFrame::new(Schema::empty());
        assert_eq!(frame.size(), 0);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_insert_keeps_columns_aligned() {
        let mut frame = DataFrame::new(schema());
        frame.insert(values![1, 2.5, "x"]).unwrap();
        frame.insert(values![2, 3, "y"]).unwrap();

        assert_eq!(frame.size(), 2);
        for column in frame.columns() {
            assert_eq!(column.len(), 2);
        }
        assert_eq!(frame.value(1, "b").unwrap(), Value::Float(3.0));
    }

    #[test]
    fn test_rejected_insert_leaves_frame_untouched() {
        let mut frame = DataFrame::new(schema());
        frame.insert(values![1, 2.5, "x"]).unwrap();

        let err = frame.insert(values![2, 3.5, true]).unwrap_err();
        assert!(matches!(err, DataError::TypeMismatch { .. }));
        assert!(frame.insert(values![2, 3.5]).is_err());

        assert_eq!(frame.size(), 1);
        for column in frame.columns() {
            assert_eq!(column.len(), 1);
        }
    }

    #[test]
    fn test_growth_policy() {
        let mut frame = DataFrame::new(schema());
        frame.insert(values![1, 1.0, "a"]).unwrap();
        assert_eq!(frame.capacity(), 1);

        frame.insert(values![2, 2.0, "b"]).unwrap();
        assert_eq!(frame.capacity(), 2);

        frame.insert(values![3, 3.0, "c"]).unwrap();
        assert_eq!(frame.capacity(), 3);

        frame.insert(values![4, 4.0, "d"]).unwrap();
        assert_eq!(frame.capacity(), 4);

        frame.insert(values![5, 5.0, "e"]).unwrap();
        assert_eq!(frame.capacity(), 6);

        for column in frame.columns() {
            assert_eq!(column.capacity(), 6);
        }
    }

    #[test]
    fn test_insert_ranges_truncates_to_shortest() {
        let mut frame = DataFrame::new(schema());
        let inserted = frame
            .insert_ranges(vec![
                Column::Integer(vec![1, 2, 3]),
                Column::Float(vec![2.0, 3.0]),
                Column::String(vec!["a".into(), "b".into(), "c".into(), "d".into()]),
            ])
            .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(frame.column("a").unwrap(), &Column::Integer(vec![1, 2]));
        assert_eq!(frame.column("b").unwrap(), &Column::Float(vec![2.0, 3.0]));
        assert_eq!(
            frame.column("c").unwrap(),
            &Column::String(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_insert_ranges_rejects_wrong_type() {
        let mut frame = DataFrame::new(schema());
        let err = frame
            .insert_ranges(vec![
                Column::Float(vec![1.0]),
                Column::Float(vec![2.0]),
                Column::String(vec!["a".into()]),
            ])
            .unwrap_err();

        assert!(matches!(err, DataError::TypeMismatch { .. }));
        assert!(frame.is_empty());
    }

    #[test]
    fn test_append_requires_identical_schema() {
        let mut frame = DataFrame::new(schema());
        frame.insert(values![1, 1.0, "a"]).unwrap();

        let mut other = DataFrame::new(schema());
        other.insert(values![2, 2.0, "b"]).unwrap();
        other.insert(values![3, 3.0, "c"]).unwrap();

        assert_eq!(frame.append(&other).unwrap(), 2);
        assert_eq!(frame.size(), 3);
        assert_eq!(frame.value(2, "c").unwrap(), Value::from("c"));

        let different = DataFrame::new(SchemaBuilder::new().add_integer("a").build().unwrap());
        assert!(matches!(
            frame.append(&different),
            Err(DataError::SchemaMismatch)
        ));
    }

    #[test]
    fn test_unknown_column() {
        let frame = DataFrame::new(schema());
        assert!(matches!(
            frame.column("missing"),
            Err(DataError::ColumnNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_from_columns_checks_lengths() {
        let result = DataFrame::from_columns(
            schema(),
            vec![
                Column::Integer(vec![1, 2]),
                Column::Float(vec![1.0]),
                Column::String(vec!["a".into(), "b".into()]),
            ],
        );
        assert!(matches!(result, Err(DataError::Schema(_))));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(DataType::Boolean.parse_value("TRUE"), Some(Value::Boolean(true)));
        assert_eq!(DataType::Integer.parse_value(" 42"), Some(Value::Integer(42)));
        assert_eq!(DataType::Float.parse_value("1.5"), Some(Value::Float(1.5)));
        assert_eq!(DataType::Integer.parse_value("1.5"), None);
        assert_eq!("double".parse::<DataType>().unwrap(), DataType::Float);
    }
}
