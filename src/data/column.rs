// Typed column storage
// Author: Gabriel Demetrios Lafis

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use super::{DataError, DataType, Value};

/// One growable sequence of values, all of the same type
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Boolean(Vec<bool>),
    Integer(Vec<i64>),
    Float(Vec<f64>),
    String(Vec<String>),
}

impl Column {
    /// Create a new empty column of the given type
    pub fn new(data_type: DataType) -> Self {
        Self::with_capacity(data_type, 0)
    }

    /// Create a new empty column with room for `capacity` values
    pub fn with_capacity(data_type: DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Boolean => Column::Boolean(Vec::with_capacity(capacity)),
            DataType::Integer => Column::Integer(Vec::with_capacity(capacity)),
            DataType::Float => Column::Float(Vec::with_capacity(capacity)),
            DataType::String => Column::String(Vec::with_capacity(capacity)),
        }
    }

    /// Get the element type of the column
    pub fn data_type(&self) -> DataType {
        match self {
            Column::Boolean(_) => DataType::Boolean,
            Column::Integer(_) => DataType::Integer,
            Column::Float(_) => DataType::Float,
            Column::String(_) => DataType::String,
        }
    }

    /// Get the number of values in the column
    pub fn len(&self) -> usize {
        match self {
            Column::Boolean(v) => v.len(),
            Column::Integer(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::String(v) => v.len(),
        }
    }

    /// Check if the column is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the allocated capacity of the column
    pub fn capacity(&self) -> usize {
        match self {
            Column::Boolean(v) => v.capacity(),
            Column::Integer(v) => v.capacity(),
            Column::Float(v) => v.capacity(),
            Column::String(v) => v.capacity(),
        }
    }

    pub(crate) fn reserve_exact(&mut self, additional: usize) {
        match self {
            Column::Boolean(v) => v.reserve_exact(additional),
            Column::Integer(v) => v.reserve_exact(additional),
            Column::Float(v) => v.reserve_exact(additional),
            Column::String(v) => v.reserve_exact(additional),
        }
    }

    /// Get a copy of the value at `index`
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Column::Boolean(v) => v.get(index).copied().map(Value::Boolean),
            Column::Integer(v) => v.get(index).copied().map(Value::Integer),
            Column::Float(v) => v.get(index).copied().map(Value::Float),
            Column::String(v) => v.get(index).cloned().map(Value::String),
        }
    }

    /// Append a value, widening integers into float columns
    pub fn push(&mut self, value: Value) -> Result<(), DataError> {
        match (self, value) {
            (Column::Boolean(v), Value::Boolean(b)) => v.push(b),
            (Column::Integer(v), Value::Integer(i)) => v.push(i),
            (Column::Float(v), Value::Float(x)) => v.push(x),
            (Column::Float(v), Value::Integer(i)) => v.push(i as f64),
            (Column::String(v), Value::String(s)) => v.push(s),
            (column, value) => {
                return Err(DataError::ValueType {
                    expected: column.data_type(),
                    found: value.data_type(),
                })
            }
        }

        Ok(())
    }

    /// Append the values of `other` in `range`
    pub fn extend_from(&mut self, other: &Column, range: Range<usize>) -> Result<(), DataError> {
        match (self, other) {
            (Column::Boolean(v), Column::Boolean(o)) => v.extend_from_slice(&o[range]),
            (Column::Integer(v), Column::Integer(o)) => v.extend_from_slice(&o[range]),
            (Column::Float(v), Column::Float(o)) => v.extend_from_slice(&o[range]),
            (Column::Float(v), Column::Integer(o)) => v.extend(o[range].iter().map(|&i| i as f64)),
            (Column::String(v), Column::String(o)) => v.extend_from_slice(&o[range]),
            (column, other) => {
                return Err(DataError::ValueType {
                    expected: column.data_type(),
                    found: other.data_type(),
                })
            }
        }

        Ok(())
    }

    /// Gather the values at `indices` into a new column, in index order
    pub fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Boolean(v) => Column::Boolean(indices.iter().map(|&i| v[i]).collect()),
            Column::Integer(v) => Column::Integer(indices.iter().map(|&i| v[i]).collect()),
            Column::Float(v) => Column::Float(indices.iter().map(|&i| v[i]).collect()),
            Column::String(v) => Column::String(indices.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// Compare the values at two rows of this column.
    ///
    /// Floats use a total order, so NaN sorts after every other value.
    pub fn compare_rows(&self, lhs: usize, rhs: usize) -> Ordering {
        match self {
            Column::Boolean(v) => v[lhs].cmp(&v[rhs]),
            Column::Integer(v) => v[lhs].cmp(&v[rhs]),
            Column::Float(v) => v[lhs].total_cmp(&v[rhs]),
            Column::String(v) => v[lhs].cmp(&v[rhs]),
        }
    }

    /// Check whether row `row` of this column equals row `other_row` of `other`.
    ///
    /// Columns of different types never compare equal.
    pub fn rows_equal(&self, row: usize, other: &Column, other_row: usize) -> bool {
        match (self, other) {
            (Column::Boolean(a), Column::Boolean(b)) => a[row] == b[other_row],
            (Column::Integer(a), Column::Integer(b)) => a[row] == b[other_row],
            (Column::Float(a), Column::Float(b)) => a[row] == b[other_row],
            (Column::String(a), Column::String(b)) => a[row] == b[other_row],
            _ => false,
        }
    }

    /// Feed the value at `row` into a hasher, consistently with [`Column::rows_equal`]
    pub(crate) fn hash_row<H: Hasher>(&self, row: usize, state: &mut H) {
        match self {
            Column::Boolean(v) => v[row].hash(state),
            Column::Integer(v) => v[row].hash(state),
            Column::Float(v) => {
                // 0.0 and -0.0 compare equal and must hash equal
                let x = if v[row] == 0.0 { 0.0f64 } else { v[row] };
                x.to_bits().hash(state)
            }
            Column::String(v) => v[row].hash(state),
        }
    }

    /// Get the values of a boolean column
    pub fn as_booleans(&self) -> Option<&[bool]> {
        match self {
            Column::Boolean(v) => Some(v),
            _ => None,
        }
    }

    /// Get the values of an integer column
    pub fn as_integers(&self) -> Option<&[i64]> {
        match self {
            Column::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// Get the values of a float column
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Column::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Get the values of a string column
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Column::String(v) => Some(v),
            _ => None,
        }
    }
}

/// Rust types that can be stored as a column
pub trait ColumnType: Sized {
    /// The column type this Rust type maps to
    const DATA_TYPE: DataType;

    /// Wrap owned values into a column
    fn into_column(values: Vec<Self>) -> Column;

    /// Wrap a single value
    fn into_value(self) -> Value;
}

impl ColumnType for bool {
    const DATA_TYPE: DataType = DataType::Boolean;

    fn into_column(values: Vec<Self>) -> Column {
        Column::Boolean(values)
    }

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl ColumnType for i64 {
    const DATA_TYPE: DataType = DataType::Integer;

    fn into_column(values: Vec<Self>) -> Column {
        Column::Integer(values)
    }

    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

impl ColumnType for f64 {
    const DATA_TYPE: DataType = DataType::Float;

    fn into_column(values: Vec<Self>) -> Column {
        Column::Float(values)
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl ColumnType for String {
    const DATA_TYPE: DataType = DataType::String;

    fn into_column(values: Vec<Self>) -> Column {
        Column::String(values)
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}
