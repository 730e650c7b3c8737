// Named per-row view handed to user callbacks
// Author: Gabriel Demetrios Lafis

use std::collections::HashMap;

use super::{Column, DataError, DataType, Schema, Value};

/// Name-to-position mapping for the columns a callback may see.
///
/// Computed once when an operator is defined and shared by every row.
#[derive(Debug, Clone)]
pub struct RecordLayout {
    names: Vec<String>,
    positions: HashMap<String, usize>,
    column_indices: Vec<usize>,
}

impl RecordLayout {
    /// Expose `selection` (or every column when `None`) of `schema`
    pub fn new(schema: &Schema, selection: Option<&[&str]>) -> Result<Self, DataError> {
        let column_indices = match selection {
            Some(names) => schema.resolve(names, "selection")?,
            None => (0..schema.len()).collect(),
        };

        let names: Vec<String> = column_indices
            .iter()
            .map(|&i| schema.fields()[i].name.clone())
            .collect();
        let positions = names
            .iter()
            .enumerate()
            .map(|(pos, name)| (name.clone(), pos))
            .collect();

        Ok(RecordLayout {
            names,
            positions,
            column_indices,
        })
    }

    /// Get the exposed field names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Get the positions of the exposed columns in the source schema
    pub fn column_indices(&self) -> &[usize] {
        &self.column_indices
    }

    /// Build the record of row `row` over the columns of a frame
    pub fn record<'a>(&'a self, columns: &'a [Column], row: usize) -> Record<'a> {
        Record {
            layout: self,
            columns,
            row,
        }
    }
}

/// The values of the selected columns at one row, addressed by name
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    layout: &'a RecordLayout,
    columns: &'a [Column],
    row: usize,
}

impl<'a> Record<'a> {
    /// Get the number of fields
    pub fn len(&self) -> usize {
        self.layout.names.len()
    }

    /// Check if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.layout.names.is_empty()
    }

    /// Get the field names in order
    pub fn names(&self) -> &'a [String] {
        &self.layout.names
    }

    /// Get the position of the row in its frame
    pub fn row_index(&self) -> usize {
        self.row
    }

    fn column(&self, name: &str) -> Result<&'a Column, DataError> {
        let pos = self
            .layout
            .positions
            .get(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))?;
        Ok(&self.columns[self.layout.column_indices[*pos]])
    }

    fn mismatch(name: &str, expected: DataType, column: &Column) -> DataError {
        DataError::TypeMismatch {
            column: name.to_string(),
            expected,
            found: column.data_type(),
        }
    }

    /// Get a copy of a field value
    pub fn get(&self, name: &str) -> Result<Value, DataError> {
        let column = self.column(name)?;
        column.get(self.row).ok_or(DataError::RowOutOfBounds {
            index: self.row,
            len: column.len(),
        })
    }

    /// Get a boolean field
    pub fn boolean(&self, name: &str) -> Result<bool, DataError> {
        let column = self.column(name)?;
        column
            .as_booleans()
            .map(|v| v[self.row])
            .ok_or_else(|| Self::mismatch(name, DataType::Boolean, column))
    }

    /// Get an integer field
    pub fn integer(&self, name: &str) -> Result<i64, DataError> {
        let column = self.column(name)?;
        column
            .as_integers()
            .map(|v| v[self.row])
            .ok_or_else(|| Self::mismatch(name, DataType::Integer, column))
    }

    /// Get a numeric field as a float, widening integers
    pub fn float(&self, name: &str) -> Result<f64, DataError> {
        let column = self.column(name)?;
        match column {
            Column::Float(v) => Ok(v[self.row]),
            Column::Integer(v) => Ok(v[self.row] as f64),
            _ => Err(Self::mismatch(name, DataType::Float, column)),
        }
    }

    /// Get a string field
    pub fn string(&self, name: &str) -> Result<&'a str, DataError> {
        let column = self.column(name)?;
        column
            .as_strings()
            .map(|v| v[self.row].as_str())
            .ok_or_else(|| Self::mismatch(name, DataType::String, column))
    }
}
