// Schema definition and validation
// Author: Gabriel Demetrios Lafis

use serde::{Deserialize, Serialize};

use super::names::{require_unique, require_valid_identifier};
use super::{DataError, DataType};

/// A named, typed column description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    /// Create a new field
    pub fn new(name: &str, data_type: DataType) -> Self {
        Field {
            name: name.to_string(),
            data_type,
        }
    }
}

/// An ordered list of uniquely named fields
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema, rejecting duplicate or malformed names
    pub fn new(fields: Vec<Field>) -> Result<Self, DataError> {
        for field in &fields {
            require_valid_identifier(&field.name)?;
        }
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        require_unique(&names, "schema")?;

        Ok(Schema { fields })
    }

    /// Create a schema without columns
    pub fn empty() -> Self {
        Schema::default()
    }

    /// Parse a schema from `name:type,name:type,...`
    pub fn parse_spec(spec: &str) -> Result<Self, DataError> {
        let mut fields = Vec::new();

        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, data_type) = entry.split_once(':').ok_or_else(|| {
                DataError::Schema(format!("Expected 'name:type', got '{}'", entry))
            })?;
            fields.push(Field::new(name.trim(), data_type.parse()?));
        }

        Schema::new(fields)
    }

    /// Get the fields in order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Get the number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the field names in order
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Get a reference to a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get the position of a field by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Check if a field with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Get the position of a field, failing if it does not exist
    pub fn require_index(&self, name: &str) -> Result<usize, DataError> {
        self.index_of(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// Resolve a list of distinct, existing names to their positions
    pub fn resolve(&self, names: &[&str], what: &str) -> Result<Vec<usize>, DataError> {
        require_unique(names, what)?;
        names.iter().map(|name| self.require_index(name)).collect()
    }

    /// Build the schema holding exactly `names`, in the given order
    pub fn project(&self, names: &[&str]) -> Result<Schema, DataError> {
        let indices = self.resolve(names, "selection")?;
        Ok(Schema {
            fields: indices.into_iter().map(|i| self.fields[i].clone()).collect(),
        })
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let fields = Vec::<Field>::deserialize(deserializer)?;
        Schema::new(fields).map_err(serde::de::Error::custom)
    }
}

/// Schema builder for creating schemas
pub struct SchemaBuilder {
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        SchemaBuilder { fields: Vec::new() }
    }

    /// Add a field to the schema
    pub fn add_field(mut self, name: &str, data_type: DataType) -> Self {
        self.fields.push(Field::new(name, data_type));
        self
    }

    /// Add a boolean field
    pub fn add_boolean(self, name: &str) -> Self {
        self.add_field(name, DataType::Boolean)
    }

    /// Add an integer field
    pub fn add_integer(self, name: &str) -> Self {
        self.add_field(name, DataType::Integer)
    }

    /// Add a float field
    pub fn add_float(self, name: &str) -> Self {
        self.add_field(name, DataType::Float)
    }

    /// Add a string field
    pub fn add_string(self, name: &str) -> Self {
        self.add_field(name, DataType::String)
    }

    /// Build and validate the schema
    pub fn build(self) -> Result<Schema, DataError> {
        Schema::new(self.fields)
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
