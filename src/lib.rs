// Columnar Frame Engine
// Author: Gabriel Demetrios Lafis

//! # Columnar Frame Engine
//!
//! An in-memory, schema-typed, column-oriented dataframe engine.
//!
//! ## Features
//!
//! - Dataframes stored as one typed vector per column
//! - Select, apply, query, inner equi-join, summarize and multi-key sort
//! - Operators validated against their input schema once, when defined
//! - Grouped aggregation with sum, min, max, avg, stddev and count-if
//! - CSV loading and saving
//! - Fixed-width table printing
//!
//! ## Example
//!
//! ```rust
//! use columnar_frame_engine::{
//!     data::{DataFrame, SchemaBuilder, Value},
//!     processing::{Aggregation, JoinType, SortOrder},
//!     values,
//! };
//!
//! let persons = SchemaBuilder::new()
//!     .add_string("name")
//!     .add_integer("age")
//!     .add_string("city")
//!     .build()
//!     .unwrap();
//!
//! let mut people = DataFrame::new(persons);
//! people.insert(values!["Alice", 30, "Berlin"]).unwrap();
//! people.insert(values!["Bob", 62, "Seoul"]).unwrap();
//! people.insert(values!["Carol", 25, "Berlin"]).unwrap();
//!
//! let mut cities = DataFrame::new(
//!     SchemaBuilder::new().add_string("city").add_string("country").build().unwrap(),
//! );
//! cities.insert(values!["Berlin", "Germany"]).unwrap();
//! cities.insert(values!["Seoul", "South Korea"]).unwrap();
//!
//! let result = people
//!     .query(|r| Ok(r.integer("age")? < 60))
//!     .unwrap()
//!     .join(&cities, JoinType::Inner, &["city"])
//!     .unwrap()
//!     .summarize(&["country"], &[Aggregation::avg("age")])
//!     .unwrap()
//!     .sort_by(SortOrder::Ascending, &["country"])
//!     .unwrap();
//!
//! assert_eq!(result.size(), 1);
//! assert_eq!(result.value(0, "age_avg").unwrap(), Value::from(27.5));
//! ```

pub mod data;
pub mod processing;
pub mod utils;

// Re-export main types
pub use data::{Column, DataFrame, DataType, Field, Row, Schema, SchemaBuilder, Value};
pub use processing::{DataProcessor, Pipeline};
pub use utils::Config;
