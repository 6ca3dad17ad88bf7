//! Row-oriented data model: values, rows, and tables
//!
//! The engine works on dynamically typed rows. A row is a mapping from
//! field name to [`Value`]; a table is an ordered sequence of rows. The
//! engine never mutates a table it is given.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Bool,
    Int64,
    Float64,
    String,
}

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Bool(_) => DataType::Bool,
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::String(_) => DataType::String,
        }
    }

    /// Check if this value is numeric (Int64 or Float64)
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int64(_) | Value::Float64(_))
    }

    /// View a numeric value as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Generic truthiness, used when lenient flag coercion is enabled:
    /// non-zero numbers and non-empty strings are true, null is false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int64(v) => *v != 0,
            Value::Float64(v) => *v != 0.0,
            Value::String(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// A row: mapping from field name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: AHashMap<String, Value>,
}

impl Row {
    /// Create a new empty row
    pub fn new() -> Self {
        Self {
            fields: AHashMap::new(),
        }
    }

    /// Set a field value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Check if the row has a field, even a null one
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields in the row
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An ordered sequence of rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Create a table from rows
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Append a row
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by position
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Iterate over rows in order
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::Int64(3).data_type(), DataType::Int64);
        assert_eq!(Value::Null.data_type(), DataType::Null);
        assert!(Value::Null.is_null());
        assert!(Value::Int64(3).is_numeric());
        assert!(!Value::Bool(true).is_numeric());
        assert_eq!(Value::Int64(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float64(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int64(2).is_truthy());
        assert!(!Value::Int64(0).is_truthy());
        assert!(Value::String("x".into()).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_row_operations() {
        let mut row = Row::new();
        row.set("name", "John");
        row.set("age", Value::Int64(30));
        row.set("active", true);

        assert_eq!(row.get("age"), Some(&Value::Int64(30)));
        assert_eq!(row.get("missing"), None);
        assert!(row.contains("active"));
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_table_from_json() {
        let json = r#"[
            {"cat_x": true, "cat_y": false, "v": 10},
            {"cat_x": true, "cat_y": true, "v": 2.5},
            {"note": "no flags", "v": null}
        ]"#;
        let table: Table = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0).unwrap().get("cat_x"), Some(&Value::Bool(true)));
        assert_eq!(table.get(0).unwrap().get("v"), Some(&Value::Int64(10)));
        assert_eq!(table.get(1).unwrap().get("v"), Some(&Value::Float64(2.5)));
        assert_eq!(table.get(2).unwrap().get("v"), Some(&Value::Null));
    }
}
