//! Multicat Aggregation Engine
//!
//! Aggregates numeric observations in an in-memory table where category
//! membership is non-exclusive: each row may belong to zero, one, or several
//! categories at once, encoded as independent boolean indicator columns
//! rather than a single label column. One output row is produced per
//! declared category; a row flagged in several categories contributes fully
//! to each of them.

pub mod data;
pub mod engine;

// Re-export main types
pub use data::{DataType, Row, Table, Value};
pub use engine::{
    Aggregate, AggregateFunc, Aggregation, AggregationOptions, AggregationResult, EmptyPolicy,
    Reducer, ResultRow,
};

/// Aggregation engine error type
#[derive(Debug, thiserror::Error)]
pub enum AggError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Required column missing from record: {column}")]
    Schema { column: String },

    #[error("Cannot interpret value {value} in column '{column}' as {expected}")]
    TypeCoercion {
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("Null value in column '{column}' for category '{category}'")]
    MissingValue { column: String, category: String },

    #[error("Aggregate '{aggregate}' is undefined for empty category '{category}'")]
    EmptyCategory { category: String, aggregate: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for aggregation operations
pub type Result<T> = std::result::Result<T, AggError>;
