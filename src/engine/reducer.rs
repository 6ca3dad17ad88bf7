//! Aggregate functions and the reducer extension seam

use crate::data::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Built-in aggregate function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    /// Canonical lowercase name, used in output column names
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
        }
    }

    /// Parse an aggregate function name (case-insensitive, accepts both
    /// `avg` and `mean`)
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateFunc::Count),
            "sum" => Some(AggregateFunc::Sum),
            "avg" | "mean" => Some(AggregateFunc::Avg),
            "min" => Some(AggregateFunc::Min),
            "max" => Some(AggregateFunc::Max),
            _ => None,
        }
    }
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A user-supplied pure reducer: maps a finite sequence of numeric values
/// to a single numeric value. Like `avg`/`min`/`max`, a custom reducer has
/// no defined result for the empty subset; the engine's empty policy
/// applies.
pub trait Reducer: Send + Sync {
    /// Name used in output column names
    fn name(&self) -> &str;

    /// Reduce a non-empty sequence of values
    fn reduce(&self, values: &[f64]) -> f64;
}

/// An aggregate to apply: a built-in function or a custom reducer
#[derive(Clone)]
pub enum Aggregate {
    Builtin(AggregateFunc),
    Custom(Arc<dyn Reducer>),
}

impl Aggregate {
    pub fn name(&self) -> &str {
        match self {
            Aggregate::Builtin(func) => func.name(),
            Aggregate::Custom(reducer) => reducer.name(),
        }
    }

    /// Whether this aggregate ignores value columns and reports subset
    /// cardinality
    pub fn is_count(&self) -> bool {
        matches!(self, Aggregate::Builtin(AggregateFunc::Count))
    }
}

impl fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::Builtin(func) => write!(f, "Builtin({})", func),
            Aggregate::Custom(reducer) => write!(f, "Custom({})", reducer.name()),
        }
    }
}

impl From<AggregateFunc> for Aggregate {
    fn from(func: AggregateFunc) -> Self {
        Aggregate::Builtin(func)
    }
}

/// A numeric value drawn from a value column. Integer inputs keep integer
/// results for sum/min/max; any float promotes the accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Float(v) => v,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(v) => Value::Int64(v),
            Num::Float(v) => Value::Float64(v),
        }
    }
}

/// Sum with integer-preserving accumulation. Empty input sums to Int64(0).
pub(crate) fn sum(values: &[Num]) -> Value {
    let mut acc = Num::Int(0);
    for v in values {
        acc = match (acc, v) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a + b),
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        };
    }
    acc.into_value()
}

/// Apply a built-in aggregate other than count to the subset's values.
/// Returns None when the result is undefined for an empty subset.
pub(crate) fn apply_builtin(func: AggregateFunc, values: &[Num]) -> Option<Value> {
    match func {
        AggregateFunc::Count => Some(Value::Int64(values.len() as i64)),
        AggregateFunc::Sum => Some(sum(values)),
        AggregateFunc::Avg => {
            if values.is_empty() {
                None
            } else {
                let total: f64 = values.iter().map(|v| v.as_f64()).sum();
                Some(Value::Float64(total / values.len() as f64))
            }
        }
        AggregateFunc::Min => extremum(values, std::cmp::Ordering::Less),
        AggregateFunc::Max => extremum(values, std::cmp::Ordering::Greater),
    }
}

fn extremum(values: &[Num], keep: std::cmp::Ordering) -> Option<Value> {
    let mut best: Option<Num> = None;
    for &v in values {
        best = match best {
            None => Some(v),
            Some(b) => {
                let ord = v
                    .as_f64()
                    .partial_cmp(&b.as_f64())
                    .unwrap_or(std::cmp::Ordering::Equal);
                if ord == keep {
                    Some(v)
                } else {
                    Some(b)
                }
            }
        };
    }
    best.map(Num::into_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(AggregateFunc::parse("sum"), Some(AggregateFunc::Sum));
        assert_eq!(AggregateFunc::parse("SUM"), Some(AggregateFunc::Sum));
        assert_eq!(AggregateFunc::parse("mean"), Some(AggregateFunc::Avg));
        assert_eq!(AggregateFunc::parse("avg"), Some(AggregateFunc::Avg));
        assert_eq!(AggregateFunc::parse("median"), None);
    }

    #[test]
    fn test_sum_keeps_integers() {
        let values = [Num::Int(10), Num::Int(20)];
        assert_eq!(sum(&values), Value::Int64(30));

        let values = [Num::Int(10), Num::Float(0.5)];
        assert_eq!(sum(&values), Value::Float64(10.5));
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        assert_eq!(sum(&[]), Value::Int64(0));
        assert_eq!(
            apply_builtin(AggregateFunc::Sum, &[]),
            Some(Value::Int64(0))
        );
    }

    #[test]
    fn test_avg() {
        let values = [Num::Int(10), Num::Int(20), Num::Int(30)];
        assert_eq!(
            apply_builtin(AggregateFunc::Avg, &values),
            Some(Value::Float64(20.0))
        );
        assert_eq!(apply_builtin(AggregateFunc::Avg, &[]), None);
    }

    #[test]
    fn test_min_max() {
        let values = [Num::Int(7), Num::Float(2.5), Num::Int(9)];
        assert_eq!(
            apply_builtin(AggregateFunc::Min, &values),
            Some(Value::Float64(2.5))
        );
        assert_eq!(
            apply_builtin(AggregateFunc::Max, &values),
            Some(Value::Int64(9))
        );
        assert_eq!(apply_builtin(AggregateFunc::Min, &[]), None);
        assert_eq!(apply_builtin(AggregateFunc::Max, &[]), None);
    }
}
