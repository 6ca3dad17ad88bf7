//! Non-exclusive category aggregation
//!
//! One category per declared indicator column; a row belongs to every
//! category whose flag it satisfies, so categories may overlap freely.
//! Aggregation is a pure function of the input table: one membership scan,
//! then one reduction per (category, aggregate) pair.

mod reducer;
mod result;

pub use reducer::{Aggregate, AggregateFunc, Reducer};
pub use result::{AggregationResult, ResultRow};

use crate::data::{Row, Table, Value};
use crate::{AggError, Result};
use ahash::AHashSet;
use rayon::prelude::*;
use reducer::Num;
use std::sync::Arc;

/// Behavior of `avg`/`min`/`max` and custom reducers over a category with
/// zero qualifying values. `count` and `sum` are always defined (0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyPolicy {
    /// Emit a null marker in the result row
    #[default]
    Null,
    /// Fail the whole run with `AggError::EmptyCategory`
    Error,
}

/// Aggregation options
#[derive(Debug, Clone)]
pub struct AggregationOptions {
    /// Require every declared column to be present in every participating
    /// row; an absent field raises `AggError::Schema` instead of being
    /// treated as false/null
    pub strict_schema: bool,
    /// Accept any value as an indicator, using generic truthiness. Without
    /// coercion only booleans and 0/1 are accepted as flags
    pub coerce_flags: bool,
    /// Exclude null values from the affected aggregate only. When false,
    /// any null under a requested value column raises
    /// `AggError::MissingValue`
    pub skip_null: bool,
    /// Empty-subset behavior for aggregates with no defined empty result
    pub empty_policy: EmptyPolicy,
    /// Reduce categories on the rayon thread pool. Output is identical to
    /// the sequential path; rows stay in declaration order
    pub parallel: bool,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            strict_schema: false,
            coerce_flags: false,
            skip_null: true,
            empty_policy: EmptyPolicy::default(),
            parallel: false,
        }
    }
}

impl AggregationOptions {
    /// Set strict schema mode
    pub fn strict_schema(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }

    /// Set lenient flag coercion
    pub fn coerce_flags(mut self, coerce: bool) -> Self {
        self.coerce_flags = coerce;
        self
    }

    /// Set the null value policy
    pub fn skip_null(mut self, skip: bool) -> Self {
        self.skip_null = skip;
        self
    }

    /// Set the empty-subset policy
    pub fn empty_policy(mut self, policy: EmptyPolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    /// Enable parallel reduction across categories
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// An aggregate resolved against a value column, fixed before the scan
enum ResolvedAggregate {
    /// Subset cardinality; independent of value columns
    Count { output: String },
    /// An aggregate applied to one value column
    PerColumn {
        aggregate: Aggregate,
        column: String,
        output: String,
    },
}

impl ResolvedAggregate {
    fn output(&self) -> &str {
        match self {
            ResolvedAggregate::Count { output } => output,
            ResolvedAggregate::PerColumn { output, .. } => output,
        }
    }
}

/// An aggregation request over non-exclusive indicator categories
///
/// ```
/// use multicat::{Aggregation, AggregateFunc, Table, Value};
///
/// let table: Table = serde_json::from_str(
///     r#"[{"cat_x": true, "cat_y": false, "v": 10},
///         {"cat_x": true, "cat_y": true,  "v": 20},
///         {"cat_x": false, "cat_y": true, "v": 5}]"#,
/// ).unwrap();
///
/// let result = Aggregation::new(["cat_x", "cat_y"])
///     .values(["v"])
///     .aggregate(AggregateFunc::Sum)
///     .run(&table)
///     .unwrap();
///
/// assert_eq!(result.get("cat_x", "sum_v"), Some(&Value::Int64(30)));
/// assert_eq!(result.get("cat_y", "sum_v"), Some(&Value::Int64(25)));
/// ```
pub struct Aggregation {
    category_columns: Vec<String>,
    value_columns: Vec<String>,
    aggregates: Vec<Aggregate>,
    options: AggregationOptions,
}

impl Aggregation {
    /// Create a request over the given indicator columns, one category per
    /// column, in the given order
    pub fn new<I, S>(category_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category_columns: category_columns.into_iter().map(Into::into).collect(),
            value_columns: Vec::new(),
            aggregates: Vec::new(),
            options: AggregationOptions::default(),
        }
    }

    /// Set the numeric columns to aggregate
    pub fn values<I, S>(mut self, value_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_columns = value_columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a built-in aggregate function
    pub fn aggregate(mut self, func: AggregateFunc) -> Self {
        self.aggregates.push(Aggregate::Builtin(func));
        self
    }

    /// Add a user-supplied reducer
    pub fn reducer(mut self, reducer: Arc<dyn Reducer>) -> Self {
        self.aggregates.push(Aggregate::Custom(reducer));
        self
    }

    /// Set aggregation options
    pub fn options(mut self, options: AggregationOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the aggregation. The table is read-only; the result is newly
    /// constructed, one row per declared category in declaration order.
    pub fn run(&self, table: &Table) -> Result<AggregationResult> {
        self.validate()?;
        let resolved = self.resolve()?;
        let members = self.scan_membership(table)?;

        log::debug!(
            "membership scan: {} rows, {} categories, subset sizes {:?}",
            table.len(),
            members.len(),
            members.iter().map(Vec::len).collect::<Vec<_>>()
        );

        let columns: Vec<String> = resolved.iter().map(|r| r.output().to_string()).collect();
        let reduce = |(category, subset): (&String, &Vec<&Row>)| {
            self.reduce_category(category, subset, &resolved)
        };

        let pairs: Vec<(&String, &Vec<&Row>)> =
            self.category_columns.iter().zip(members.iter()).collect();
        let rows: Vec<ResultRow> = if self.options.parallel {
            pairs.into_par_iter().map(reduce).collect::<Result<_>>()?
        } else {
            pairs.into_iter().map(reduce).collect::<Result<_>>()?
        };

        Ok(AggregationResult::new(columns, rows))
    }

    /// Reject invalid or contradictory request shapes
    fn validate(&self) -> Result<()> {
        if self.category_columns.is_empty() {
            return Err(AggError::Configuration(
                "category column list must not be empty".to_string(),
            ));
        }
        let mut seen = AHashSet::new();
        for column in &self.category_columns {
            if !seen.insert(column.as_str()) {
                return Err(AggError::Configuration(format!(
                    "duplicate category column '{}'",
                    column
                )));
            }
        }
        if self.aggregates.is_empty() {
            return Err(AggError::Configuration(
                "at least one aggregate function is required".to_string(),
            ));
        }
        for aggregate in &self.aggregates {
            if !aggregate.is_count() && self.value_columns.is_empty() {
                return Err(AggError::Configuration(format!(
                    "aggregate '{}' requires at least one value column",
                    aggregate.name()
                )));
            }
        }
        Ok(())
    }

    /// Resolve each aggregate against its value columns once, before the
    /// scan. Count ignores value columns and is emitted once, as `count`;
    /// every other aggregate produces one `<aggregate>_<column>` output per
    /// value column.
    fn resolve(&self) -> Result<Vec<ResolvedAggregate>> {
        let mut resolved = Vec::new();
        for aggregate in &self.aggregates {
            if aggregate.is_count() {
                resolved.push(ResolvedAggregate::Count {
                    output: "count".to_string(),
                });
            } else {
                for column in &self.value_columns {
                    resolved.push(ResolvedAggregate::PerColumn {
                        aggregate: aggregate.clone(),
                        column: column.clone(),
                        output: format!("{}_{}", aggregate.name(), column),
                    });
                }
            }
        }
        let mut seen = AHashSet::new();
        for item in &resolved {
            if !seen.insert(item.output()) {
                return Err(AggError::Configuration(format!(
                    "duplicate output column '{}'",
                    item.output()
                )));
            }
        }
        Ok(resolved)
    }

    /// Single pass over the table, appending each row to every category it
    /// belongs to. Same O(rows x categories) bound as a per-category
    /// rescan, better cache behavior, and flag errors surface on the first
    /// offending row.
    fn scan_membership<'t>(&self, table: &'t Table) -> Result<Vec<Vec<&'t Row>>> {
        let mut members: Vec<Vec<&Row>> = vec![Vec::new(); self.category_columns.len()];
        for row in table.iter() {
            for (subset, column) in members.iter_mut().zip(&self.category_columns) {
                if self.flag_is_set(row, column)? {
                    subset.push(row);
                }
            }
        }
        Ok(members)
    }

    /// Evaluate one indicator flag. Booleans and 0/1 are always accepted;
    /// null and (outside strict mode) an absent field mean "not a member";
    /// anything else follows the coercion policy.
    fn flag_is_set(&self, row: &Row, column: &str) -> Result<bool> {
        let value = match row.get(column) {
            Some(value) => value,
            None => {
                if self.options.strict_schema {
                    return Err(AggError::Schema {
                        column: column.to_string(),
                    });
                }
                return Ok(false);
            }
        };
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::Int64(0) => Ok(false),
            Value::Int64(1) => Ok(true),
            Value::Float64(f) if *f == 0.0 => Ok(false),
            Value::Float64(f) if *f == 1.0 => Ok(true),
            other => {
                if self.options.coerce_flags {
                    Ok(other.is_truthy())
                } else {
                    Err(AggError::TypeCoercion {
                        column: column.to_string(),
                        value: other.to_string(),
                        expected: "boolean",
                    })
                }
            }
        }
    }

    /// Produce one result row for a category subset
    fn reduce_category(
        &self,
        category: &str,
        subset: &[&Row],
        resolved: &[ResolvedAggregate],
    ) -> Result<ResultRow> {
        let mut values = Vec::with_capacity(resolved.len());
        for item in resolved {
            let value = match item {
                ResolvedAggregate::Count { .. } => Value::Int64(subset.len() as i64),
                ResolvedAggregate::PerColumn {
                    aggregate, column, ..
                } => {
                    let nums = self.collect_numeric(category, column, subset)?;
                    let computed = match aggregate {
                        Aggregate::Builtin(func) => reducer::apply_builtin(*func, &nums),
                        Aggregate::Custom(custom) => {
                            if nums.is_empty() {
                                None
                            } else {
                                let floats: Vec<f64> =
                                    nums.iter().map(|n| n.as_f64()).collect();
                                Some(Value::Float64(custom.reduce(&floats)))
                            }
                        }
                    };
                    match computed {
                        Some(value) => value,
                        None => match self.options.empty_policy {
                            EmptyPolicy::Null => Value::Null,
                            EmptyPolicy::Error => {
                                return Err(AggError::EmptyCategory {
                                    category: category.to_string(),
                                    aggregate: aggregate.name().to_string(),
                                })
                            }
                        },
                    }
                }
            };
            values.push(value);
        }
        Ok(ResultRow {
            category: category.to_string(),
            values,
        })
    }

    /// Gather the subset's numeric values for one value column, applying
    /// the null policy. A null never removes a row from membership, only
    /// from the aggregate it affects.
    fn collect_numeric(&self, category: &str, column: &str, subset: &[&Row]) -> Result<Vec<Num>> {
        let mut out = Vec::with_capacity(subset.len());
        for row in subset {
            match row.get(column) {
                None if self.options.strict_schema => {
                    return Err(AggError::Schema {
                        column: column.to_string(),
                    });
                }
                None | Some(Value::Null) => {
                    if !self.options.skip_null {
                        return Err(AggError::MissingValue {
                            column: column.to_string(),
                            category: category.to_string(),
                        });
                    }
                }
                Some(Value::Int64(v)) => out.push(Num::Int(*v)),
                Some(Value::Float64(v)) => out.push(Num::Float(*v)),
                Some(other) => {
                    return Err(AggError::TypeCoercion {
                        column: column.to_string(),
                        value: other.to_string(),
                        expected: "numeric",
                    });
                }
            }
        }
        Ok(out)
    }
}
