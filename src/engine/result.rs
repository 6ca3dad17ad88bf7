//! Aggregation result table

use crate::data::{Row, Table, Value};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// One result row: a category and its aggregate values, positionally
/// aligned with the parent result's column names
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub category: String,
    pub values: Vec<Value>,
}

/// Aggregation result: one row per declared category, in the order the
/// category columns were supplied
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    columns: Vec<String>,
    rows: Vec<ResultRow>,
}

impl AggregationResult {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<ResultRow>) -> Self {
        Self { columns, rows }
    }

    /// Aggregate column names, excluding the leading category column
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Result rows in category order
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Number of result rows (== number of declared categories)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a single aggregate value by category and column name
    pub fn get(&self, category: &str, column: &str) -> Option<&Value> {
        let col = self.columns.iter().position(|c| c == column)?;
        let row = self.rows.iter().find(|r| r.category == category)?;
        row.values.get(col)
    }

    /// Deterministically sort rows by category name. Rows are otherwise
    /// left in the order the category columns were declared.
    pub fn sort_by_category(&mut self) {
        self.rows.sort_by(|a, b| a.category.cmp(&b.category));
    }

    /// Convert into a plain table, one field per output column
    pub fn into_table(self) -> Table {
        let mut table = Table::new();
        for result_row in self.rows {
            let mut row = Row::new();
            row.set("category", result_row.category);
            for (name, value) in self.columns.iter().zip(result_row.values) {
                row.set(name.clone(), value);
            }
            table.push(row);
        }
        table
    }
}

// Serialized as an array of objects with a stable key order:
// [{"category": ..., "<agg>_<col>": ...}, ...]
impl Serialize for AggregationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowView { result: self, row })?;
        }
        seq.end()
    }
}

struct RowView<'a> {
    result: &'a AggregationResult,
    row: &'a ResultRow,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.result.columns.len() + 1))?;
        map.serialize_entry("category", &self.row.category)?;
        for (name, value) in self.result.columns.iter().zip(&self.row.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
