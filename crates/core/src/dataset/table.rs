//! Loosely typed record tables (raw and bronze layers)

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{PipelineError, PipelineResult};

/// One flat JSON object
pub type Record = Map<String, Value>;

/// Ordered collection of records
///
/// The column set is the union of keys over all records, in order of first
/// appearance, so a key missing from one row is a null for that row rather
/// than a missing column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<Record>,
}

impl Table {
    /// Create a table from records
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    /// Read a JSON array of objects
    pub fn read_json(path: &Path) -> PipelineResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| PipelineError::io_with_path(path, "reading dataset", e))?;
        let value: Value =
            serde_json::from_str(&content).map_err(|e| PipelineError::json(path, e))?;

        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(PipelineError::InvalidData {
                    path: path.to_path_buf(),
                    reason: format!("expected a JSON array of records, found {}", kind_of(&other)),
                });
            }
        };

        let mut rows = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(record) => rows.push(record),
                other => {
                    return Err(PipelineError::InvalidData {
                        path: path.to_path_buf(),
                        reason: format!("record {index} is {}, not an object", kind_of(&other)),
                    });
                }
            }
        }
        Ok(Self { rows })
    }

    /// Read and concatenate several files in the given order
    pub fn read_json_many<P: AsRef<Path>>(paths: &[P]) -> PipelineResult<Self> {
        let mut table = Table::default();
        for path in paths {
            table.append(Table::read_json(path.as_ref())?);
        }
        Ok(table)
    }

    /// Write the table as a pretty-printed JSON array
    pub fn write_json(&self, path: &Path) -> PipelineResult<()> {
        let json = serde_json::to_string_pretty(&self.rows)
            .map_err(|e| PipelineError::json(path, e))?;
        fs::write(path, json).map_err(|e| PipelineError::io_with_path(path, "writing dataset", e))
    }

    /// Row-wise union, preserving order
    pub fn append(&mut self, other: Table) {
        self.rows.extend(other.rows);
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow the rows
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Column names in order of first appearance
    pub fn columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// Required columns absent from the table, in the order given
    pub fn missing_columns(&self, required: &[String]) -> Vec<String> {
        let present: HashSet<String> = self.columns().into_iter().collect();
        required
            .iter()
            .filter(|c| !present.contains(*c))
            .cloned()
            .collect()
    }

    /// Fail with `MissingColumns` unless every required column is present
    pub fn require_columns(&self, required: &[String], dataset: &str) -> PipelineResult<()> {
        let missing = self.missing_columns(required);
        if missing.is_empty() {
            tracing::info!(dataset, "All required columns present");
            Ok(())
        } else {
            tracing::error!(dataset, missing = ?missing, "Missing required columns");
            Err(PipelineError::MissingColumns {
                dataset: dataset.to_string(),
                columns: missing,
            })
        }
    }

    /// Set a column to the same value in every row
    pub fn stamp(&mut self, column: &str, value: Value) {
        for row in &mut self.rows {
            row.insert(column.to_string(), value.clone());
        }
    }

    /// Rename a column in every row that has it
    pub fn rename_column(&mut self, from: &str, to: &str) {
        for row in &mut self.rows {
            if let Some(value) = row.remove(from) {
                row.insert(to.to_string(), value);
            }
        }
    }

    /// Remove a column from every row
    pub fn drop_column(&mut self, column: &str) {
        for row in &mut self.rows {
            row.remove(column);
        }
    }

    /// Keep rows matching the predicate, returning the removed ones
    pub fn partition_rows<F>(&mut self, mut keep: F) -> Vec<Record>
    where
        F: FnMut(&Record) -> bool,
    {
        let (kept, dropped): (Vec<_>, Vec<_>) = self.rows.drain(..).partition(|r| keep(r));
        self.rows = kept;
        dropped
    }

    /// Number of distinct non-null values in a column
    pub fn distinct_count(&self, column: &str) -> usize {
        self.rows
            .iter()
            .filter_map(|r| r.get(column))
            .filter(|v| !v.is_null())
            .map(value_key)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Whether a record has no value (absent or null) for a column
pub fn is_null(record: &Record, column: &str) -> bool {
    record.get(column).is_none_or(Value::is_null)
}

/// Comparable key for a JSON scalar
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => format!("s:{s}"),
        other => format!("v:{other}"),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
