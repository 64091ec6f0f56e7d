//! Row-level data-quality issues
//!
//! These never abort a run. Offending rows are dropped, logged at WARN and
//! collected into a [`ValidationReport`] so callers can see what was lost.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A recoverable data-quality condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum RowIssue {
    /// Key or date column absent
    MissingJoinKey { column: String },
    /// Negative value in a column that must be non-negative
    NegativeValue { column: String, value: f64 },
    /// Repeated value in a column declared unique
    DuplicateIdentifier { column: String, value: String },
    /// Stored amount disagrees with quantity × product price
    DerivedValueMismatch {
        expected: Option<f64>,
        actual: Option<f64>,
    },
    /// Distinct products differ between the product snapshot and the joined result
    ReferentialCardinalityMismatch { product_side: usize, merged: usize },
    /// Value present but not convertible to the column's type
    UnparsableValue { column: String, value: String },
}

impl RowIssue {
    /// Stable name of the issue kind
    pub fn kind(&self) -> &'static str {
        match self {
            RowIssue::MissingJoinKey { .. } => "missing_join_key",
            RowIssue::NegativeValue { .. } => "negative_value",
            RowIssue::DuplicateIdentifier { .. } => "duplicate_identifier",
            RowIssue::DerivedValueMismatch { .. } => "derived_value_mismatch",
            RowIssue::ReferentialCardinalityMismatch { .. } => "referential_cardinality_mismatch",
            RowIssue::UnparsableValue { .. } => "unparsable_value",
        }
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssue::MissingJoinKey { column } => write!(f, "missing value in '{column}'"),
            RowIssue::NegativeValue { column, value } => {
                write!(f, "negative value {value} in '{column}'")
            }
            RowIssue::DuplicateIdentifier { column, value } => {
                write!(f, "duplicate {value} in unique column '{column}'")
            }
            RowIssue::DerivedValueMismatch { expected, actual } => {
                write!(f, "total_amount {actual:?} != expected {expected:?}")
            }
            RowIssue::ReferentialCardinalityMismatch {
                product_side,
                merged,
            } => write!(
                f,
                "{product_side} distinct products in product data, {merged} in merged data"
            ),
            RowIssue::UnparsableValue { column, value } => {
                write!(f, "cannot convert {value} in '{column}'")
            }
        }
    }
}

/// A row removed by validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedRow {
    /// Dataset the row came from
    pub dataset: String,
    /// Sale or product identifier, when the row had one
    pub key: Option<String>,
    pub issue: RowIssue,
}

/// Everything validation removed or flagged during one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub dropped: Vec<DroppedRow>,
    /// Advisory findings that did not remove rows
    pub warnings: Vec<RowIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a dropped row
    pub fn drop_row(&mut self, dataset: &str, key: Option<String>, issue: RowIssue) {
        tracing::warn!(
            dataset,
            key = key.as_deref().unwrap_or("<none>"),
            issue = issue.kind(),
            "Dropping row: {}",
            issue
        );
        self.dropped.push(DroppedRow {
            dataset: dataset.to_string(),
            key,
            issue,
        });
    }

    /// Record and log an advisory finding
    pub fn warn(&mut self, issue: RowIssue) {
        tracing::warn!(issue = issue.kind(), "{}", issue);
        self.warnings.push(issue);
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    /// Dropped rows per issue kind
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.dropped {
            *counts.entry(row.issue.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// No rows dropped and no warnings
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty() && self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = ValidationReport::new();
        assert!(report.is_clean());

        report.drop_row(
            "sales data",
            Some("1".to_string()),
            RowIssue::NegativeValue {
                column: "quantity".to_string(),
                value: -1.0,
            },
        );
        report.drop_row(
            "sales data",
            None,
            RowIssue::MissingJoinKey {
                column: "product_id".to_string(),
            },
        );
        report.drop_row(
            "sales data",
            Some("3".to_string()),
            RowIssue::NegativeValue {
                column: "sales_price".to_string(),
                value: -2.5,
            },
        );

        assert_eq!(report.dropped_count(), 3);
        assert_eq!(report.counts().get("negative_value"), Some(&2));
        assert_eq!(report.counts().get("missing_join_key"), Some(&1));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_issue_display() {
        let issue = RowIssue::ReferentialCardinalityMismatch {
            product_side: 3,
            merged: 2,
        };
        assert_eq!(issue.kind(), "referential_cardinality_mismatch");
        assert!(issue.to_string().contains("3 distinct products"));
    }
}
