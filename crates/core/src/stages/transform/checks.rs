//! Row-level cleaning before and after the join

use std::collections::HashSet;

use super::join::JoinedRow;
use super::typed::{ProductRecord, SaleRecord};
use crate::config::TransformValidation;
use crate::dataset::{CuratedRow, DataKind, Record, Table, columns, is_null};
use crate::error::{PipelineError, PipelineResult};
use crate::validation::{RowIssue, ValidationReport};

const NUMERIC_COLUMNS: [&str; 4] = [
    columns::QUANTITY,
    columns::SALES_PRICE,
    columns::PRODUCT_PRICE,
    columns::TOTAL_AMOUNT,
];

const KEY_COLUMNS: [&str; 3] = [columns::SALE_ID, columns::PRODUCT_ID, columns::SALE_DATE];

/// Reject validation settings naming columns the curated row does not have
pub fn check_supported(validation: &TransformValidation) -> PipelineResult<()> {
    for column in &validation.check_negative {
        if !NUMERIC_COLUMNS.contains(&column.as_str()) {
            return Err(PipelineError::ConfigInvalid(format!(
                "validation.check_negative: '{column}' is not a numeric curated column"
            )));
        }
    }
    for column in &validation.unique {
        if !KEY_COLUMNS.contains(&column.as_str()) {
            return Err(PipelineError::ConfigInvalid(format!(
                "validation.unique: '{column}' is not a key column"
            )));
        }
    }
    Ok(())
}

fn record_key(record: &Record, column: &str) -> Option<String> {
    record
        .get(column)
        .filter(|v| !v.is_null())
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

/// Drop records with no value in any of `required`
pub fn drop_missing(
    table: &mut Table,
    required: &[String],
    kind: DataKind,
    report: &mut ValidationReport,
) {
    let dropped = table.partition_rows(|r| required.iter().all(|c| !is_null(r, c)));
    for record in dropped {
        let column = required
            .iter()
            .find(|c| is_null(&record, c))
            .cloned()
            .unwrap_or_default();
        report.drop_row(
            kind.dataset_name(),
            record_key(&record, columns::SALE_ID),
            RowIssue::MissingJoinKey { column },
        );
    }
}

/// Typed sales; records that fail conversion are dropped
pub fn typed_sales(table: &Table, report: &mut ValidationReport) -> Vec<SaleRecord> {
    let mut sales = Vec::with_capacity(table.len());
    for record in table.rows() {
        match SaleRecord::from_record(record) {
            Ok(sale) => sales.push(sale),
            Err(issue) => report.drop_row(
                DataKind::Sales.dataset_name(),
                record_key(record, columns::SALE_ID),
                issue,
            ),
        }
    }
    sales
}

/// Typed catalogue, unique by identifier (first occurrence wins)
pub fn typed_products(table: &Table, report: &mut ValidationReport) -> Vec<ProductRecord> {
    let dataset = DataKind::Product.dataset_name();
    let mut seen = HashSet::new();
    let mut products = Vec::with_capacity(table.len());
    for record in table.rows() {
        match ProductRecord::from_record(record) {
            Ok(Some(product)) => {
                if seen.insert(product.product_id.clone()) {
                    products.push(product);
                } else {
                    report.drop_row(
                        dataset,
                        Some(product.product_id.clone()),
                        RowIssue::DuplicateIdentifier {
                            column: columns::PRODUCT_ID.to_string(),
                            value: product.product_id,
                        },
                    );
                }
            }
            Ok(None) => report.drop_row(
                dataset,
                None,
                RowIssue::MissingJoinKey {
                    column: columns::PRODUCT_ID.to_string(),
                },
            ),
            Err(issue) => report.drop_row(dataset, record_key(record, columns::PRODUCT_ID), issue),
        }
    }
    products
}

fn numeric(row: &CuratedRow, column: &str) -> Option<f64> {
    match column {
        columns::QUANTITY => row.quantity.map(|q| q as f64),
        columns::SALES_PRICE => row.sales_price,
        columns::PRODUCT_PRICE => row.product_price,
        columns::TOTAL_AMOUNT => row.total_amount,
        _ => None,
    }
}

fn key(row: &CuratedRow, column: &str) -> Option<String> {
    match column {
        columns::SALE_ID => Some(row.sale_id.to_string()),
        columns::PRODUCT_ID => row.product_id.clone(),
        columns::SALE_DATE => Some(row.sale_date.clone()),
        _ => None,
    }
}

/// Post-join validation
///
/// Drops rows without a sale identifier, with negative values, with repeated
/// unique keys, or whose total disagrees with quantity × product price. The
/// distinct-product comparison is advisory only.
pub fn check_joined(
    joined: Vec<JoinedRow>,
    validation: &TransformValidation,
    product_side_distinct: usize,
    report: &mut ValidationReport,
) -> Vec<CuratedRow> {
    let dataset = "merged data";
    let mut rows = Vec::with_capacity(joined.len());
    for row in joined {
        let product_id = row.row.product_id.clone();
        match row.into_curated() {
            Some(curated) => rows.push(curated),
            None => report.drop_row(
                dataset,
                product_id,
                RowIssue::MissingJoinKey {
                    column: columns::SALE_ID.to_string(),
                },
            ),
        }
    }

    rows.retain(|row| {
        for column in &validation.check_negative {
            if let Some(value) = numeric(row, column).filter(|v| *v < 0.0) {
                report.drop_row(
                    dataset,
                    Some(row.sale_id.to_string()),
                    RowIssue::NegativeValue {
                        column: column.clone(),
                        value,
                    },
                );
                return false;
            }
        }
        true
    });

    for column in &validation.unique {
        let mut seen = HashSet::new();
        rows.retain(|row| match key(row, column) {
            Some(value) if !seen.insert(value.clone()) => {
                report.drop_row(
                    dataset,
                    Some(row.sale_id.to_string()),
                    RowIssue::DuplicateIdentifier {
                        column: column.clone(),
                        value,
                    },
                );
                false
            }
            _ => true,
        });
    }

    let merged_distinct = rows
        .iter()
        .filter_map(|r| r.product_id.as_deref())
        .collect::<HashSet<_>>()
        .len();
    if merged_distinct != product_side_distinct {
        report.warn(RowIssue::ReferentialCardinalityMismatch {
            product_side: product_side_distinct,
            merged: merged_distinct,
        });
    }

    rows.retain(|row| {
        if row.total_is_consistent() {
            return true;
        }
        report.drop_row(
            dataset,
            Some(row.sale_id.to_string()),
            RowIssue::DerivedValueMismatch {
                expected: row.expected_total(),
                actual: row.total_amount,
            },
        );
        false
    });

    rows
}

/// Distinct non-null product identifiers in the product snapshot
pub fn product_distinct(table: &Table) -> usize {
    table.distinct_count(columns::PRODUCT_ID)
}
