//! Conversion of loosely typed snapshot records into typed rows

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::dataset::{Record, columns};
use crate::validation::RowIssue;

/// A sale after renaming, ready to join
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub sale_id: Option<i64>,
    pub product_id: Option<String>,
    /// ISO date (`YYYY-MM-DD`)
    pub sale_date: String,
    pub quantity: Option<i64>,
    pub sales_price: Option<f64>,
    pub ingestion_timestamp: Option<String>,
}

/// A catalogue entry after renaming
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub product_id: String,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub product_price: Option<f64>,
}

fn unparsable(column: &str, value: &Value) -> RowIssue {
    RowIssue::UnparsableValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}

/// Integer column; whole floats and numeric strings are accepted
pub fn int_field(record: &Record, column: &str) -> Result<Option<i64>, RowIssue> {
    match record.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| unparsable(column, value)),
        Some(value @ Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| unparsable(column, value)),
        Some(value) => Err(unparsable(column, value)),
    }
}

/// Float column; numeric strings are accepted
pub fn float_field(record: &Record, column: &str) -> Result<Option<f64>, RowIssue> {
    match record.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| unparsable(column, value)),
        Some(value @ Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| unparsable(column, value)),
        Some(value) => Err(unparsable(column, value)),
    }
}

/// Text column; numbers are rendered as text
pub fn text_field(record: &Record, column: &str) -> Result<Option<String>, RowIssue> {
    match record.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(value) => Err(unparsable(column, value)),
    }
}

/// Years a sale date may fall in; the store names partitions `<YYYY>_<MM>`
pub const SALE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Parse a sale date
///
/// Accepts `YYYY-MM-DD`, a date-time with or without offset, and epoch
/// milliseconds. Dates outside [`SALE_YEARS`] are rejected.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    parse_any_date(value).filter(|d| SALE_YEARS.contains(&d.year()))
}

fn parse_any_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.date_naive()))
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                        .ok()
                        .map(|d| d.date())
                })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|d| d.date_naive()),
        _ => None,
    }
}

fn date_field(record: &Record, column: &str) -> Result<String, RowIssue> {
    match record.get(column) {
        None | Some(Value::Null) => Err(RowIssue::MissingJoinKey {
            column: column.to_string(),
        }),
        Some(value) => parse_date(value)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .ok_or_else(|| unparsable(column, value)),
    }
}

impl SaleRecord {
    /// Convert a renamed sales record
    pub fn from_record(record: &Record) -> Result<Self, RowIssue> {
        Ok(Self {
            sale_id: int_field(record, columns::SALE_ID)?,
            product_id: text_field(record, columns::PRODUCT_ID)?,
            sale_date: date_field(record, columns::SALE_DATE)?,
            quantity: int_field(record, columns::QUANTITY)?,
            sales_price: float_field(record, columns::SALES_PRICE)?,
            ingestion_timestamp: text_field(record, columns::INGESTION_TIMESTAMP)?,
        })
    }
}

impl ProductRecord {
    /// Convert a renamed product record; `None` when it has no identifier
    pub fn from_record(record: &Record) -> Result<Option<Self>, RowIssue> {
        let Some(product_id) = text_field(record, columns::PRODUCT_ID)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            product_id,
            product_name: text_field(record, columns::PRODUCT_NAME)?,
            category: text_field(record, columns::CATEGORY)?,
            product_price: float_field(record, columns::PRODUCT_PRICE)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_sale_conversion() {
        let sale = SaleRecord::from_record(&record(json!({
            "sale_id": 7,
            "product_id": "A12",
            "sale_date": "2024-03-02",
            "quantity": 2.0,
            "sales_price": "12.5",
            "ingestion_timestamp": "2024-03-09 07:05:01"
        })))
        .unwrap();
        assert_eq!(sale.sale_id, Some(7));
        assert_eq!(sale.quantity, Some(2));
        assert_eq!(sale.sales_price, Some(12.5));
        assert_eq!(sale.sale_date, "2024-03-02");
    }

    #[test]
    fn test_unparsable_quantity() {
        let issue = SaleRecord::from_record(&record(json!({
            "sale_id": 1,
            "sale_date": "2024-03-02",
            "quantity": "lots"
        })))
        .unwrap_err();
        assert_eq!(issue.kind(), "unparsable_value");
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 2);
        assert_eq!(parse_date(&json!("2024-03-02")), expected);
        assert_eq!(parse_date(&json!("2024-03-02T10:00:00")), expected);
        assert_eq!(parse_date(&json!("2024-03-02T10:00:00+00:00")), expected);
        assert_eq!(parse_date(&json!(1709373600000_i64)), expected);
        assert_eq!(parse_date(&json!("March 2nd")), None);
    }

    #[test]
    fn test_out_of_range_year_is_unparsable() {
        assert_eq!(parse_date(&json!("0000-03-01")), None);
        assert_eq!(parse_date(&json!(-62_200_000_000_000_i64)), None);
        assert_eq!(
            parse_date(&json!("9999-12-31")),
            NaiveDate::from_ymd_opt(9999, 12, 31)
        );

        let issue = SaleRecord::from_record(&record(json!({
            "sale_id": 1,
            "product_id": "A12",
            "sale_date": "0000-03-01"
        })))
        .unwrap_err();
        assert_eq!(issue.kind(), "unparsable_value");
    }

    #[test]
    fn test_product_without_id() {
        let product = ProductRecord::from_record(&record(json!({"product_name": "x"}))).unwrap();
        assert!(product.is_none());
    }
}
