//! In-memory datasets and their on-disk formats
//!
//! Raw extracts and bronze snapshots are loosely typed [`Table`]s of JSON
//! records; the curated layer is strongly typed ([`CuratedRow`]) and stored as
//! Parquet.

mod curated;
mod table;

pub use curated::{CuratedRow, curated_schema, read_curated, write_curated};
pub use table::{Record, Table, is_null, value_key};

use serde::{Deserialize, Serialize};

/// Column names shared across stages
pub mod columns {
    pub const SALE_ID: &str = "sale_id";
    pub const PRODUCT_ID: &str = "product_id";
    pub const SALE_DATE: &str = "sale_date";
    pub const QUANTITY: &str = "quantity";
    pub const PRICE: &str = "price";
    pub const SALES_PRICE: &str = "sales_price";
    pub const PRODUCT_PRICE: &str = "product_price";
    pub const PRODUCT_NAME: &str = "product_name";
    pub const CATEGORY: &str = "category";
    pub const INGESTION_TIMESTAMP: &str = "ingestion_timestamp";
    pub const TOTAL_AMOUNT: &str = "total_amount";
}

/// Kinds of extract handled by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Sales,
    Product,
}

impl DataKind {
    /// Both kinds, sales first
    pub const ALL: [DataKind; 2] = [DataKind::Sales, DataKind::Product];

    /// Human-readable dataset label used in logs and errors
    pub fn dataset_name(&self) -> &'static str {
        match self {
            DataKind::Sales => "sales data",
            DataKind::Product => "product data",
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataKind::Sales => write!(f, "sales"),
            DataKind::Product => write!(f, "product"),
        }
    }
}
