//! Analytical store (gold layer)
//!
//! An embedded DuckDB file holding the staging table, one table per populated
//! calendar month, one reporting view per published year, and two bookkeeping
//! tables: the partition registry and the load manifest.

mod db;
pub mod naming;
mod schema;

pub use db::{
    LoadTransaction, ManifestRecord, PartitionAction, PartitionRecord, StoreObject, ViewOutcome,
    Warehouse,
};
pub use naming::PartitionKey;
pub use schema::{MANIFEST_TABLE, PARTITIONS_TABLE};
