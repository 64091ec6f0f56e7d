//! Batch stages
//!
//! - [`IngestionStage`]: raw extracts → bronze snapshots
//! - [`TransformStage`]: bronze snapshots → validated curated file in silver
//! - [`LoadStage`]: curated files → staging table, monthly partitions and the
//!   yearly view in the analytical store
//!
//! Each stage is a plain synchronous call taking a [`crate::RunContext`] and
//! returning a report; inputs are archived only after the stage's writes
//! succeeded.

mod ingest;
mod load;
mod transform;

pub use ingest::{IngestionReport, IngestionStage, KindSnapshot};
pub use load::{LoadReport, LoadStage, LoadedFile};
pub use transform::{
    JoinedRow, ProductRecord, SaleRecord, TransformReport, TransformStage, left_join, parse_date,
};
