//! Read-only inspection of the analytical store and the curated layer

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DataFormat;
use crate::dataset::read_curated;
use crate::error::PipelineResult;
use crate::files::discover_files;
use crate::warehouse::{ManifestRecord, PartitionRecord, Warehouse};

/// A table or view with its row count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub name: String,
    pub kind: String,
    pub rows: i64,
}

/// Contents of a store file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSummary {
    pub path: PathBuf,
    pub objects: Vec<ObjectSummary>,
    pub partitions: Vec<PartitionRecord>,
    pub manifest: Vec<ManifestRecord>,
}

/// Summarise a store without taking the write lock
pub fn inspect_store(path: &Path) -> PipelineResult<StoreSummary> {
    let warehouse = Warehouse::open_read_only(path)?;
    let mut objects = Vec::new();
    for object in warehouse.list_objects()? {
        let rows = warehouse.count_rows(&object.name)?;
        objects.push(ObjectSummary {
            name: object.name,
            kind: object.kind,
            rows,
        });
    }
    Ok(StoreSummary {
        path: path.to_path_buf(),
        objects,
        partitions: warehouse.partitions()?,
        manifest: warehouse.manifest()?,
    })
}

/// First `limit` rows of a table or view
pub fn preview(path: &Path, name: &str, limit: usize) -> PipelineResult<Vec<Value>> {
    Warehouse::open_read_only(path)?.head(name, limit)
}

/// One curated file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratedFileSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub total_amount: f64,
}

/// Curated files in a directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CuratedSummary {
    pub files: Vec<CuratedFileSummary>,
    pub rows: usize,
    /// Sum of non-null amounts
    pub total_amount: f64,
}

/// Summarise the curated files in `dir` (e.g. `data/silver/archive`)
pub fn summarize_curated(dir: &Path) -> PipelineResult<CuratedSummary> {
    let mut summary = CuratedSummary::default();
    for file in discover_files(dir, "", DataFormat::Parquet)? {
        let rows = read_curated(&file.path)?;
        let total_amount: f64 = rows.iter().filter_map(|r| r.total_amount).sum();
        summary.rows += rows.len();
        summary.total_amount += total_amount;
        summary.files.push(CuratedFileSummary {
            path: file.path,
            rows: rows.len(),
            total_amount,
        });
    }
    Ok(summary)
}
