//! Partitioned analytical load: curated files → staging, monthly partitions
//! and the reporting view

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, warn};

use crate::config::LoadConfig;
use crate::context::RunContext;
use crate::dataset::{CuratedRow, columns, read_curated};
use crate::error::{PipelineError, PipelineResult};
use crate::files::{ArchiveEntry, DiscoveredFile, archive_files, discover_files};
use crate::warehouse::{ManifestRecord, PartitionAction, ViewOutcome, Warehouse};

/// A curated file appended during this run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub content_hash: String,
    pub rows: usize,
    /// Identifier range, absent for an empty file
    pub first_id: Option<i64>,
    pub last_id: Option<i64>,
}

/// Outcome of a load run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub loaded: Vec<LoadedFile>,
    /// Files whose content was persisted by an earlier run
    pub already_loaded: Vec<PathBuf>,
    pub rows_appended: usize,
    pub previous_max_id: i64,
    pub date_column_converted: bool,
    pub partitions: Vec<PartitionAction>,
    pub view: Option<ViewOutcome>,
    /// Set when the view rebuild failed; persisted data stands regardless
    pub view_error: Option<String>,
    pub archived: Vec<ArchiveEntry>,
}

impl LoadReport {
    /// First and last identifier assigned in this run
    pub fn id_range(&self) -> Option<(i64, i64)> {
        let first = self.loaded.iter().filter_map(|f| f.first_id).min()?;
        let last = self.loaded.iter().filter_map(|f| f.last_id).max()?;
        Some((first, last))
    }
}

struct PendingFile {
    file: DiscoveredFile,
    hash: String,
    rows: Vec<CuratedRow>,
}

/// Assigns identifiers, maintains monthly partitions and rebuilds the view
pub struct LoadStage {
    config: LoadConfig,
}

impl LoadStage {
    pub fn new(config: LoadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Curated files waiting in the silver directory
    pub fn discover(&self) -> PipelineResult<Vec<DiscoveredFile>> {
        discover_files(
            &self.config.directories.silver,
            "",
            self.config.input_format()?,
        )
    }

    /// Run one load
    ///
    /// Everything up to partition maintenance commits in one transaction;
    /// a failure there leaves the store and the curated files as they were.
    /// A view failure is logged and reported. Archiving runs last.
    pub fn run(&self, ctx: &RunContext) -> PipelineResult<LoadReport> {
        let _span = info_span!("load", run_id = %ctx.run_id).entered();
        let silver = &self.config.directories.silver;
        let tables = &self.config.tables;

        let files = self.discover()?;
        if files.is_empty() {
            error!(dir = %silver.display(), "No curated files found");
            return Err(PipelineError::missing_files(silver, "no curated files"));
        }
        info!(count = files.len(), "Loading curated files");

        let mut pending = Vec::with_capacity(files.len());
        for mut file in files {
            let hash = file.compute_hash()?.to_string();
            let rows = read_curated(&file.path)?;
            pending.push(PendingFile { file, hash, rows });
        }

        let mut warehouse = Warehouse::open(&self.config.database.path)?;
        let mut report = LoadReport::default();

        let mut seen = HashSet::new();
        let mut fresh = Vec::new();
        for p in pending {
            let persisted = warehouse.manifest_entry(&p.hash)?;
            if persisted.is_some() || !seen.insert(p.hash.clone()) {
                warn!(file = %p.file.path.display(), "Curated file already loaded; archiving only");
                report.already_loaded.push(p.file.path.clone());
            } else {
                fresh.push(p);
            }
        }

        let tx = warehouse.begin()?;
        tx.ensure_staging(&tables.staging)?;
        report.previous_max_id = tx.max_id(&tables.staging)?;
        let mut next_id = report.previous_max_id + 1;

        for p in &fresh {
            let file_name = p.file.file_name();
            let appended = tx.append_rows(&tables.staging, next_id, &p.rows, &file_name)?;
            let (first_id, last_id) = if appended == 0 {
                (None, None)
            } else {
                (Some(next_id), Some(next_id + appended as i64 - 1))
            };
            tx.record_manifest(&ManifestRecord {
                file_name,
                content_hash: p.hash.clone(),
                run_id: ctx.run_id.to_string(),
                loaded_at: ctx.ingestion_stamp(),
                first_id,
                last_id,
                row_count: appended as i64,
            })?;
            info!(file = %p.file.path.display(), rows = appended, first_id = ?first_id, "Appended to staging");
            next_id += appended as i64;
            report.rows_appended += appended;
            report.loaded.push(LoadedFile {
                path: p.file.path.clone(),
                content_hash: p.hash.clone(),
                rows: appended,
                first_id,
                last_id,
            });
        }

        report.date_column_converted =
            tx.normalize_date_column(&tables.staging, columns::SALE_DATE)?;

        for key in tx.partition_keys(&tables.staging, columns::SALE_DATE)? {
            let action = tx.ensure_partition(
                &tables.staging,
                columns::SALE_DATE,
                &tables.partition_prefix,
                key,
                self.config.load.partition_policy,
                &ctx.ingestion_stamp(),
            )?;
            report.partitions.push(action);
        }
        tx.commit()?;
        info!(rows = report.rows_appended, id_range = ?report.id_range(), "Committed load");

        let year = self.config.view.year.unwrap_or_else(|| ctx.reporting_year());
        match warehouse.rebuild_view(&tables.view_prefix, year) {
            Ok(outcome) => report.view = Some(outcome),
            Err(e) => {
                error!(year, error = %e, "Reporting view rebuild failed");
                report.view_error = Some(e.to_string());
            }
        }
        drop(warehouse);

        let consumed: Vec<PathBuf> = fresh
            .iter()
            .map(|p| p.file.path.clone())
            .chain(report.already_loaded.iter().cloned())
            .collect();
        report.archived = archive_files(&consumed, &self.config.archive_dir(), &ctx.file_stamp())?;

        info!(archived = report.archived.len(), "Load complete");
        Ok(report)
    }
}
