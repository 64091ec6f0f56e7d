//! Raw ingestion: input extracts → bronze snapshots

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, info_span};

use crate::config::{IngestionConfig, pattern_prefix};
use crate::context::RunContext;
use crate::dataset::{DataKind, Table, columns};
use crate::error::{PipelineError, PipelineResult};
use crate::files::{ArchiveEntry, DiscoveredFile, archive_files, discover_files, ensure_dirs};

/// Snapshot written for one kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindSnapshot {
    pub kind: DataKind,
    pub files: Vec<PathBuf>,
    pub rows: usize,
    pub output: PathBuf,
}

/// Outcome of an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    pub ingestion_timestamp: String,
    pub snapshots: Vec<KindSnapshot>,
    pub archived: Vec<ArchiveEntry>,
}

impl IngestionReport {
    /// Rows written for a kind
    pub fn rows(&self, kind: DataKind) -> usize {
        self.snapshots
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.rows)
            .sum()
    }
}

/// Discovers raw extracts by kind, validates them, writes one snapshot per
/// kind and archives the inputs
pub struct IngestionStage {
    config: IngestionConfig,
}

impl IngestionStage {
    pub fn new(config: IngestionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Files of each kind currently waiting in the input directory
    pub fn discover(&self) -> PipelineResult<Vec<(DataKind, Vec<DiscoveredFile>)>> {
        let dirs = &self.config.directories;
        let mut groups = Vec::with_capacity(DataKind::ALL.len());
        for kind in DataKind::ALL {
            let prefix = pattern_prefix(self.config.expected_formats.get(kind));
            let files = discover_files(&dirs.input, prefix, self.config.input_format(kind)?)?;
            let bytes: u64 = files.iter().map(|f| f.size).sum();
            info!(kind = %kind, count = files.len(), bytes, "Discovered input files");
            groups.push((kind, files));
        }
        Ok(groups)
    }

    /// Run one ingestion
    ///
    /// Order of side effects: validate, write snapshots, archive inputs. Any
    /// failure before the writes leaves the input directory untouched.
    pub fn run(&self, ctx: &RunContext) -> PipelineResult<IngestionReport> {
        let _span = info_span!("ingest", run_id = %ctx.run_id).entered();
        let dirs = &self.config.directories;
        let bronze_format = self.config.bronze_format()?;
        ensure_dirs(&[&dirs.input, &dirs.bronze, &dirs.archive])?;

        let groups = self.discover()?;
        let missing: Vec<String> = groups
            .iter()
            .filter(|(_, files)| files.is_empty())
            .map(|(kind, _)| format!("no {kind} files"))
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::missing_files(&dirs.input, missing.join(", ")));
        }

        let mut tables = Vec::with_capacity(groups.len());
        for (kind, files) in &groups {
            let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
            let table = Table::read_json_many(&paths)?;
            info!(kind = %kind, files = paths.len(), rows = table.len(), "Combined input files");
            tables.push((*kind, paths, table));
        }

        for (kind, _, table) in &tables {
            table.require_columns(
                self.config.validation.required_columns.get(*kind),
                kind.dataset_name(),
            )?;
        }

        let stamp = ctx.ingestion_stamp();
        let mut snapshots = Vec::with_capacity(tables.len());
        for (kind, files, mut table) in tables {
            table.stamp(columns::INGESTION_TIMESTAMP, Value::String(stamp.clone()));
            let output = dirs.bronze.join(format!(
                "{}_{}.{}",
                self.config.output_prefix(kind),
                ctx.file_stamp(),
                bronze_format.extension()
            ));
            table.write_json(&output)?;
            info!(kind = %kind, rows = table.len(), output = %output.display(), "Wrote bronze snapshot");
            snapshots.push(KindSnapshot {
                kind,
                files,
                rows: table.len(),
                output,
            });
        }

        let consumed: Vec<&PathBuf> = snapshots.iter().flat_map(|s| s.files.iter()).collect();
        let archived = archive_files(&consumed, &dirs.archive, &ctx.file_stamp())?;

        info!(archived = archived.len(), "Ingestion complete");
        Ok(IngestionReport {
            ingestion_timestamp: stamp,
            snapshots,
            archived,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &std::path::Path, name: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), body).unwrap();
    }

    const SALES: &str = r#"[{"sale_id": 1, "product_id": "A12", "sale_date": "2024-03-02", "quantity": 2, "price": 12.0}]"#;
    const PRODUCTS: &str = r#"[{"product_id": "A12", "product_name": "Widget A", "category": "Widgets", "price": 15.5}]"#;

    #[test]
    fn test_ingest_concatenates_and_archives() {
        let root = TempDir::new().unwrap();
        let config = IngestionConfig::new().with_root(root.path());
        let input = config.directories.input.clone();
        write(&input, "sales_data_1.json", SALES);
        write(
            &input,
            "sales_data_2.json",
            r#"[{"sale_id": 2, "product_id": "B23", "sale_date": "2024-03-03", "quantity": 1, "price": 20.0},
                {"sale_id": 3, "product_id": null, "sale_date": null, "quantity": 4, "price": 11.0}]"#,
        );
        write(&input, "product_data_1.json", PRODUCTS);

        let ctx = RunContext::from_ymd_hms(2024, 3, 9, 7, 5, 1);
        let report = IngestionStage::new(config.clone()).run(&ctx).unwrap();

        assert_eq!(report.rows(DataKind::Sales), 3);
        assert_eq!(report.rows(DataKind::Product), 1);
        assert_eq!(report.archived.len(), 3);
        assert!(!input.join("sales_data_1.json").exists());
        assert!(
            config
                .directories
                .archive
                .join("sales_data_1_2024-03-09_07-05-01.json")
                .exists()
        );

        let bronze = config
            .directories
            .bronze
            .join("sales_data_bronze_2024-03-09_07-05-01.json");
        let table = Table::read_json(&bronze).unwrap();
        assert_eq!(table.len(), 3);
        assert!(
            table
                .rows()
                .iter()
                .all(|r| r[columns::INGESTION_TIMESTAMP] == "2024-03-09 07:05:01")
        );
    }

    #[test]
    fn test_missing_product_files_has_no_side_effects() {
        let root = TempDir::new().unwrap();
        let config = IngestionConfig::new().with_root(root.path());
        write(&config.directories.input, "sales_data_1.json", SALES);

        let err = IngestionStage::new(config.clone())
            .run(&RunContext::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingRequiredFiles { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(config.directories.input.join("sales_data_1.json").exists());
        assert_eq!(fs::read_dir(&config.directories.bronze).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_columns_aborts_before_write() {
        let root = TempDir::new().unwrap();
        let config = IngestionConfig::new().with_root(root.path());
        write(&config.directories.input, "sales_data_1.json", SALES);
        write(
            &config.directories.input,
            "product_data_1.json",
            r#"[{"product_id": "A12", "product_name": "Widget A"}]"#,
        );

        let err = IngestionStage::new(config.clone())
            .run(&RunContext::new())
            .unwrap_err();
        match err {
            PipelineError::MissingColumns { dataset, columns } => {
                assert_eq!(dataset, "product data");
                assert_eq!(columns, vec!["category".to_string(), "price".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_dir(&config.directories.bronze).unwrap().count(), 0);
        assert!(config.directories.input.join("product_data_1.json").exists());
    }
}
