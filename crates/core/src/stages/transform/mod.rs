//! Validated enrichment: bronze snapshots → one curated file per run

mod checks;
mod join;
mod typed;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::config::{TransformConfig, pattern_prefix};
use crate::context::RunContext;
use crate::dataset::{DataKind, Table, columns, write_curated};
use crate::error::{PipelineError, PipelineResult};
use crate::files::{ArchiveEntry, DiscoveredFile, archive_files, discover_files, ensure_dirs};
use crate::validation::ValidationReport;

pub use join::{JoinedRow, left_join};
pub use typed::{ProductRecord, SaleRecord, parse_date};

/// Outcome of a transformation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformReport {
    pub sales_rows_in: usize,
    pub product_rows_in: usize,
    pub rows_out: usize,
    pub output: PathBuf,
    pub validation: ValidationReport,
    pub archived: Vec<ArchiveEntry>,
}

/// Cleans sales, joins them to products and writes the curated file
pub struct TransformStage {
    config: TransformConfig,
}

impl TransformStage {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Snapshots of a kind waiting in the bronze directory
    pub fn discover(&self, kind: DataKind) -> PipelineResult<Vec<DiscoveredFile>> {
        discover_files(
            &self.config.directories.bronze,
            pattern_prefix(self.config.file_patterns.get(kind)),
            self.config.input_format()?,
        )
    }

    fn read_kind(&self, kind: DataKind, files: &[DiscoveredFile]) -> PipelineResult<Table> {
        let paths: Vec<&PathBuf> = files.iter().map(|f| &f.path).collect();
        let table = Table::read_json_many(&paths)?;
        info!(kind = %kind, files = files.len(), rows = table.len(), "Read snapshots");
        table.require_columns(self.config.expected(kind), kind.dataset_name())?;
        Ok(table)
    }

    /// Run one transformation
    pub fn run(&self, ctx: &RunContext) -> PipelineResult<TransformReport> {
        let _span = info_span!("transform", run_id = %ctx.run_id).entered();
        let dirs = &self.config.directories;
        let output_format = self.config.output_format()?;
        checks::check_supported(&self.config.validation)?;
        if self.config.join.key != columns::PRODUCT_ID {
            return Err(PipelineError::ConfigInvalid(format!(
                "join.key must be '{}', got '{}'",
                columns::PRODUCT_ID,
                self.config.join.key
            )));
        }
        ensure_dirs(&[&dirs.bronze, &dirs.silver, &dirs.archive])?;

        let sales_files = self.discover(DataKind::Sales)?;
        let product_files = self.discover(DataKind::Product)?;
        let mut missing = Vec::new();
        if sales_files.is_empty() {
            missing.push("no sales snapshots");
        }
        if product_files.is_empty() {
            missing.push("no product snapshots");
        }
        if !missing.is_empty() {
            return Err(PipelineError::missing_files(&dirs.bronze, missing.join(", ")));
        }

        let mut sales = self.read_kind(DataKind::Sales, &sales_files)?;
        let mut products = self.read_kind(DataKind::Product, &product_files)?;
        let sales_rows_in = sales.len();
        let product_rows_in = products.len();

        let mut report = ValidationReport::new();
        checks::drop_missing(
            &mut sales,
            &self.config.validation.drop_missing,
            DataKind::Sales,
            &mut report,
        );

        sales.rename_column(columns::PRICE, columns::SALES_PRICE);
        products.rename_column(columns::PRICE, columns::PRODUCT_PRICE);
        products.drop_column(columns::INGESTION_TIMESTAMP);

        let typed_sales = checks::typed_sales(&sales, &mut report);
        let typed_products = checks::typed_products(&products, &mut report);

        info!(sales = typed_sales.len(), products = typed_products.len(), "Joining sales and product data");
        let joined = left_join(typed_sales, &typed_products);
        let rows = checks::check_joined(
            joined,
            &self.config.validation,
            checks::product_distinct(&products),
            &mut report,
        );

        let output = dirs.silver.join(self.config.output_file_name(&ctx.file_stamp()));
        if output.extension().and_then(|e| e.to_str()) != Some(output_format.extension()) {
            warn!(output = %output.display(), "Output name does not carry the configured extension");
        }
        if rows.is_empty() {
            warn!("No rows survived validation; writing an empty curated file");
        }
        write_curated(&output, &rows)?;
        info!(rows = rows.len(), output = %output.display(), "Wrote curated file");

        let consumed: Vec<&PathBuf> = sales_files
            .iter()
            .chain(product_files.iter())
            .map(|f| &f.path)
            .collect();
        let archived = archive_files(&consumed, &dirs.archive, &ctx.file_stamp())?;

        info!(
            rows_in = sales_rows_in,
            rows_out = rows.len(),
            dropped = report.dropped_count(),
            "Transformation complete"
        );
        Ok(TransformReport {
            sales_rows_in,
            product_rows_in,
            rows_out: rows.len(),
            output,
            validation: report,
            archived,
        })
    }
}
