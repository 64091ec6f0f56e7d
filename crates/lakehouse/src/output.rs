//! Output formatting for CLI

use lakehouse_core::inspect::{CuratedSummary, StoreSummary};
use lakehouse_core::pipeline::{PipelineReport, StageOutcome, StageOutput};
use lakehouse_core::warehouse::{PartitionAction, ViewOutcome};
use lakehouse_core::{IngestionReport, LoadReport, TransformReport};
use serde::Serialize;

use crate::error::CliError;

/// Print any report as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_ingestion(report: &IngestionReport) {
    eprintln!("Ingestion");
    eprintln!("=========");
    eprintln!("Timestamp: {}", report.ingestion_timestamp);
    for snapshot in &report.snapshots {
        eprintln!(
            "  {:<8} {} file(s), {} row(s) -> {}",
            snapshot.kind.to_string(),
            snapshot.files.len(),
            snapshot.rows,
            snapshot.output.display()
        );
    }
    eprintln!("Archived:  {} file(s)", report.archived.len());
}

pub fn print_transform(report: &TransformReport) {
    eprintln!("Transformation");
    eprintln!("==============");
    eprintln!("Sales rows in:    {}", report.sales_rows_in);
    eprintln!("Product rows in:  {}", report.product_rows_in);
    eprintln!("Rows out:         {}", report.rows_out);
    eprintln!("Output:           {}", report.output.display());

    let counts = report.validation.counts();
    if counts.is_empty() {
        eprintln!("Dropped rows:     0");
    } else {
        eprintln!("Dropped rows:     {}", report.validation.dropped_count());
        for (kind, count) in counts {
            eprintln!("  - {kind}: {count}");
        }
    }
    for warning in &report.validation.warnings {
        eprintln!("Warning: {warning}");
    }
    eprintln!("Archived:         {} file(s)", report.archived.len());
}

pub fn print_load(report: &LoadReport) {
    eprintln!("Load");
    eprintln!("====");
    eprintln!("Files loaded:     {}", report.loaded.len());
    if !report.already_loaded.is_empty() {
        eprintln!("Already loaded:   {}", report.already_loaded.len());
    }
    eprintln!("Rows appended:    {}", report.rows_appended);
    if let Some((first, last)) = report.id_range() {
        eprintln!("Identifiers:      {first}..={last}");
    }
    if report.date_column_converted {
        eprintln!("Date column converted to DATE");
    }
    for action in &report.partitions {
        let detail = match action {
            PartitionAction::Created { table, rows } => format!("{table}: created ({rows} rows)"),
            PartitionAction::Appended { table, rows } => format!("{table}: appended {rows} rows"),
            PartitionAction::UpToDate { table } => format!("{table}: up to date"),
            PartitionAction::Skipped { table } => format!("{table}: exists, skipped"),
        };
        eprintln!("  - {detail}");
    }
    match (&report.view, &report.view_error) {
        (Some(ViewOutcome::Rebuilt { view, rows, .. }), _) => {
            eprintln!("View:             {view} ({rows} rows)")
        }
        (Some(ViewOutcome::NoPartitions { view }), _) => {
            eprintln!("View:             {view} unchanged (no partitions)")
        }
        (None, Some(error)) => eprintln!("View failed:      {error}"),
        (None, None) => {}
    }
    eprintln!("Archived:         {} file(s)", report.archived.len());
}

pub fn print_pipeline(report: &PipelineReport) {
    eprintln!("Pipeline Run: {}", report.run_id);
    eprintln!("Duration:     {}", report.duration_formatted());
    eprintln!();
    for record in &report.stages {
        match &record.outcome {
            StageOutcome::Completed { output, duration_ms } => {
                eprintln!("[{}] completed ({duration_ms}ms)", record.stage);
                match output.as_ref() {
                    StageOutput::Ingest(r) => print_ingestion(r),
                    StageOutput::Transform(r) => print_transform(r),
                    StageOutput::Load(r) => print_load(r),
                }
                eprintln!();
            }
            StageOutcome::Skipped { reason } => {
                eprintln!("[{}] skipped: {reason}", record.stage);
            }
            StageOutcome::Failed { error, .. } => {
                eprintln!("[{}] failed: {error}", record.stage);
            }
        }
    }
}

pub fn print_store(summary: &StoreSummary) {
    eprintln!("Store: {}", summary.path.display());
    eprintln!();
    eprintln!("{:<32} {:<6} {:>10}", "NAME", "KIND", "ROWS");
    for object in &summary.objects {
        eprintln!("{:<32} {:<6} {:>10}", object.name, object.kind, object.rows);
    }
    eprintln!();
    eprintln!("Partitions: {}", summary.partitions.len());
    for partition in &summary.partitions {
        eprintln!(
            "  - {} ({}-{:02}, created {})",
            partition.table_name, partition.year, partition.month, partition.created_at
        );
    }
    eprintln!("Loaded files: {}", summary.manifest.len());
    for entry in &summary.manifest {
        let range = match (entry.first_id, entry.last_id) {
            (Some(first), Some(last)) => format!("{first}..={last}"),
            _ => "empty".to_string(),
        };
        eprintln!(
            "  - {} at {} ids {range} ({} rows)",
            entry.file_name, entry.loaded_at, entry.row_count
        );
    }
}

pub fn print_curated(summary: &CuratedSummary) {
    eprintln!("Curated files: {}", summary.files.len());
    for file in &summary.files {
        eprintln!(
            "  - {} ({} rows, total {:.2})",
            file.path.display(),
            file.rows,
            file.total_amount
        );
    }
    eprintln!("Rows:          {}", summary.rows);
    eprintln!("Total amount:  {:.2}", summary.total_amount);
}
