//! Integration tests for the full pipeline
//!
//! Tests the complete workflow: raw extracts → bronze → silver → gold

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use lakehouse_core::dataset::read_curated;
use lakehouse_core::generator::generate;
use lakehouse_core::pipeline::StageOutput;
use lakehouse_core::warehouse::{PartitionAction, ViewOutcome};
use lakehouse_core::{
    GeneratorConfig, IngestionStage, LoadConfig, LoadStage, PipelineConfig, PipelineExecutor, PipelineStage,
    RunContext, StageOutcome, TransformStage, Warehouse,
};

/// Helper to write a JSON array file
fn write_json(path: &Path, value: serde_json::Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

/// Three sales (missing product, negative quantity, valid) and one product
fn write_scenario_extracts(input: &Path, suffix: &str) {
    write_json(
        &input.join(format!("sales_data_{suffix}.json")),
        json!([
            {"sale_id": 1, "product_id": null, "sale_date": "2024-03-05", "quantity": 1, "price": 12.0},
            {"sale_id": 2, "product_id": "A12", "sale_date": "2024-03-06", "quantity": -1, "price": 12.0},
            {"sale_id": 3, "product_id": "A12", "sale_date": "2024-03-07", "quantity": 2, "price": 14.0}
        ]),
    );
    write_json(
        &input.join(format!("product_data_{suffix}.json")),
        json!([
            {"product_id": "A12", "product_name": "Widget A", "category": "Widgets", "price": 15.5}
        ]),
    );
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

#[test]
fn test_stages_end_to_end() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::new().with_root(root.path());
    let config = PipelineConfig {
        load: config.load.clone().with_view_year(2024),
        ..config
    };
    write_scenario_extracts(&config.ingestion.directories.input, "20240310");
    let ctx = RunContext::from_ymd_hms(2024, 3, 10, 9, 0, 0);

    let ingested = IngestionStage::new(config.ingestion.clone()).run(&ctx).unwrap();
    assert_eq!(ingested.archived.len(), 2);
    assert!(files_in(&config.ingestion.directories.input).is_empty());

    let transformed = TransformStage::new(config.transform.clone()).run(&ctx).unwrap();
    assert_eq!(transformed.rows_out, 1);
    assert_eq!(transformed.validation.dropped_count(), 2);
    let curated = read_curated(&transformed.output).unwrap();
    assert_eq!(curated[0].sale_id, 3);
    assert_eq!(curated[0].total_amount, Some(31.0));

    let loaded = LoadStage::new(config.load.clone()).run(&ctx).unwrap();
    assert_eq!(loaded.id_range(), Some((1, 1)));
    assert_eq!(
        loaded.partitions,
        vec![PartitionAction::Created {
            table: "sales_2024_03".to_string(),
            rows: 1
        }]
    );
    assert_eq!(
        loaded.view,
        Some(ViewOutcome::Rebuilt {
            view: "vw_sales_2024".to_string(),
            partitions: vec!["sales_2024_03".to_string()],
            rows: 1
        })
    );

    let warehouse = Warehouse::open(&config.load.database.path).unwrap();
    let rows = warehouse.query("SELECT id, total_amount FROM vw_sales_2024").unwrap();
    assert_eq!(rows, vec![json!({"id": 1, "total_amount": 31.0})]);
}

#[test]
fn test_second_load_continues_identifiers() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::new().with_root(root.path());
    let load = config.load.clone();

    let mut rows: Vec<_> = (1..=5).map(|i| curated_row(i, "2024-01-15")).collect();
    write_curated_file(&load, "batch_1.parquet", &rows);
    LoadStage::new(load.clone())
        .run(&RunContext::from_ymd_hms(2024, 2, 1, 0, 0, 0))
        .unwrap();

    rows = vec![curated_row(6, "2024-02-01"), curated_row(7, "2024-02-02")];
    write_curated_file(&load, "batch_2.parquet", &rows);
    let report = LoadStage::new(load.clone())
        .run(&RunContext::from_ymd_hms(2024, 2, 2, 0, 0, 0))
        .unwrap();

    assert_eq!(report.previous_max_id, 5);
    assert_eq!(
        report.loaded.iter().map(|f| (f.first_id, f.last_id)).collect::<Vec<_>>(),
        vec![(Some(6), Some(7))]
    );

    let warehouse = Warehouse::open(&load.database.path).unwrap();
    assert_eq!(warehouse.max_id("stg_sales_product").unwrap(), 7);
    assert_eq!(warehouse.count_rows("sales_2024_01").unwrap(), 5);
    assert_eq!(warehouse.count_rows("sales_2024_02").unwrap(), 2);
    assert_eq!(warehouse.manifest().unwrap().len(), 2);
}

#[test]
fn test_executor_runs_all_stages() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::new().with_root(root.path());
    write_scenario_extracts(&config.ingestion.directories.input, "a");
    let silver_archive = config.load.archive_dir();

    let report = PipelineExecutor::new(config).run(&RunContext::from_ymd_hms(2024, 3, 10, 9, 0, 0));

    assert!(report.is_success());
    assert_eq!(report.exit_code(), 0);
    for stage in PipelineStage::all() {
        assert!(matches!(
            report.outcome(stage),
            Some(StageOutcome::Completed { .. })
        ));
    }
    match report.outcome(PipelineStage::Load) {
        Some(StageOutcome::Completed { output, .. }) => match output.as_ref() {
            StageOutput::Load(load) => assert_eq!(load.rows_appended, 1),
            other => panic!("unexpected output {other:?}"),
        },
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(files_in(&silver_archive).len(), 1);
}

#[test]
fn test_executor_picks_up_leftovers_without_new_input() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::new().with_root(root.path());
    write_curated_file(&config.load, "leftover.parquet", &[curated_row(1, "2024-05-01")]);

    let report = PipelineExecutor::new(config).run(&RunContext::from_ymd_hms(2024, 5, 2, 0, 0, 0));

    assert!(matches!(
        report.outcome(PipelineStage::Ingest),
        Some(StageOutcome::Failed { exit_code: 1, .. })
    ));
    assert!(matches!(
        report.outcome(PipelineStage::Transform),
        Some(StageOutcome::Skipped { .. })
    ));
    assert!(matches!(
        report.outcome(PipelineStage::Load),
        Some(StageOutcome::Completed { .. })
    ));
}

#[test]
fn test_consecutive_ticks_do_not_duplicate_rows() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::new().with_root(root.path());
    let db = config.load.database.path.clone();
    write_scenario_extracts(&config.ingestion.directories.input, "a");

    let executor = PipelineExecutor::new(config);
    executor.run(&RunContext::from_ymd_hms(2024, 3, 10, 9, 0, 0));
    let second = executor.run(&RunContext::from_ymd_hms(2024, 3, 10, 9, 2, 0));

    assert!(matches!(
        second.outcome(PipelineStage::Load),
        Some(StageOutcome::Skipped { .. })
    ));
    let warehouse = Warehouse::open(&db).unwrap();
    assert_eq!(warehouse.count_rows("stg_sales_product").unwrap(), 1);
}

#[test]
fn test_tick_keeps_every_generated_extract() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::new().with_root(root.path());
    let db = config.load.database.path.clone();
    let generator = GeneratorConfig {
        output_dir: config.ingestion.directories.input.clone(),
        sales_rows: 5,
        missing_product_rate: 0.0,
        missing_date_rate: 0.0,
    };
    generate(&generator, &RunContext::from_ymd_hms(2024, 6, 1, 12, 0, 0)).unwrap();
    generate(&generator, &RunContext::from_ymd_hms(2024, 6, 1, 12, 1, 0)).unwrap();

    let report =
        PipelineExecutor::new(config).run(&RunContext::from_ymd_hms(2024, 6, 1, 12, 2, 0));
    assert!(report.is_success());

    let warehouse = Warehouse::open(&db).unwrap();
    assert_eq!(warehouse.count_rows("stg_sales_product").unwrap(), 10);
}

#[test]
fn test_out_of_range_date_drops_only_its_row() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::new().with_root(root.path());
    let input = config.ingestion.directories.input.clone();
    let silver = config.load.directories.silver.clone();
    let db = config.load.database.path.clone();
    write_json(
        &input.join("sales_data_a.json"),
        json!([
            {"sale_id": 1, "product_id": "A12", "sale_date": "0000-03-01", "quantity": 1, "price": 15.5},
            {"sale_id": 2, "product_id": "A12", "sale_date": "2024-03-01", "quantity": 2, "price": 15.5}
        ]),
    );
    write_json(
        &input.join("product_data_a.json"),
        json!([
            {"product_id": "A12", "product_name": "Widget A", "category": "Widgets", "price": 15.5}
        ]),
    );

    let report =
        PipelineExecutor::new(config).run(&RunContext::from_ymd_hms(2024, 3, 9, 7, 0, 0));

    assert!(report.is_success());
    match report.outcome(PipelineStage::Transform) {
        Some(StageOutcome::Completed { output, .. }) => match output.as_ref() {
            StageOutput::Transform(transform) => {
                assert_eq!(transform.rows_out, 1);
                assert_eq!(transform.validation.dropped_count(), 1);
            }
            other => panic!("unexpected output {other:?}"),
        },
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(files_in(&silver).is_empty());
    let warehouse = Warehouse::open(&db).unwrap();
    assert_eq!(warehouse.count_rows("sales_2024_03").unwrap(), 1);
}

fn curated_row(sale_id: i64, sale_date: &str) -> lakehouse_core::CuratedRow {
    lakehouse_core::CuratedRow {
        sale_id,
        product_id: Some("B23".to_string()),
        sale_date: sale_date.to_string(),
        quantity: Some(1),
        sales_price: Some(24.0),
        ingestion_timestamp: Some("2024-01-31 12:00:00".to_string()),
        product_name: Some("Widget B".to_string()),
        category: Some("Widgets".to_string()),
        product_price: Some(25.0),
        total_amount: Some(25.0),
    }
}

fn write_curated_file(config: &LoadConfig, name: &str, rows: &[lakehouse_core::CuratedRow]) {
    fs::create_dir_all(&config.directories.silver).unwrap();
    lakehouse_core::dataset::write_curated(&config.directories.silver.join(name), rows).unwrap();
}
