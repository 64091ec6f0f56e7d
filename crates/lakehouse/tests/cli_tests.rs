//! Integration tests for the lakehouse binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn lakehouse(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lakehouse"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run lakehouse")
}

fn write_configs(root: &Path) {
    fs::create_dir_all(root.join("configs/bronze")).unwrap();
    fs::create_dir_all(root.join("configs/silver")).unwrap();
    fs::create_dir_all(root.join("configs/gold")).unwrap();
    fs::write(
        root.join("configs/bronze/ingestion.yml"),
        "directories:\n  input: data/input\n  bronze: data/bronze\n  archive: data/input/archive\n",
    )
    .unwrap();
    fs::write(
        root.join("configs/silver/transform.yml"),
        "directories:\n  bronze: data/bronze\n  silver: data/silver\n  archive: data/bronze/archive\n",
    )
    .unwrap();
    fs::write(
        root.join("configs/gold/load.yml"),
        "directories:\n  silver: data/silver\ndatabase:\n  path: data/gold/sales_product.duckdb\nview:\n  year: 2024\n",
    )
    .unwrap();
}

#[test]
fn test_ingest_without_input_exits_with_one() {
    let root = TempDir::new().unwrap();
    write_configs(root.path());

    let output = lakehouse(&["ingest"], root.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Missing required files"));
    assert!(root.path().join("logs/ingestion").is_dir());
}

#[test]
fn test_missing_config_exits_with_two() {
    let root = TempDir::new().unwrap();
    let output = lakehouse(&["load", "--config", "absent.yml"], root.path());
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.yml"));
}

#[test]
fn test_generate_then_run() {
    let root = TempDir::new().unwrap();
    write_configs(root.path());

    let output = lakehouse(&["generate", "--rows", "20"], root.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = lakehouse(&["run", "--stages", "ingest,transform"], root.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_dir(root.path().join("data/silver"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "parquet"))
            .count(),
        1
    );
}

#[test]
fn test_inspect_curated_json() {
    let root = TempDir::new().unwrap();
    let output = lakehouse(
        &["inspect", "curated", "--dir", "nothing-here", "--json"],
        root.path(),
    );
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["rows"], 0);
}
