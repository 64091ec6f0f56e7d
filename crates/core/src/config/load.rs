//! Partitioned analytical load (gold) configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{DataFormat, LogConfig, StageConfig};
use crate::error::PipelineResult;
use crate::warehouse::naming::{validate_identifier, validate_prefix};

/// Configuration of the load stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Curated input and archive directories
    pub directories: LoadDirectories,
    /// Curated file format
    pub input: LoadInput,
    /// Analytical store location
    pub database: DatabaseConfig,
    /// Table and view naming
    pub tables: TableNames,
    /// Partition maintenance
    pub load: LoadBehaviour,
    /// Reporting view settings
    pub view: ViewConfig,
    /// Log sinks
    pub logging: LogConfig,
}

/// Directories used by the load stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadDirectories {
    pub silver: PathBuf,
    /// Defaults to `<silver>/archive` when absent
    pub archive: Option<PathBuf>,
}

impl Default for LoadDirectories {
    fn default() -> Self {
        Self {
            silver: PathBuf::from("data/silver"),
            archive: None,
        }
    }
}

/// Curated input format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadInput {
    pub file_format: String,
}

impl Default for LoadInput {
    fn default() -> Self {
        Self {
            file_format: "parquet".to_string(),
        }
    }
}

/// Analytical store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/gold/sales_product.duckdb"),
        }
    }
}

/// Names of store objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    /// Staging table receiving identified rows
    pub staging: String,
    /// Partition tables are `<prefix>_<YYYY>_<MM>`
    pub partition_prefix: String,
    /// Reporting views are `<prefix>_<YYYY>`
    pub view_prefix: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            staging: "stg_sales_product".to_string(),
            partition_prefix: "sales".to_string(),
            view_prefix: "vw_sales".to_string(),
        }
    }
}

/// What to do when a month's partition table already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionPolicy {
    /// First write wins; later rows for the month stay only in staging
    Skip,
    /// Insert staging rows whose identifier is not yet in the partition
    #[default]
    AppendMissing,
}

impl std::fmt::Display for PartitionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionPolicy::Skip => write!(f, "skip"),
            PartitionPolicy::AppendMissing => write!(f, "append_missing"),
        }
    }
}

impl std::str::FromStr for PartitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(PartitionPolicy::Skip),
            "append_missing" | "append-missing" | "append" => Ok(PartitionPolicy::AppendMissing),
            _ => Err(format!(
                "Invalid partition policy: {s}. Expected: skip, append_missing"
            )),
        }
    }
}

/// Partition maintenance settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBehaviour {
    pub partition_policy: PartitionPolicy,
}

/// Reporting view settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Year to publish; the run's own year when absent
    pub year: Option<i32>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            directories: LoadDirectories::default(),
            input: LoadInput::default(),
            database: DatabaseConfig::default(),
            tables: TableNames::default(),
            load: LoadBehaviour::default(),
            view: ViewConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl LoadConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the silver directory and store below a common root
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.directories = LoadDirectories {
            silver: root.join("silver"),
            archive: None,
        };
        self.database.path = root.join("gold").join("sales_product.duckdb");
        self.logging.dir = root.join("logs");
        self
    }

    /// Set the store path
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database.path = path.into();
        self
    }

    /// Set the partition policy
    pub fn with_partition_policy(mut self, policy: PartitionPolicy) -> Self {
        self.load.partition_policy = policy;
        self
    }

    /// Set the reporting year
    pub fn with_view_year(mut self, year: i32) -> Self {
        self.view.year = Some(year);
        self
    }

    /// Archive directory for consumed curated files
    pub fn archive_dir(&self) -> PathBuf {
        self.directories
            .archive
            .clone()
            .unwrap_or_else(|| self.directories.silver.join("archive"))
    }

    /// Resolved curated format
    pub fn input_format(&self) -> PipelineResult<DataFormat> {
        DataFormat::require(&self.input.file_format, "input.file_format", DataFormat::Parquet)
    }
}

impl StageConfig for LoadConfig {
    const DEFAULT_PATH: &'static str = "configs/gold/load.yml";

    fn validate(&self) -> PipelineResult<()> {
        self.input_format()?;
        validate_identifier(&self.tables.staging)?;
        validate_prefix(&self.tables.partition_prefix)?;
        validate_prefix(&self.tables.view_prefix)?;
        Ok(())
    }

    fn logging(&self) -> &LogConfig {
        &self.logging
    }
}
