//! Validated enrichment (silver) configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ingestion::KindMap;
use super::{DataFormat, LogConfig, StageConfig, require_non_empty};
use crate::dataset::DataKind;
use crate::error::{PipelineError, PipelineResult};

/// Configuration of the transformation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Bronze, silver and archive directories
    pub directories: TransformDirectories,
    /// Snapshot name patterns per kind
    pub file_patterns: KindMap<String>,
    /// Snapshot format
    pub input: TransformInput,
    /// Columns each snapshot must carry
    pub expected_columns: KindMap<Vec<String>>,
    /// Row-level checks
    pub validation: TransformValidation,
    /// Join settings
    pub join: JoinConfig,
    /// Curated output
    pub output: TransformOutput,
    /// Log sinks
    pub logging: LogConfig,
}

/// Directories used by transformation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDirectories {
    pub bronze: PathBuf,
    pub silver: PathBuf,
    pub archive: PathBuf,
}

impl Default for TransformDirectories {
    fn default() -> Self {
        Self {
            bronze: PathBuf::from("data/bronze"),
            silver: PathBuf::from("data/silver"),
            archive: PathBuf::from("data/bronze/archive"),
        }
    }
}

/// Snapshot input format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformInput {
    pub file_format: String,
}

impl Default for TransformInput {
    fn default() -> Self {
        Self {
            file_format: "json".to_string(),
        }
    }
}

/// Row-level validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformValidation {
    /// Sales rows with a null in any of these columns are dropped before the join
    pub drop_missing: Vec<String>,
    /// Joined rows with a negative value in any of these columns are dropped
    pub check_negative: Vec<String>,
    /// Columns whose values must be unique across the joined result
    pub unique: Vec<String>,
}

impl Default for TransformValidation {
    fn default() -> Self {
        Self {
            drop_missing: vec!["product_id".to_string(), "sale_date".to_string()],
            check_negative: vec!["quantity".to_string(), "sales_price".to_string()],
            unique: vec!["sale_id".to_string()],
        }
    }
}

/// Join settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    pub key: String,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            key: "product_id".to_string(),
        }
    }
}

/// Curated output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOutput {
    pub file_format: String,
    /// Accepts a `{timestamp}` placeholder
    pub file_name_template: String,
}

impl Default for TransformOutput {
    fn default() -> Self {
        Self {
            file_format: "parquet".to_string(),
            file_name_template: "transformed_sales_product_{timestamp}.parquet".to_string(),
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        let cols = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            directories: TransformDirectories::default(),
            file_patterns: KindMap {
                sales: "sales_data_bronze_*".to_string(),
                product: "product_data_bronze_*".to_string(),
            },
            input: TransformInput::default(),
            expected_columns: KindMap {
                sales: cols(&[
                    "sale_id",
                    "product_id",
                    "sale_date",
                    "quantity",
                    "price",
                    "ingestion_timestamp",
                ]),
                product: cols(&["product_id", "product_name", "category", "price"]),
            },
            validation: TransformValidation::default(),
            join: JoinConfig::default(),
            output: TransformOutput::default(),
            logging: LogConfig::default(),
        }
    }
}

impl TransformConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Point all directories below a common root (`<root>/bronze`, ...)
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.directories = TransformDirectories {
            bronze: root.join("bronze"),
            silver: root.join("silver"),
            archive: root.join("bronze").join("archive"),
        };
        self.logging.dir = root.join("logs");
        self
    }

    /// Set the file name template
    pub fn with_file_name_template(mut self, template: impl Into<String>) -> Self {
        self.output.file_name_template = template.into();
        self
    }

    /// Resolved snapshot format
    pub fn input_format(&self) -> PipelineResult<DataFormat> {
        DataFormat::require(&self.input.file_format, "input.file_format", DataFormat::Json)
    }

    /// Resolved curated format
    pub fn output_format(&self) -> PipelineResult<DataFormat> {
        DataFormat::require(
            &self.output.file_format,
            "output.file_format",
            DataFormat::Parquet,
        )
    }

    /// Render the output file name for a run stamp
    pub fn output_file_name(&self, stamp: &str) -> String {
        self.output.file_name_template.replace("{timestamp}", stamp)
    }

    /// Columns a kind must carry
    pub fn expected(&self, kind: DataKind) -> &[String] {
        self.expected_columns.get(kind)
    }
}

impl StageConfig for TransformConfig {
    const DEFAULT_PATH: &'static str = "configs/silver/transform.yml";

    fn validate(&self) -> PipelineResult<()> {
        self.input_format()?;
        self.output_format()?;
        for kind in DataKind::ALL {
            require_non_empty(self.file_patterns.get(kind), "file_patterns")?;
        }
        require_non_empty(&self.join.key, "join.key")?;
        if !self.output.file_name_template.contains("{timestamp}") {
            return Err(PipelineError::ConfigInvalid(
                "output.file_name_template must contain '{timestamp}'".to_string(),
            ));
        }
        Ok(())
    }

    fn logging(&self) -> &LogConfig {
        &self.logging
    }
}
