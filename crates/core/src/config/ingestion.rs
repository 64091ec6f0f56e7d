//! Raw ingestion (bronze) configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{DataFormat, LogConfig, StageConfig, require_non_empty};
use crate::dataset::DataKind;
use crate::error::PipelineResult;

/// Configuration of the ingestion stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Input, bronze and archive directories
    pub directories: IngestionDirectories,
    /// File name patterns per kind (`sales_data_*.json`)
    pub expected_formats: KindMap<String>,
    /// Input and output format identifiers
    pub data_format: IngestionFormats,
    /// Column presence checks
    pub validation: IngestionValidation,
    /// Output naming
    pub output: IngestionOutput,
    /// Log sinks
    pub logging: LogConfig,
}

/// Directories used by ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionDirectories {
    pub input: PathBuf,
    pub bronze: PathBuf,
    pub archive: PathBuf,
}

impl Default for IngestionDirectories {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/input"),
            bronze: PathBuf::from("data/bronze"),
            archive: PathBuf::from("data/input/archive"),
        }
    }
}

/// One value per data kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindMap<T> {
    pub sales: T,
    pub product: T,
}

impl<T> KindMap<T> {
    /// Value for a kind
    pub fn get(&self, kind: DataKind) -> &T {
        match kind {
            DataKind::Sales => &self.sales,
            DataKind::Product => &self.product,
        }
    }
}

impl Default for KindMap<String> {
    fn default() -> Self {
        Self {
            sales: "sales_data_*.json".to_string(),
            product: "product_data_*.json".to_string(),
        }
    }
}

/// Format identifiers for ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionFormats {
    pub input: KindMap<String>,
    pub output: BronzeFormat,
}

impl Default for IngestionFormats {
    fn default() -> Self {
        Self {
            input: KindMap {
                sales: "json".to_string(),
                product: "json".to_string(),
            },
            output: BronzeFormat::default(),
        }
    }
}

/// Bronze output format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BronzeFormat {
    pub bronze: String,
}

impl Default for BronzeFormat {
    fn default() -> Self {
        Self {
            bronze: "json".to_string(),
        }
    }
}

/// Required columns per kind
pub type RequiredColumns = KindMap<Vec<String>>;

impl Default for KindMap<Vec<String>> {
    fn default() -> Self {
        let cols = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            sales: cols(&["sale_id", "product_id", "sale_date", "quantity", "price"]),
            product: cols(&["product_id", "product_name", "category", "price"]),
        }
    }
}

/// Validation settings for ingestion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionValidation {
    pub required_columns: RequiredColumns,
}

/// Bronze file naming
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionOutput {
    pub sales_prefix: String,
    pub product_prefix: String,
}

impl Default for IngestionOutput {
    fn default() -> Self {
        Self {
            sales_prefix: "sales_data_bronze".to_string(),
            product_prefix: "product_data_bronze".to_string(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            directories: IngestionDirectories::default(),
            expected_formats: KindMap::default(),
            data_format: IngestionFormats::default(),
            validation: IngestionValidation::default(),
            output: IngestionOutput::default(),
            logging: LogConfig::default(),
        }
    }
}

impl IngestionConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Point all directories below a common root (`<root>/input`, ...)
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.directories = IngestionDirectories {
            input: root.join("input"),
            bronze: root.join("bronze"),
            archive: root.join("input").join("archive"),
        };
        self.logging.dir = root.join("logs");
        self
    }

    /// Set the input directory
    pub fn with_input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.directories.input = path.into();
        self
    }

    /// Set the bronze directory
    pub fn with_bronze_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.directories.bronze = path.into();
        self
    }

    /// Set required columns for a kind
    pub fn with_required_columns(mut self, kind: DataKind, columns: &[&str]) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        match kind {
            DataKind::Sales => self.validation.required_columns.sales = columns,
            DataKind::Product => self.validation.required_columns.product = columns,
        }
        self
    }

    /// Resolved input format for a kind
    pub fn input_format(&self, kind: DataKind) -> PipelineResult<DataFormat> {
        DataFormat::require(
            self.data_format.input.get(kind),
            &format!("data_format.input.{kind}"),
            DataFormat::Json,
        )
    }

    /// Resolved bronze output format
    pub fn bronze_format(&self) -> PipelineResult<DataFormat> {
        DataFormat::require(
            &self.data_format.output.bronze,
            "data_format.output.bronze",
            DataFormat::Json,
        )
    }

    /// Output file prefix for a kind
    pub fn output_prefix(&self, kind: DataKind) -> &str {
        match kind {
            DataKind::Sales => &self.output.sales_prefix,
            DataKind::Product => &self.output.product_prefix,
        }
    }
}

impl StageConfig for IngestionConfig {
    const DEFAULT_PATH: &'static str = "configs/bronze/ingestion.yml";

    fn validate(&self) -> PipelineResult<()> {
        for kind in DataKind::ALL {
            require_non_empty(self.expected_formats.get(kind), "expected_formats")?;
            self.input_format(kind)?;
        }
        self.bronze_format()?;
        require_non_empty(&self.output.sales_prefix, "output.sales_prefix")?;
        require_non_empty(&self.output.product_prefix, "output.product_prefix")?;
        Ok(())
    }

    fn logging(&self) -> &LogConfig {
        &self.logging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_ingestion_defaults() {
        let config = IngestionConfig::default();
        assert_eq!(config.directories.input, PathBuf::from("data/input"));
        assert_eq!(config.expected_formats.sales, "sales_data_*.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ingestion_yaml() {
        let yaml = r#"
directories:
  input: in
  bronze: out
  archive: in/archive
expected_formats:
  sales: "sales_*"
  product: "product_*"
data_format:
  input:
    sales: json
    product: json
  output:
    bronze: json
validation:
  required_columns:
    sales: [sale_id, quantity]
    product: [product_id]
"#;
        let config: IngestionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.directories.bronze, PathBuf::from("out"));
        assert_eq!(config.validation.required_columns.sales.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unsupported_input_format() {
        let mut config = IngestionConfig::default();
        config.data_format.input.sales = "xlsx".to_string();
        assert!(matches!(
            config.validate(),
            Err(PipelineError::UnsupportedFormat { .. })
        ));
    }
}
