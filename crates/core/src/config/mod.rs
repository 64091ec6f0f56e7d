//! Stage configuration
//!
//! Every stage reads one YAML document. Keys that are absent fall back to the
//! defaults of the reference layout (`data/input` → `data/bronze` →
//! `data/silver` → `data/gold/sales_product.duckdb`).

mod format;
mod ingestion;
mod load;
mod scheduler;
mod transform;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{PipelineError, PipelineResult};

pub use format::DataFormat;
pub use ingestion::{IngestionConfig, IngestionDirectories, KindMap, RequiredColumns};
pub use load::{LoadConfig, LoadDirectories, PartitionPolicy, TableNames};
pub use scheduler::{GeneratorConfig, MAX_GENERATED_ROWS, SchedulerConfig, StageConfigPaths};
pub use transform::{JoinConfig, TransformConfig, TransformDirectories, TransformValidation};

/// Common behaviour of per-stage configuration documents
pub trait StageConfig: DeserializeOwned {
    /// Path used when no `--config` is given
    const DEFAULT_PATH: &'static str;

    /// Check the parsed document for inconsistent or unsafe values
    fn validate(&self) -> PipelineResult<()>;

    /// Logging settings for this stage
    fn logging(&self) -> &LogConfig;
}

/// Load and validate a stage configuration file
pub fn load_config<T: StageConfig>(path: &Path) -> PipelineResult<T> {
    if !path.exists() {
        return Err(PipelineError::ConfigMissing(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::io_with_path(path, "reading configuration", e))?;
    let config: T = serde_yaml::from_str(&content)
        .map_err(|e| PipelineError::ConfigInvalid(format!("{}: {e}", path.display())))?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Load a configuration from the given path or the stage default
pub fn load_config_or_default_path<T: StageConfig>(path: Option<&Path>) -> PipelineResult<T> {
    match path {
        Some(path) => load_config(path),
        None => load_config(Path::new(T::DEFAULT_PATH)),
    }
}

/// Log sink settings shared by all stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base directory; each stage logs under `<dir>/<stage>/`
    pub dir: PathBuf,
    /// Console level (file sink always records debug)
    pub console_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            console_level: "info".to_string(),
        }
    }
}

/// Part of a discovery pattern before the first wildcard
pub(crate) fn pattern_prefix(pattern: &str) -> &str {
    pattern.split('*').next().unwrap_or("")
}

pub(crate) fn require_non_empty(value: &str, key: &str) -> PipelineResult<()> {
    if value.trim().is_empty() {
        return Err(PipelineError::ConfigInvalid(format!("'{key}' must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pattern_prefix() {
        assert_eq!(pattern_prefix("sales_data_*.json"), "sales_data_");
        assert_eq!(pattern_prefix("product_data"), "product_data");
        assert_eq!(pattern_prefix("*.json"), "");
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let result = load_config::<IngestionConfig>(&dir.path().join("absent.yml"));
        assert!(matches!(result, Err(PipelineError::ConfigMissing(_))));
    }

    #[test]
    fn test_malformed_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yml");
        std::fs::write(&path, "directories: [unclosed").unwrap();
        let result = load_config::<LoadConfig>(&path);
        assert!(matches!(result, Err(PipelineError::ConfigInvalid(_))));
    }

    #[test]
    fn test_default_path_used_when_absent() {
        // Default paths are relative to the working directory; in the test
        // environment they normally do not exist.
        let result = load_config_or_default_path::<TransformConfig>(None);
        if let Err(e) = result {
            assert!(matches!(e, PipelineError::ConfigMissing(_)));
        }
    }
}
