//! Error types for pipeline operations
//!
//! Fatal conditions abort a stage before any write and are surfaced as
//! [`PipelineError`]. Row-level data-quality conditions never abort a run;
//! they live in [`crate::validation::RowIssue`] and only reduce the row set.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a stage
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration file does not exist
    #[error("Configuration file not found: {}", .0.display())]
    ConfigMissing(PathBuf),

    /// Configuration could not be parsed or failed validation
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Unknown or inapplicable format identifier
    #[error("Unsupported format '{format}' for {context}")]
    UnsupportedFormat { format: String, context: String },

    /// A stage found none of the inputs it requires
    #[error("Missing required files in {}: {detail}", dir.display())]
    MissingRequiredFiles { dir: PathBuf, detail: String },

    /// A dataset lacks configured columns
    #[error("Missing columns in {dataset}: {}", columns.join(", "))]
    MissingColumns {
        dataset: String,
        columns: Vec<String>,
    },

    /// A schema object name failed the identifier pattern
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Another writer holds the analytical store
    #[error("Analytical store is busy: {0}")]
    StoreBusy(String),

    /// Analytical store error
    #[error("Store error: {0}")]
    Store(String),

    /// IO error with path context
    #[error("IO error with {}: {message}", path.display())]
    IoWithPath {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Malformed data that cannot be represented at all
    #[error("Invalid data in {}: {reason}", path.display())]
    InvalidData { path: PathBuf, reason: String },
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Create an IO error with path context
    pub fn io_with_path(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::IoWithPath {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a JSON error for a file
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Create a missing-files error
    pub fn missing_files(dir: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::MissingRequiredFiles {
            dir: dir.into(),
            detail: detail.into(),
        }
    }

    /// Process exit status for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::MissingRequiredFiles { .. } => 1,
            _ => 2,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::ConfigMissing(path) => format!(
                "Configuration file not found: {}\n\nHint: Pass --config or create the file.",
                path.display()
            ),
            PipelineError::ConfigInvalid(msg) => {
                format!("Invalid configuration: {msg}\n\nHint: Check the stage configuration file.")
            }
            PipelineError::UnsupportedFormat { format, context } => format!(
                "Unsupported format '{format}' for {context}.\n\nHint: Supported formats are 'json' and 'parquet'."
            ),
            PipelineError::MissingRequiredFiles { dir, detail } => format!(
                "Missing required files in {}: {detail}\n\nHint: Nothing to process; the next scheduled run will retry.",
                dir.display()
            ),
            PipelineError::MissingColumns { dataset, columns } => format!(
                "{dataset} is missing columns: {}\n\nHint: Inputs were left in place; fix the extract and re-run.",
                columns.join(", ")
            ),
            PipelineError::StoreBusy(msg) => format!(
                "Analytical store is busy: {msg}\n\nHint: Another load is running; wait for it to finish."
            ),
            _ => self.to_string(),
        }
    }
}

impl From<duckdb::Error> for PipelineError {
    fn from(err: duckdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("Could not set lock") || message.contains("Conflicting lock") {
            PipelineError::StoreBusy(message)
        } else {
            PipelineError::Store(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::MissingColumns {
            dataset: "sales data".to_string(),
            columns: vec!["quantity".to_string(), "price".to_string()],
        };
        assert!(err.to_string().contains("sales data"));
        assert!(err.to_string().contains("quantity, price"));

        let err = PipelineError::missing_files("/data/input", "no product files");
        assert!(err.to_string().contains("/data/input"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(PipelineError::missing_files("in", "none").exit_code(), 1);
        assert_eq!(
            PipelineError::ConfigMissing(PathBuf::from("x.yml")).exit_code(),
            2
        );
        assert_eq!(
            PipelineError::UnsupportedFormat {
                format: "xml".to_string(),
                context: "input".to_string()
            }
            .exit_code(),
            2
        );
    }

    #[test]
    fn test_io_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = PipelineError::io_with_path("/path/to/file", "archiving", io_err);
        let display = err.to_string();
        assert!(display.contains("/path/to/file"));
        assert!(display.contains("archiving"));
    }

    #[test]
    fn test_user_message() {
        let err = PipelineError::ConfigMissing(PathBuf::from("configs/gold/load.yml"));
        let msg = err.user_message();
        assert!(msg.contains("configs/gold/load.yml"));
        assert!(msg.contains("Hint:"));
    }
}
