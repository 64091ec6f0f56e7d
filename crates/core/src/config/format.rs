//! Serialization format identifiers

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Supported dataset formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// JSON array of flat records
    Json,
    /// Apache Parquet
    Parquet,
}

impl DataFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::Parquet => "parquet",
        }
    }

    /// Parse a format identifier, naming the config key on failure
    pub fn resolve(id: &str, context: &str) -> PipelineResult<Self> {
        id.parse().map_err(|_| PipelineError::UnsupportedFormat {
            format: id.to_string(),
            context: context.to_string(),
        })
    }

    /// Parse and require a specific format for this slot
    pub fn require(id: &str, context: &str, expected: DataFormat) -> PipelineResult<Self> {
        let format = Self::resolve(id, context)?;
        if format != expected {
            return Err(PipelineError::UnsupportedFormat {
                format: id.to_string(),
                context: format!("{context} (expected {expected})"),
            });
        }
        Ok(format)
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(DataFormat::Json),
            "parquet" => Ok(DataFormat::Parquet),
            _ => Err(format!("Unknown data format: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_format_from_str() {
        assert_eq!("json".parse::<DataFormat>().unwrap(), DataFormat::Json);
        assert_eq!("PARQUET".parse::<DataFormat>().unwrap(), DataFormat::Parquet);
        assert!("csv".parse::<DataFormat>().is_err());
    }

    #[test]
    fn test_resolve_unsupported() {
        let err = DataFormat::resolve("xml", "data_format.input.sales").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
        assert!(err.to_string().contains("data_format.input.sales"));
    }

    #[test]
    fn test_require_wrong_slot() {
        let err = DataFormat::require("parquet", "output.bronze", DataFormat::Json).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
        assert!(DataFormat::require("json", "output.bronze", DataFormat::Json).is_ok());
    }
}
