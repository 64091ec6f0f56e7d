//! Pipeline stage identifiers

use serde::{Deserialize, Serialize};

/// Stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// Raw extracts → bronze snapshots
    Ingest,
    /// Bronze snapshots → curated file
    Transform,
    /// Curated files → staging, partitions and view
    Load,
}

impl PipelineStage {
    /// Get all stages in execution order
    pub fn all() -> Vec<Self> {
        vec![Self::Ingest, Self::Transform, Self::Load]
    }

    /// Get stage name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Transform => "transform",
            Self::Load => "load",
        }
    }

    /// Directory under the log root receiving this stage's run logs
    pub fn log_dir_name(&self) -> &'static str {
        match self {
            Self::Ingest => "ingestion",
            Self::Transform => "transformation",
            Self::Load => "load",
        }
    }

    /// Get stage description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ingest => "Ingest raw extracts into bronze snapshots",
            Self::Transform => "Validate, join and write curated data",
            Self::Load => "Load curated data into monthly partitions",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PipelineStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingest" | "ingestion" | "bronze" => Ok(Self::Ingest),
            "transform" | "transformation" | "silver" => Ok(Self::Transform),
            "load" | "gold" => Ok(Self::Load),
            _ => Err(format!(
                "Invalid stage: {s}. Expected: ingest, transform, load"
            )),
        }
    }
}
