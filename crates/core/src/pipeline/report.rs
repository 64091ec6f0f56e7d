//! Per-run pipeline reports

use serde::{Deserialize, Serialize};

use super::stage::PipelineStage;
use crate::stages::{IngestionReport, LoadReport, TransformReport};

/// What a completed stage produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum StageOutput {
    Ingest(IngestionReport),
    Transform(TransformReport),
    Load(LoadReport),
}

/// Result of one stage within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Completed {
        output: Box<StageOutput>,
        duration_ms: u64,
    },
    /// Not run because its input directory held nothing
    Skipped { reason: String },
    Failed { error: String, exit_code: i32 },
}

impl StageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed { .. })
    }
}

/// One stage's entry in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: PipelineStage,
    pub outcome: StageOutcome,
}

/// Report from a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Run ID
    pub run_id: String,
    /// Stage outcomes in execution order
    pub stages: Vec<StageRecord>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Check if no stage failed
    pub fn is_success(&self) -> bool {
        !self.stages.iter().any(|s| s.outcome.is_failed())
    }

    /// Outcome recorded for a stage
    pub fn outcome(&self, stage: PipelineStage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| &s.outcome)
    }

    /// Exit status of the first failed stage, 0 when none failed
    pub fn exit_code(&self) -> i32 {
        self.stages
            .iter()
            .find_map(|s| match &s.outcome {
                StageOutcome::Failed { exit_code, .. } => Some(*exit_code),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Get formatted duration
    pub fn duration_formatted(&self) -> String {
        let secs = self.duration_ms / 1000;
        let mins = secs / 60;
        let remaining_secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, remaining_secs)
        } else if secs > 0 {
            format!("{}s", secs)
        } else {
            format!("{}ms", self.duration_ms)
        }
    }
}
