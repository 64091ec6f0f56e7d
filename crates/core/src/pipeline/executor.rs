//! Pipeline executor for running the stages in sequence

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};

use super::report::{PipelineReport, StageOutcome, StageOutput, StageRecord};
use super::stage::PipelineStage;
use crate::config::{
    IngestionConfig, LoadConfig, LogConfig, StageConfig, StageConfigPaths, TransformConfig,
    load_config,
};
use crate::context::RunContext;
use crate::dataset::DataKind;
use crate::error::{PipelineError, PipelineResult};
use crate::stages::{IngestionStage, LoadStage, TransformStage};
use crate::telemetry::scoped_logging;

/// Stage configurations and the stages to run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub ingestion: IngestionConfig,
    pub transform: TransformConfig,
    pub load: LoadConfig,
    pub stages: Vec<PipelineStage>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ingestion: IngestionConfig::default(),
            transform: TransformConfig::default(),
            load: LoadConfig::default(),
            stages: PipelineStage::all(),
        }
    }
}

impl PipelineConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every stage's configuration file
    pub fn from_paths(paths: &StageConfigPaths) -> PipelineResult<Self> {
        Ok(Self {
            ingestion: load_config(&paths.ingestion)?,
            transform: load_config(&paths.transform)?,
            load: load_config(&paths.load)?,
            stages: PipelineStage::all(),
        })
    }

    /// Point every stage below a common data root
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.ingestion = self.ingestion.with_root(&root);
        self.transform = self.transform.with_root(&root);
        self.load = self.load.with_root(&root);
        self
    }

    /// Set the stages to run
    pub fn with_stages(mut self, stages: Vec<PipelineStage>) -> Self {
        self.stages = stages;
        self
    }
}

/// Runs stages in order with trigger-on-new-file gating
///
/// A downstream stage runs only when its input directory holds files;
/// otherwise it is skipped. A missing-input failure does not stop later
/// stages, any other failure does.
pub struct PipelineExecutor {
    config: PipelineConfig,
}

impl PipelineExecutor {
    /// Create a new pipeline executor
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline
    pub fn run(&self, ctx: &RunContext) -> PipelineReport {
        let _span = info_span!("pipeline_run", run_id = %ctx.run_id).entered();
        let start = Instant::now();

        info!(
            stages = ?self.config.stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            "Starting pipeline"
        );

        let mut records = Vec::with_capacity(self.config.stages.len());
        for stage in &self.config.stages {
            let stage = *stage;
            let outcome = match self.should_skip_stage(stage) {
                Ok(Some(reason)) => {
                    info!(stage = stage.name(), reason = %reason, "Skipping stage");
                    StageOutcome::Skipped { reason }
                }
                Ok(None) => self.run_stage(stage, ctx),
                Err(e) => Self::failed(stage, &e),
            };

            let stop = match &outcome {
                StageOutcome::Failed { exit_code, .. } => *exit_code != 1,
                _ => false,
            };
            records.push(StageRecord { stage, outcome });
            if stop {
                debug!(stage = stage.name(), "Stopping pipeline after fatal failure");
                break;
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let report = PipelineReport {
            run_id: ctx.run_id.to_string(),
            stages: records,
            duration_ms,
        };
        info!(
            duration = %report.duration_formatted(),
            success = report.is_success(),
            "Pipeline finished"
        );
        report
    }

    /// Reason to skip a stage, if its input directory holds nothing
    fn should_skip_stage(&self, stage: PipelineStage) -> PipelineResult<Option<String>> {
        match stage {
            PipelineStage::Ingest => Ok(None),
            PipelineStage::Transform => {
                let transform = TransformStage::new(self.config.transform.clone());
                for kind in DataKind::ALL {
                    if transform.discover(kind)?.is_empty() {
                        return Ok(Some(format!("no {kind} snapshots in bronze")));
                    }
                }
                Ok(None)
            }
            PipelineStage::Load => {
                let load = LoadStage::new(self.config.load.clone());
                if load.discover()?.is_empty() {
                    return Ok(Some("no curated files in silver".to_string()));
                }
                Ok(None)
            }
        }
    }

    fn log_config(&self, stage: PipelineStage) -> &LogConfig {
        match stage {
            PipelineStage::Ingest => self.config.ingestion.logging(),
            PipelineStage::Transform => self.config.transform.logging(),
            PipelineStage::Load => self.config.load.logging(),
        }
    }

    /// Run a single stage with its own run log
    fn run_stage(&self, stage: PipelineStage, ctx: &RunContext) -> StageOutcome {
        let _log = match scoped_logging(stage.log_dir_name(), self.log_config(stage), ctx) {
            Ok((_, guard)) => Some(guard),
            Err(e) => {
                warn!(stage = stage.name(), error = %e, "Stage log file unavailable");
                None
            }
        };
        let _stage_span = info_span!("pipeline_stage", stage = stage.name()).entered();
        info!(stage = stage.name(), "Starting stage");
        let start = Instant::now();

        let result = match stage {
            PipelineStage::Ingest => IngestionStage::new(self.config.ingestion.clone())
                .run(ctx)
                .map(StageOutput::Ingest),
            PipelineStage::Transform => TransformStage::new(self.config.transform.clone())
                .run(ctx)
                .map(StageOutput::Transform),
            PipelineStage::Load => LoadStage::new(self.config.load.clone())
                .run(ctx)
                .map(StageOutput::Load),
        };

        match result {
            Ok(output) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                info!(stage = stage.name(), duration_ms, "Stage completed");
                StageOutcome::Completed {
                    output: Box::new(output),
                    duration_ms,
                }
            }
            Err(e) => Self::failed(stage, &e),
        }
    }

    fn failed(stage: PipelineStage, e: &PipelineError) -> StageOutcome {
        error!(stage = stage.name(), error = %e, "Stage failed");
        StageOutcome::Failed {
            error: e.to_string(),
            exit_code: e.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_tree_skips_downstream() {
        let root = TempDir::new().unwrap();
        let executor = PipelineExecutor::new(PipelineConfig::new().with_root(root.path()));
        let report = executor.run(&RunContext::new());

        assert_eq!(report.stages.len(), 3);
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
            Some(StageOutcome::Skipped { .. })
        ));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_fatal_failure_stops_run() {
        let root = TempDir::new().unwrap();
        let config = PipelineConfig::new().with_root(root.path());
        let input = &config.ingestion.directories.input;
        fs::create_dir_all(input).unwrap();
        fs::write(input.join("sales_data_1.json"), r#"[{"sale_id": 1}]"#).unwrap();
        fs::write(input.join("product_data_1.json"), r#"[{"product_id": "A12"}]"#).unwrap();

        let report = PipelineExecutor::new(config).run(&RunContext::new());
        assert_eq!(report.stages.len(), 1);
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn test_selected_stages_only() {
        let root = TempDir::new().unwrap();
        let config = PipelineConfig::new()
            .with_root(root.path())
            .with_stages(vec![PipelineStage::Load]);
        let report = PipelineExecutor::new(config).run(&RunContext::new());
        assert_eq!(report.stages.len(), 1);
        assert!(report.is_success());
    }

    #[test]
    fn test_each_stage_run_gets_its_own_log() {
        let root = TempDir::new().unwrap();
        let config = PipelineConfig::new().with_root(root.path());
        let ctx = RunContext::from_ymd_hms(2024, 3, 9, 7, 0, 0);
        PipelineExecutor::new(config).run(&ctx);

        let ingestion_log = root
            .path()
            .join("logs/ingestion/2024-03-09_07-00-00.log");
        let written = fs::read_to_string(ingestion_log).unwrap();
        assert!(written.contains("Stage failed"));
        // Skipped stages do not run and open no log.
        assert!(!root.path().join("logs/load").exists());
    }
}
