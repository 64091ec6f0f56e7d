//! Periodic invoker and test-data producer configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{LogConfig, StageConfig};
use crate::error::{PipelineError, PipelineResult};

/// Configuration of the scheduler process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between pipeline ticks
    pub pipeline_interval_secs: u64,
    /// Seconds between generator ticks; generator disabled when absent
    pub generator_interval_secs: Option<u64>,
    /// Stage configuration files
    pub stages: StageConfigPaths,
    /// Generator settings
    pub generator: GeneratorConfig,
    /// Log sinks
    pub logging: LogConfig,
}

/// Config file locations for each stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfigPaths {
    pub ingestion: PathBuf,
    pub transform: PathBuf,
    pub load: PathBuf,
}

impl Default for StageConfigPaths {
    fn default() -> Self {
        Self {
            ingestion: PathBuf::from("configs/bronze/ingestion.yml"),
            transform: PathBuf::from("configs/silver/transform.yml"),
            load: PathBuf::from("configs/gold/load.yml"),
        }
    }
}

/// Upper bound on `sales_rows`; generated identifiers are unique across runs
/// started at least one second apart as long as an extract stays below it
pub const MAX_GENERATED_ROWS: usize = 1_000_000;

/// Synthetic extract generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory receiving generated extracts
    pub output_dir: PathBuf,
    /// Sales rows per extract
    pub sales_rows: usize,
    /// Probability that a sale has no product identifier
    pub missing_product_rate: f64,
    /// Probability that a sale has no date
    pub missing_date_rate: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data/input"),
            sales_rows: 100,
            missing_product_rate: 0.25,
            missing_date_rate: 0.1,
        }
    }
}

impl GeneratorConfig {
    /// Check rates and sizes
    pub fn validate(&self) -> PipelineResult<()> {
        for (name, rate) in [
            ("missing_product_rate", self.missing_product_rate),
            ("missing_date_rate", self.missing_date_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(PipelineError::ConfigInvalid(format!(
                    "generator.{name} must be between 0 and 1, got {rate}"
                )));
            }
        }
        if self.sales_rows >= MAX_GENERATED_ROWS {
            return Err(PipelineError::ConfigInvalid(format!(
                "generator.sales_rows must be below {MAX_GENERATED_ROWS}, got {}",
                self.sales_rows
            )));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pipeline_interval_secs: 120,
            generator_interval_secs: None,
            stages: StageConfigPaths::default(),
            generator: GeneratorConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Interval between pipeline ticks
    pub fn pipeline_interval(&self) -> Duration {
        Duration::from_secs(self.pipeline_interval_secs)
    }

    /// Interval between generator ticks, if enabled
    pub fn generator_interval(&self) -> Option<Duration> {
        self.generator_interval_secs.map(Duration::from_secs)
    }
}

impl StageConfig for SchedulerConfig {
    const DEFAULT_PATH: &'static str = "configs/scheduler.yml";

    fn validate(&self) -> PipelineResult<()> {
        if self.pipeline_interval_secs == 0 {
            return Err(PipelineError::ConfigInvalid(
                "pipeline_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.generator_interval_secs == Some(0) {
            return Err(PipelineError::ConfigInvalid(
                "generator_interval_secs must be greater than zero".to_string(),
            ));
        }
        self.generator.validate()
    }

    fn logging(&self) -> &LogConfig {
        &self.logging
    }
}
