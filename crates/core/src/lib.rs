//! Lakehouse Core - bronze/silver/gold batch pipeline for sales extracts
//!
//! Provides:
//! - Ingestion of raw sales and product extracts into bronze snapshots
//! - Validation, join and enrichment into a curated silver file
//! - Loading into an embedded analytical store with monthly partitions and a
//!   yearly reporting view
//! - A pipeline executor, a fixed-interval scheduler and a test-data generator
//!
//! Every stage is a synchronous call that takes a [`RunContext`]; nothing in
//! the crate reads the clock or installs global state on its own.

pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod files;
pub mod generator;
pub mod inspect;
pub mod pipeline;
pub mod scheduler;
pub mod stages;
pub mod telemetry;
pub mod validation;
pub mod warehouse;

// Re-export commonly used types
pub use config::{
    GeneratorConfig, IngestionConfig, LoadConfig, LogConfig, PartitionPolicy, SchedulerConfig,
    StageConfig, TransformConfig, load_config, load_config_or_default_path,
};
pub use context::RunContext;
pub use dataset::{CuratedRow, DataKind};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{PipelineConfig, PipelineExecutor, PipelineReport, PipelineStage, StageOutcome};
pub use scheduler::Scheduler;
pub use stages::{
    IngestionReport, IngestionStage, LoadReport, LoadStage, TransformReport, TransformStage,
};
pub use validation::{RowIssue, ValidationReport};
pub use warehouse::Warehouse;
