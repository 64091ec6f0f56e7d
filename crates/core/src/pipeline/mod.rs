//! Stage orchestration
//!
//! [`PipelineExecutor`] runs ingest → transform → load within one process and
//! records a [`StageOutcome`] per stage. Transform and load are gated on
//! their input directories holding files, so a tick with nothing new is a
//! cheap no-op rather than a failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use lakehouse_core::pipeline::{PipelineConfig, PipelineExecutor, PipelineStage};
//! use lakehouse_core::RunContext;
//!
//! let config = PipelineConfig::new()
//!     .with_root("data")
//!     .with_stages(vec![PipelineStage::Transform, PipelineStage::Load]);
//!
//! let report = PipelineExecutor::new(config).run(&RunContext::new());
//! println!("Pipeline finished in {}", report.duration_formatted());
//! ```

mod executor;
mod report;
mod stage;

pub use executor::{PipelineConfig, PipelineExecutor};
pub use report::{PipelineReport, StageOutcome, StageOutput, StageRecord};
pub use stage::PipelineStage;
