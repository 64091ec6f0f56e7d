//! CLI error types

use lakehouse_core::PipelineError;
use thiserror::Error;

/// Errors surfaced by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{}", .0.user_message())]
    Pipeline(#[from] PipelineError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// One or more stages of a pipeline run failed
    #[error("Pipeline failed at stage '{stage}': {error}")]
    StageFailed {
        stage: String,
        error: String,
        exit_code: i32,
    },

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit status: 1 when required inputs were missing, 2 otherwise
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Pipeline(e) => e.exit_code(),
            CliError::StageFailed { exit_code, .. } => *exit_code,
            _ => 2,
        }
    }
}
