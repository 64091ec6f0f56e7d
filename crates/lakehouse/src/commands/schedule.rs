//! CLI command for the periodic scheduler

use std::path::PathBuf;

use lakehouse_core::telemetry::init_logging;
use lakehouse_core::{
    RunContext, Scheduler, SchedulerConfig, StageConfig, load_config_or_default_path,
};

use crate::error::CliError;

/// Arguments for the `schedule` command
pub struct ScheduleArgs {
    /// Scheduler configuration file
    pub config: Option<PathBuf>,
    /// Override the pipeline interval in seconds
    pub pipeline_every: Option<u64>,
    /// Enable the generator with this interval in seconds
    pub generate_every: Option<u64>,
}

/// Handle the `schedule` command; runs until Ctrl-C
pub fn handle_schedule(args: &ScheduleArgs) -> Result<(), CliError> {
    let mut config: SchedulerConfig = load_config_or_default_path(args.config.as_deref())?;
    if let Some(secs) = args.pipeline_every {
        config.pipeline_interval_secs = secs;
    }
    if args.generate_every.is_some() {
        config.generator_interval_secs = args.generate_every;
    }
    config.validate()?;

    let ctx = RunContext::new();
    init_logging("scheduler", config.logging(), &ctx)?;

    let scheduler = Scheduler::from_config(&config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    eprintln!(
        "Scheduler started: pipeline every {}s{}. Press Ctrl-C to stop.",
        config.pipeline_interval_secs,
        config
            .generator_interval_secs
            .map(|s| format!(", generator every {s}s"))
            .unwrap_or_default()
    );
    runtime.block_on(scheduler.run())?;
    Ok(())
}
