//! Log sinks
//!
//! A subscriber has two layers: a console layer at the configured level
//! (overridable with `RUST_LOG`) and a debug-level file layer writing
//! `<dir>/<stage>/<run stamp>.log`. One-shot commands install it process-wide;
//! the executor scopes one to the running thread for each stage.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Subscriber;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LogConfig;
use crate::context::RunContext;
use crate::error::{PipelineError, PipelineResult};

/// Handle to the installed log sinks
#[derive(Debug, Clone)]
pub struct LogHandle {
    /// File receiving debug output for this run
    pub file: PathBuf,
    /// False when a subscriber was already installed in this process
    pub installed: bool,
}

/// Log file path for a stage run
pub fn log_file_path(stage: &str, config: &LogConfig, ctx: &RunContext) -> PathBuf {
    config
        .dir
        .join(stage)
        .join(format!("{}.log", ctx.file_stamp()))
}

/// Install console and file sinks for a stage run
pub fn init_logging(stage: &str, config: &LogConfig, ctx: &RunContext) -> PipelineResult<LogHandle> {
    let (subscriber, path) = stage_subscriber(stage, config, ctx)?;
    let installed = subscriber.try_init().is_ok();

    if installed {
        tracing::debug!(stage, run_id = %ctx.run_id, file = %path.display(), "Logging initialised");
    }
    Ok(LogHandle {
        file: path,
        installed,
    })
}

/// Route the current thread's events to a fresh file for one stage run
///
/// The process-wide subscriber is bypassed until the guard drops, so a
/// long-lived process still gets `<dir>/<stage>/<run stamp>.log` per run.
pub fn scoped_logging(
    stage: &str,
    config: &LogConfig,
    ctx: &RunContext,
) -> PipelineResult<(LogHandle, DefaultGuard)> {
    let (subscriber, path) = stage_subscriber(stage, config, ctx)?;
    let guard = tracing::subscriber::set_default(subscriber);
    tracing::debug!(stage, run_id = %ctx.run_id, file = %path.display(), "Stage log opened");
    Ok((
        LogHandle {
            file: path,
            installed: true,
        },
        guard,
    ))
}

fn stage_subscriber(
    stage: &str,
    config: &LogConfig,
    ctx: &RunContext,
) -> PipelineResult<(impl Subscriber + Send + Sync + 'static, PathBuf)> {
    let console_filter = console_filter(&config.console_level)?;
    let path = log_file_path(stage, config, ctx);
    let file = open_log_file(&path)?;

    let console = fmt::layer().with_target(false).with_filter(console_filter);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(LevelFilter::DEBUG);

    let subscriber = tracing_subscriber::registry().with(console).with(file_layer);
    Ok((subscriber, path))
}

fn console_filter(level: &str) -> PipelineResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| PipelineError::ConfigInvalid(format!("logging.console_level '{level}': {e}")))
}

fn open_log_file(path: &Path) -> PipelineResult<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PipelineError::io_with_path(parent, "creating log directory", e))?;
    }
    File::create(path).map_err(|e| PipelineError::io_with_path(path, "creating log file", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_path_per_stage() {
        let config = LogConfig {
            dir: PathBuf::from("logs"),
            ..Default::default()
        };
        let ctx = RunContext::from_ymd_hms(2024, 3, 9, 7, 5, 1);
        assert_eq!(
            log_file_path("load", &config, &ctx),
            PathBuf::from("logs/load/2024-03-09_07-05-01.log")
        );
    }

    #[test]
    fn test_init_creates_log_file() {
        let dir = TempDir::new().unwrap();
        let config = LogConfig {
            dir: dir.path().join("logs"),
            ..Default::default()
        };
        let handle = init_logging("ingest", &config, &RunContext::new()).unwrap();
        assert!(handle.file.exists());
        assert!(handle.file.starts_with(dir.path().join("logs").join("ingest")));
    }

    #[test]
    fn test_scoped_logging_writes_stage_file() {
        let dir = TempDir::new().unwrap();
        let config = LogConfig {
            dir: dir.path().join("logs"),
            ..Default::default()
        };
        let ctx = RunContext::from_ymd_hms(2024, 3, 9, 7, 5, 1);
        {
            let (handle, _guard) = scoped_logging("load", &config, &ctx).unwrap();
            tracing::info!("inside the stage");
            assert_eq!(handle.file, log_file_path("load", &config, &ctx));
        }
        let written = fs::read_to_string(log_file_path("load", &config, &ctx)).unwrap();
        assert!(written.contains("inside the stage"));
    }
}
