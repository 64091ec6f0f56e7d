//! Fixed-interval invoker for the pipeline and the generator
//!
//! Two independent jobs share one runtime. Every tick runs on a blocking
//! thread. Pipeline ticks are single-flight: a tick that fires while the
//! previous one still runs is skipped with a warning. A failed tick is only
//! logged; the next tick runs as scheduled.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{error, info, warn};

use crate::config::{GeneratorConfig, SchedulerConfig};
use crate::context::RunContext;
use crate::error::{PipelineError, PipelineResult};
use crate::generator::{self, GeneratedFiles};
use crate::pipeline::{PipelineConfig, PipelineExecutor, PipelineReport};

/// Periodic runner for the ETL pipeline and the optional generator
#[derive(Clone)]
pub struct Scheduler {
    pipeline_interval: Duration,
    generator_interval: Option<Duration>,
    pipeline: Arc<PipelineConfig>,
    generator: Arc<GeneratorConfig>,
    etl_lock: Arc<Mutex<()>>,
}

impl Scheduler {
    /// Create a scheduler from its configuration and the stage configurations
    pub fn new(config: &SchedulerConfig, pipeline: PipelineConfig) -> Self {
        Self {
            pipeline_interval: config.pipeline_interval(),
            generator_interval: config.generator_interval(),
            pipeline: Arc::new(pipeline),
            generator: Arc::new(config.generator.clone()),
            etl_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a scheduler, loading every stage configuration it references
    pub fn from_config(config: &SchedulerConfig) -> PipelineResult<Self> {
        let pipeline = PipelineConfig::from_paths(&config.stages)?;
        Ok(Self::new(config, pipeline))
    }

    /// Run until Ctrl-C
    pub async fn run(self) -> PipelineResult<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
        })
        .await
    }

    /// Run until `shutdown` completes
    ///
    /// The first tick of each job fires one interval after start.
    pub async fn run_until<F>(self, shutdown: F) -> PipelineResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut pipeline_ticks = ticker(self.pipeline_interval);
        let mut generator_ticks = self.generator_interval.map(ticker);

        info!(
            pipeline_every_secs = self.pipeline_interval.as_secs(),
            generator_every_secs = ?self.generator_interval.map(|d| d.as_secs()),
            "Scheduler started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested; stopping scheduler");
                    break;
                }
                _ = pipeline_ticks.tick() => {
                    let scheduler = self.clone();
                    tokio::spawn(async move {
                        scheduler.tick_pipeline().await;
                    });
                }
                _ = next_tick(&mut generator_ticks) => {
                    let scheduler = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = scheduler.tick_generator().await {
                            error!(error = %e, "Data generation failed");
                        }
                    });
                }
            }
        }

        // Let an in-flight pipeline tick finish before returning.
        let _guard = self.etl_lock.lock().await;
        Ok(())
    }

    /// Run one pipeline tick unless another is still running
    ///
    /// Returns `None` when the tick was skipped.
    pub async fn tick_pipeline(&self) -> Option<PipelineReport> {
        let guard = match self.etl_lock.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("Previous pipeline run still in progress; skipping tick");
                return None;
            }
        };

        let pipeline = Arc::clone(&self.pipeline);
        let result = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let ctx = RunContext::new();
            PipelineExecutor::new((*pipeline).clone()).run(&ctx)
        })
        .await;

        match result {
            Ok(report) => {
                if report.is_success() {
                    info!(run_id = %report.run_id, duration = %report.duration_formatted(), "Pipeline tick completed");
                } else {
                    error!(run_id = %report.run_id, exit_code = report.exit_code(), "Pipeline tick failed");
                }
                Some(report)
            }
            Err(e) => {
                error!(error = %e, "Pipeline tick panicked");
                None
            }
        }
    }

    /// Run one generator tick
    pub async fn tick_generator(&self) -> PipelineResult<GeneratedFiles> {
        let config = Arc::clone(&self.generator);
        tokio::task::spawn_blocking(move || generator::generate(&config, &RunContext::new()))
            .await
            .map_err(|e| PipelineError::Io(std::io::Error::other(e.to_string())))?
    }
}

fn ticker(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
