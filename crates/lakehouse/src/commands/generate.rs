//! CLI command for the test-data generator

use std::path::{Path, PathBuf};

use lakehouse_core::generator::generate;
use lakehouse_core::telemetry::init_logging;
use lakehouse_core::{RunContext, SchedulerConfig, StageConfig, load_config};

use crate::error::CliError;

/// Arguments for the `generate` command
pub struct GenerateArgs {
    /// Scheduler configuration holding the generator section
    pub config: Option<PathBuf>,
    /// Override the output directory
    pub output_dir: Option<PathBuf>,
    /// Override the number of sales rows
    pub rows: Option<usize>,
}

/// Handle the `generate` command
///
/// Without `--config`, the default scheduler configuration is used when it
/// exists and built-in defaults otherwise.
pub fn handle_generate(args: &GenerateArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => load_config::<SchedulerConfig>(path)?,
        None => {
            let default = Path::new(SchedulerConfig::DEFAULT_PATH);
            if default.exists() {
                load_config::<SchedulerConfig>(default)?
            } else {
                SchedulerConfig::default()
            }
        }
    };

    let mut generator = config.generator.clone();
    if let Some(dir) = &args.output_dir {
        generator.output_dir = dir.clone();
    }
    if let Some(rows) = args.rows {
        generator.sales_rows = rows;
    }

    let ctx = RunContext::new();
    init_logging("data_generator", config.logging(), &ctx)?;

    let files = generate(&generator, &ctx)?;
    eprintln!("Sales data written to:   {}", files.sales.display());
    eprintln!("Product data written to: {}", files.products.display());
    Ok(())
}
