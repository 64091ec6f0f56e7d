//! lakehouse - batch pipeline CLI for sales and product extracts

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::generate::{GenerateArgs, handle_generate};
use commands::inspect::{
    InspectCuratedArgs, InspectStoreArgs, handle_inspect_curated, handle_inspect_store,
};
use commands::schedule::{ScheduleArgs, handle_schedule};
use commands::stage::{RunArgs, StageArgs, handle_ingest, handle_load, handle_run, handle_transform};
use error::CliError;

#[derive(Parser)]
#[command(name = "lakehouse")]
#[command(about = "Bronze/silver/gold batch pipeline for sales and product extracts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest raw extracts into bronze snapshots
    Ingest {
        /// Configuration file (default: configs/bronze/ingestion.yml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate and join bronze snapshots into a curated file
    Transform {
        /// Configuration file (default: configs/silver/transform.yml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Load curated files into the analytical store
    Load {
        /// Configuration file (default: configs/gold/load.yml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Run ingest, transform and load in sequence
    Run {
        #[arg(long)]
        ingestion_config: Option<PathBuf>,
        #[arg(long)]
        transform_config: Option<PathBuf>,
        #[arg(long)]
        load_config: Option<PathBuf>,
        /// Stages to run (default: all)
        #[arg(short, long, value_delimiter = ',')]
        stages: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Run the pipeline (and optionally the generator) on fixed intervals
    Schedule {
        /// Configuration file (default: configs/scheduler.yml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Seconds between pipeline runs
        #[arg(long)]
        pipeline_every: Option<u64>,
        /// Seconds between generated extracts (enables the generator)
        #[arg(long)]
        generate_every: Option<u64>,
    },
    /// Write a synthetic sales extract and product catalogue
    Generate {
        /// Scheduler configuration holding the generator section
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Number of sales rows
        #[arg(short, long)]
        rows: Option<usize>,
    },
    /// Read-only inspection
    Inspect {
        #[command(subcommand)]
        target: InspectTarget,
    },
}

#[derive(Subcommand)]
enum InspectTarget {
    /// Tables, views, partition registry and load manifest of a store
    Store {
        #[arg(short, long, default_value = "data/gold/sales_product.duckdb")]
        database: PathBuf,
        /// Preview the first rows of this table or view
        #[arg(short, long)]
        table: Option<String>,
        #[arg(short, long, default_value = "10")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Row counts and amounts of curated files
    Curated {
        #[arg(short, long, default_value = "data/silver/archive")]
        dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest { config, json } => handle_ingest(&StageArgs { config, json })?,
        Commands::Transform { config, json } => handle_transform(&StageArgs { config, json })?,
        Commands::Load { config, json } => handle_load(&StageArgs { config, json })?,
        Commands::Run {
            ingestion_config,
            transform_config,
            load_config,
            stages,
            json,
        } => handle_run(&RunArgs {
            ingestion_config,
            transform_config,
            load_config,
            stages,
            json,
        })?,
        Commands::Schedule {
            config,
            pipeline_every,
            generate_every,
        } => handle_schedule(&ScheduleArgs {
            config,
            pipeline_every,
            generate_every,
        })?,
        Commands::Generate {
            config,
            output_dir,
            rows,
        } => handle_generate(&GenerateArgs {
            config,
            output_dir,
            rows,
        })?,
        Commands::Inspect { target } => match target {
            InspectTarget::Store {
                database,
                table,
                limit,
                json,
            } => handle_inspect_store(&InspectStoreArgs {
                database,
                table,
                limit,
                json,
            })?,
            InspectTarget::Curated { dir, json } => {
                handle_inspect_curated(&InspectCuratedArgs { dir, json })?
            }
        },
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<CliError>().map_or(2, CliError::exit_code);
            ExitCode::from(code.clamp(0, 255) as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_stages() {
        let cli = Cli::try_parse_from(["lakehouse", "run", "--stages", "transform,load"]).unwrap();
        match cli.command {
            Commands::Run { stages, .. } => assert_eq!(stages, vec!["transform", "load"]),
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_stage_commands_need_no_arguments() {
        for name in ["ingest", "transform", "load"] {
            assert!(Cli::try_parse_from(["lakehouse", name]).is_ok());
        }
    }
}
