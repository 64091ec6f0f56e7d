//! CLI commands for the batch stages

use std::path::PathBuf;

use lakehouse_core::config::StageConfigPaths;
use lakehouse_core::telemetry::init_logging;
use lakehouse_core::{
    IngestionConfig, IngestionStage, LoadConfig, LoadStage, PipelineConfig, PipelineExecutor,
    PipelineStage, RunContext, StageConfig, StageOutcome, TransformConfig, TransformStage,
    load_config_or_default_path,
};

use crate::error::CliError;
use crate::output;

/// Arguments shared by the single-stage commands
pub struct StageArgs {
    /// Stage configuration file (stage default when absent)
    pub config: Option<PathBuf>,
    /// Print the report as JSON on stdout
    pub json: bool,
}

/// Arguments for the `run` command
pub struct RunArgs {
    pub ingestion_config: Option<PathBuf>,
    pub transform_config: Option<PathBuf>,
    pub load_config: Option<PathBuf>,
    /// Stages to run (empty = all)
    pub stages: Vec<String>,
    pub json: bool,
}

fn start<T: StageConfig>(stage: &str, args: &StageArgs) -> Result<(T, RunContext), CliError> {
    let config: T = load_config_or_default_path(args.config.as_deref())?;
    let ctx = RunContext::new();
    let log = init_logging(stage, config.logging(), &ctx)?;
    tracing::debug!(file = %log.file.display(), "Logging to file");
    Ok((config, ctx))
}

/// Handle the `ingest` command
pub fn handle_ingest(args: &StageArgs) -> Result<(), CliError> {
    let (config, ctx) = start::<IngestionConfig>("ingestion", args)?;
    let report = IngestionStage::new(config).run(&ctx)?;
    if args.json {
        output::print_json(&report)
    } else {
        output::print_ingestion(&report);
        Ok(())
    }
}

/// Handle the `transform` command
pub fn handle_transform(args: &StageArgs) -> Result<(), CliError> {
    let (config, ctx) = start::<TransformConfig>("transformation", args)?;
    let report = TransformStage::new(config).run(&ctx)?;
    if args.json {
        output::print_json(&report)
    } else {
        output::print_transform(&report);
        Ok(())
    }
}

/// Handle the `load` command
pub fn handle_load(args: &StageArgs) -> Result<(), CliError> {
    let (config, ctx) = start::<LoadConfig>("load", args)?;
    let report = LoadStage::new(config).run(&ctx)?;
    if args.json {
        output::print_json(&report)
    } else {
        output::print_load(&report);
        Ok(())
    }
}

/// Parse stage names; empty means all stages
pub fn parse_stages(names: &[String]) -> Result<Vec<PipelineStage>, CliError> {
    if names.is_empty() {
        return Ok(PipelineStage::all());
    }
    names
        .iter()
        .map(|s| s.parse::<PipelineStage>().map_err(CliError::InvalidArgument))
        .collect()
}

/// Handle the `run` command
pub fn handle_run(args: &RunArgs) -> Result<(), CliError> {
    let defaults = StageConfigPaths::default();
    let paths = StageConfigPaths {
        ingestion: args.ingestion_config.clone().unwrap_or(defaults.ingestion),
        transform: args.transform_config.clone().unwrap_or(defaults.transform),
        load: args.load_config.clone().unwrap_or(defaults.load),
    };
    let config = PipelineConfig::from_paths(&paths)?.with_stages(parse_stages(&args.stages)?);

    let ctx = RunContext::new();
    init_logging("pipeline", &config.ingestion.logging, &ctx)?;

    eprintln!("Starting pipeline run: {}", ctx.run_id);
    let report = PipelineExecutor::new(config).run(&ctx);

    if args.json {
        output::print_json(&report)?;
    } else {
        output::print_pipeline(&report);
    }

    match report.stages.iter().find(|s| s.outcome.is_failed()) {
        None => {
            eprintln!("Pipeline completed successfully!");
            Ok(())
        }
        Some(record) => match &record.outcome {
            StageOutcome::Failed { error, exit_code } => Err(CliError::StageFailed {
                stage: record.stage.to_string(),
                error: error.clone(),
                exit_code: *exit_code,
            }),
            _ => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stages() {
        assert_eq!(parse_stages(&[]).unwrap(), PipelineStage::all());
        assert_eq!(
            parse_stages(&["silver".to_string(), "gold".to_string()]).unwrap(),
            vec![PipelineStage::Transform, PipelineStage::Load]
        );
        assert!(parse_stages(&["export".to_string()]).is_err());
    }
}
