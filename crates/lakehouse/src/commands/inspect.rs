//! CLI commands for read-only inspection

use std::path::PathBuf;

use lakehouse_core::inspect::{inspect_store, preview, summarize_curated};

use crate::error::CliError;
use crate::output;

/// Arguments for the `inspect store` command
pub struct InspectStoreArgs {
    /// Store file
    pub database: PathBuf,
    /// Table or view to preview
    pub table: Option<String>,
    /// Rows to preview
    pub limit: usize,
    pub json: bool,
}

/// Arguments for the `inspect curated` command
pub struct InspectCuratedArgs {
    /// Directory holding curated files
    pub dir: PathBuf,
    pub json: bool,
}

/// Handle the `inspect store` command
pub fn handle_inspect_store(args: &InspectStoreArgs) -> Result<(), CliError> {
    if let Some(table) = &args.table {
        let rows = preview(&args.database, table, args.limit)?;
        return output::print_json(&rows);
    }

    let summary = inspect_store(&args.database)?;
    if args.json {
        output::print_json(&summary)
    } else {
        output::print_store(&summary);
        Ok(())
    }
}

/// Handle the `inspect curated` command
pub fn handle_inspect_curated(args: &InspectCuratedArgs) -> Result<(), CliError> {
    let summary = summarize_curated(&args.dir)?;
    if args.json {
        output::print_json(&summary)
    } else {
        output::print_curated(&summary);
        Ok(())
    }
}
