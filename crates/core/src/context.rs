//! Per-run context shared by every stage

use chrono::{DateTime, Datelike, Local, TimeZone};
use uuid::Uuid;

/// Immutable parameters of a single stage invocation
///
/// Created once in the entry point and passed down; nothing in the crate reads
/// the clock on its own.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique run identifier
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Local>,
}

impl RunContext {
    /// Create a context for a run starting now
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    /// Create a context for a run starting at the given instant
    pub fn at(started_at: DateTime<Local>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
        }
    }

    /// Create a context from calendar fields, for tests and replays
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        let started_at = Local
            .with_ymd_and_hms(year, month, day, hour, min, sec)
            .earliest()
            .unwrap_or_else(Local::now);
        Self::at(started_at)
    }

    /// Stamp used in file names (archive suffixes, outputs, logs)
    pub fn file_stamp(&self) -> String {
        self.started_at.format("%Y-%m-%d_%H-%M-%S").to_string()
    }

    /// Stamp stored in every ingested row
    pub fn ingestion_stamp(&self) -> String {
        self.started_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Calendar year of the run
    pub fn reporting_year(&self) -> i32 {
        self.started_at.year()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
