//! Names of store objects
//!
//! Every table or view name that reaches SQL text is either validated here or
//! rendered from a [`PartitionKey`], which only carries numbers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").expect("valid identifier regex"));

static PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,47}$").expect("valid prefix regex"));

/// Accept lowercase SQL identifiers only
pub fn validate_identifier(name: &str) -> PipelineResult<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(PipelineError::InvalidIdentifier(name.to_string()))
    }
}

/// Accept a partition or view prefix
pub fn validate_prefix(prefix: &str) -> PipelineResult<&str> {
    if PREFIX.is_match(prefix) {
        Ok(prefix)
    } else {
        Err(PipelineError::InvalidIdentifier(prefix.to_string()))
    }
}

/// Calendar month a partition holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub year: i32,
    pub month: u32,
}

impl PartitionKey {
    /// Create a key, rejecting impossible months and years outside four digits
    pub fn new(year: i32, month: u32) -> PipelineResult<Self> {
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return Err(PipelineError::InvalidIdentifier(format!(
                "partition {year}-{month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// `<prefix>_<YYYY>_<MM>`
    pub fn table_name(&self, prefix: &str) -> PipelineResult<String> {
        let prefix = validate_prefix(prefix)?;
        Ok(format!("{prefix}_{:04}_{:02}", self.year, self.month))
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// `<prefix>_<YYYY>`
pub fn view_name(prefix: &str, year: i32) -> PipelineResult<String> {
    let prefix = validate_prefix(prefix)?;
    if !(1..=9999).contains(&year) {
        return Err(PipelineError::InvalidIdentifier(format!("{prefix}_{year}")));
    }
    Ok(format!("{prefix}_{year:04}"))
}
