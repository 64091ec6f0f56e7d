//! CLI command implementations

pub mod generate;
pub mod inspect;
pub mod schedule;
pub mod stage;
