//! Error types for roster-engine parsing and construction.
//!
//! The expansion and conflict operations never return these; they only come out
//! of the constructors and parsers that turn caller data into engine types.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid window: {start} is after {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    /// The snapshot document itself was not a JSON array of events.
    #[error("Snapshot parse error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
