//! Tunables for expansion and candidate checks.

use serde::{Deserialize, Serialize};

/// Default cap, in years from an event's start, for rules without an end date.
pub const DEFAULT_HORIZON_YEARS: u32 = 5;

/// Default padding, in days, around a candidate's own date range.
pub const DEFAULT_CANDIDATE_PADDING_DAYS: u32 = 30;

/// Engine configuration.
///
/// Every field has a default, so a partial (or empty) JSON object is a valid
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Years after an event's start date at which an open-ended rule stops.
    pub horizon_years: u32,
    /// Days added before and after a candidate's date range when checking it.
    pub candidate_padding_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            candidate_padding_days: DEFAULT_CANDIDATE_PADDING_DAYS,
        }
    }
}
