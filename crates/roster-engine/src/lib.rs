//! # roster-engine
//!
//! Recurring shift expansion and staff double-booking detection for a
//! staff-scheduling calendar.
//!
//! The engine is pure and synchronous: it reads a snapshot of schedule events
//! and a date window, and returns derived facts (occurrence dates, conflicting
//! event ids, conflict labels). It never mutates its input and never decides
//! what a caller should do about a conflict.
//!
//! ## Modules
//!
//! - [`model`] — `ScheduleEvent`, `RecurrenceRule`, staff assignment and identity
//! - [`window`] — inclusive date windows and the open-ended rule horizon
//! - [`exceptions`] — lookup of exception instances that replace series occurrences
//! - [`expander`] — one event + window → ascending list of occupied dates
//! - [`conflict`] — bulk and candidate overlap detection per staff member
//! - [`snapshot`] — lenient parsing of event snapshots from JSON
//! - [`config`] — tunables (recurrence horizon, candidate padding)
//! - [`error`] — Error types

pub mod config;
pub mod conflict;
pub mod error;
pub mod exceptions;
pub mod expander;
pub mod model;
pub mod snapshot;
pub mod window;

pub use config::EngineConfig;
pub use conflict::{
    detect_all, detect_conflict_pairs, find_conflicts_for_candidate, CandidateCheck, EditScope,
    SlotConflict, TimeSlot,
};
pub use error::EngineError;
pub use exceptions::{is_overridden, ExceptionIndex};
pub use expander::{expand_event, expand_occurrences, expand_occurrences_with_config};
pub use model::{RecurrenceRule, ScheduleEvent, StaffAssignment, StaffIdentity, WeekdaySet};
pub use snapshot::parse_snapshot;
pub use window::DateWindow;
