//! Exception lookup: does a standalone exception event replace a series occurrence?
//!
//! An exception instance names the series it belongs to and the date it
//! replaces. The series stops generating that date for as long as the exception
//! exists; deleting the exception restores the generated occurrence.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::model::ScheduleEvent;

/// Linear form of the lookup: scans `events` for an exception that overrides
/// `date` in `series_id`.
///
/// Prefer [`ExceptionIndex`] when checking more than a handful of dates.
pub fn is_overridden(series_id: &str, date: NaiveDate, events: &[ScheduleEvent]) -> bool {
    events.iter().any(|e| {
        e.is_exception_instance
            && e.exception_for_date == Some(date)
            && e.overridden_series() == Some(series_id)
    })
}

/// Series occurrences overridden by exception instances, built once per call.
#[derive(Debug, Clone, Default)]
pub struct ExceptionIndex {
    overridden: HashMap<String, HashSet<NaiveDate>>,
}

impl ExceptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every exception instance in `events`.
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a ScheduleEvent>,
    {
        let mut index = Self::new();
        for event in events.into_iter().filter(|e| e.is_exception_instance) {
            match (event.overridden_series(), event.exception_for_date) {
                (Some(series), Some(date)) => {
                    index.insert(series, date);
                }
                _ => tracing::debug!(
                    event_id = %event.id,
                    "exception instance without series or date; not indexed"
                ),
            }
        }
        index
    }

    /// Mark `date` in `series_id` as overridden. Returns `false` if it already was.
    pub fn insert(&mut self, series_id: &str, date: NaiveDate) -> bool {
        self.overridden
            .entry(series_id.to_string())
            .or_default()
            .insert(date)
    }

    pub fn is_overridden(&self, series_id: &str, date: NaiveDate) -> bool {
        self.overridden
            .get(series_id)
            .is_some_and(|dates| dates.contains(&date))
    }

    /// Number of overridden occurrences across all series.
    pub fn len(&self) -> usize {
        self.overridden.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.overridden.is_empty()
    }
}
