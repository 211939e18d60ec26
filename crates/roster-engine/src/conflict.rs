//! Detect staff double-bookings in expanded schedules.
//!
//! Events are grouped by their primary staff identity, expanded into dated
//! [`TimeSlot`]s, and compared pairwise within each group. Two slots overlap
//! when `a.start < b.end && a.end > b.start`; slots that only touch at an
//! endpoint are NOT conflicts. Absences and events without a time range never
//! take part.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::exceptions::ExceptionIndex;
use crate::expander::expand_occurrences_with_config;
use crate::model::{ScheduleEvent, StaffIdentity};
use crate::window::DateWindow;

/// One dated occurrence of an event, as a concrete time interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub event_id: String,
    pub staff: StaffIdentity,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSlot {
    /// Open-interval overlap; adjacent slots do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// A detected overlap between two slots of the same staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConflict {
    pub slot_a: TimeSlot,
    pub slot_b: TimeSlot,
    pub overlap_minutes: i64,
}

/// Expand `event` into time slots within `window`.
///
/// Yields nothing for events with no primary staff, no time range, an
/// unparsable time, or an end time that is not after the start time.
pub fn slots_for_event(
    event: &ScheduleEvent,
    window: &DateWindow,
    exceptions: &ExceptionIndex,
    config: &EngineConfig,
) -> Vec<TimeSlot> {
    let Some(staff) = event.primary_staff() else {
        return Vec::new();
    };

    let (start_time, end_time) = match event.time_range() {
        Ok(Some(range)) => range,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::debug!(event_id = %event.id, error = %err, "skipping event with bad time");
            return Vec::new();
        }
    };
    if end_time <= start_time {
        tracing::debug!(event_id = %event.id, "end time not after start time; skipping event");
        return Vec::new();
    }

    expand_occurrences_with_config(event, window, exceptions, config)
        .into_iter()
        .map(|date: NaiveDate| TimeSlot {
            event_id: event.id.clone(),
            staff: staff.clone(),
            start: date.and_time(start_time),
            end: date.and_time(end_time),
        })
        .collect()
}

/// Find all overlapping pairs between two slot lists.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
/// Pairs from the same event are ignored.
pub fn find_slot_conflicts(slots_a: &[TimeSlot], slots_b: &[TimeSlot]) -> Vec<SlotConflict> {
    let mut conflicts = Vec::new();

    for a in slots_a {
        for b in slots_b {
            if a.event_id != b.event_id && a.overlaps(b) {
                conflicts.push(conflict_between(a, b));
            }
        }
    }

    conflicts
}

fn conflict_between(a: &TimeSlot, b: &TimeSlot) -> SlotConflict {
    let overlap_start = a.start.max(b.start);
    let overlap_end = a.end.min(b.end);
    SlotConflict {
        slot_a: a.clone(),
        slot_b: b.clone(),
        overlap_minutes: (overlap_end - overlap_start).num_minutes(),
    }
}

/// Every overlapping slot pair in `events` within `window`, using the default
/// configuration.
pub fn detect_conflict_pairs(events: &[ScheduleEvent], window: &DateWindow) -> Vec<SlotConflict> {
    detect_conflict_pairs_with_config(events, window, &EngineConfig::default())
}

/// Every overlapping slot pair in `events` within `window`.
///
/// Pairs are reported per staff member (in staff order), sorted by the start of
/// the earlier slot.
pub fn detect_conflict_pairs_with_config(
    events: &[ScheduleEvent],
    window: &DateWindow,
    config: &EngineConfig,
) -> Vec<SlotConflict> {
    let exceptions = ExceptionIndex::from_events(events);

    let mut groups: BTreeMap<StaffIdentity, Vec<TimeSlot>> = BTreeMap::new();
    for event in events.iter().filter(|e| !e.is_absence) {
        let slots = slots_for_event(event, window, &exceptions, config);
        if let Some(first) = slots.first() {
            groups.entry(first.staff.clone()).or_default().extend(slots);
        }
    }

    let mut conflicts = Vec::new();
    let mut slot_count = 0;
    for slots in groups.values_mut() {
        slot_count += slots.len();
        slots.sort_by(|a, b| (a.start, a.end, &a.event_id).cmp(&(b.start, b.end, &b.event_id)));

        // Sorted by start, so once a later slot starts at or after `a.end`,
        // no further slot can overlap `a`.
        for (i, a) in slots.iter().enumerate() {
            for b in slots[i + 1..].iter().take_while(|b| b.start < a.end) {
                if a.event_id != b.event_id && a.overlaps(b) {
                    conflicts.push(conflict_between(a, b));
                }
            }
        }
    }

    tracing::debug!(
        window_days = window.len_days(),
        staff_groups = groups.len(),
        slots = slot_count,
        conflicts = conflicts.len(),
        "bulk conflict detection finished"
    );

    conflicts
}

/// Ids of every event that overlaps another event of the same staff member
/// within `window`, using the default configuration.
pub fn detect_all(events: &[ScheduleEvent], window: &DateWindow) -> BTreeSet<String> {
    detect_all_with_config(events, window, &EngineConfig::default())
}

/// Ids of every event that overlaps another event of the same staff member
/// within `window`.
pub fn detect_all_with_config(
    events: &[ScheduleEvent],
    window: &DateWindow,
    config: &EngineConfig,
) -> BTreeSet<String> {
    detect_conflict_pairs_with_config(events, window, config)
        .into_iter()
        .flat_map(|c| [c.slot_a.event_id, c.slot_b.event_id])
        .collect()
}

// ---------------------------------------------------------------------------
// Candidate checks
// ---------------------------------------------------------------------------

/// What kind of edit the candidate event represents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditScope {
    /// A brand-new event (or series).
    #[default]
    NewEvent,
    /// A new exception replacing `date` in an existing series.
    NewException { series_id: String, date: NaiveDate },
    /// An edit of one existing event or exception instance.
    SingleOccurrence,
    /// An edit of a whole series; other members of the series are ignored.
    EntireSeries,
}

/// A proposed event checked against the existing schedule before it is saved.
#[derive(Debug, Clone)]
pub struct CandidateCheck<'a> {
    candidate: &'a ScheduleEvent,
    scope: EditScope,
    config: EngineConfig,
}

impl<'a> CandidateCheck<'a> {
    pub fn new(candidate: &'a ScheduleEvent, scope: EditScope) -> Self {
        Self {
            candidate,
            scope,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Existing events the candidate would overlap, each at most once, in the
    /// order they appear in `existing`.
    pub fn conflicting_events<'e>(
        &self,
        existing: &'e [ScheduleEvent],
        window: &DateWindow,
    ) -> Vec<&'e ScheduleEvent> {
        let candidate = self.candidate;
        if candidate.is_absence {
            return Vec::new();
        }
        let Some(staff) = candidate.primary_staff() else {
            return Vec::new();
        };
        let Ok(own_range) = DateWindow::new(candidate.start_date, candidate.end_date) else {
            tracing::debug!(event_id = %candidate.id, "candidate ends before it starts");
            return Vec::new();
        };
        let window = window.union(&own_range.padded(self.config.candidate_padding_days));

        let mut exceptions = ExceptionIndex::from_events(existing);
        if let EditScope::NewException { series_id, date } = &self.scope {
            // The series occurrence being replaced must not collide with its replacement.
            exceptions.insert(series_id, *date);
        }

        let candidate_slots = slots_for_event(candidate, &window, &exceptions, &self.config);
        if candidate_slots.is_empty() {
            return Vec::new();
        }

        let own_series = matches!(self.scope, EditScope::EntireSeries).then(|| candidate.series_key());

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for event in existing {
            if event.id == candidate.id || event.is_absence {
                continue;
            }
            if own_series.is_some_and(|series| {
                event.series_key() == series || event.overridden_series() == Some(series)
            }) {
                continue;
            }
            if event.primary_staff().as_ref() != Some(&staff) {
                continue;
            }
            let slots = slots_for_event(event, &window, &exceptions, &self.config);
            let collides = slots
                .iter()
                .any(|slot| candidate_slots.iter().any(|own| own.overlaps(slot)));
            if collides && seen.insert(event.id.as_str()) {
                found.push(event);
            }
        }

        tracing::debug!(
            candidate_id = %candidate.id,
            staff = %staff,
            conflicts = found.len(),
            "candidate check finished"
        );

        found
    }

    /// Display labels of the events the candidate would overlap.
    pub fn conflict_labels(&self, existing: &[ScheduleEvent], window: &DateWindow) -> Vec<String> {
        self.conflicting_events(existing, window)
            .into_iter()
            .map(ScheduleEvent::display_label)
            .collect()
    }
}

/// Labels of existing events that `candidate` would overlap, using the default
/// configuration.
///
/// The candidate's window is `window` widened to cover the candidate's own
/// dates padded by 30 days. The event being edited is never reported, and for
/// [`EditScope::EntireSeries`] neither is any other member of its series.
pub fn find_conflicts_for_candidate(
    candidate: &ScheduleEvent,
    scope: EditScope,
    existing: &[ScheduleEvent],
    window: &DateWindow,
) -> Vec<String> {
    CandidateCheck::new(candidate, scope).conflict_labels(existing, window)
}
