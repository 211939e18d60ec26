//! Recurrence expansion -- turns one schedule event into the calendar dates it
//! occupies inside a window.
//!
//! Expansion walks candidate days from the event's start date, asks the rule
//! whether each one starts a new occurrence, and lays the event's day span over
//! every pattern start. Overridden dates (see [`crate::exceptions`]) are
//! dropped. Output is ascending and free of duplicates, and the same inputs
//! always give the same output.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate};

use crate::config::EngineConfig;
use crate::exceptions::ExceptionIndex;
use crate::model::{RecurrenceRule, ScheduleEvent};
use crate::window::{days_between, months_between, recurrence_horizon, DateWindow};

/// Expand `event` into the dates it occupies within `window`, using the default
/// configuration.
///
/// Overridden occurrences are looked up in `exceptions`.
pub fn expand_occurrences(
    event: &ScheduleEvent,
    window: &DateWindow,
    exceptions: &ExceptionIndex,
) -> Vec<NaiveDate> {
    expand_occurrences_with_config(event, window, exceptions, &EngineConfig::default())
}

/// Expand `event` against a full snapshot, indexing its exceptions first.
///
/// Convenient for one-off calls; batch callers should build the
/// [`ExceptionIndex`] once and use [`expand_occurrences`].
pub fn expand_event(
    event: &ScheduleEvent,
    window: &DateWindow,
    snapshot: &[ScheduleEvent],
) -> Vec<NaiveDate> {
    let exceptions = ExceptionIndex::from_events(snapshot);
    expand_occurrences(event, window, &exceptions)
}

/// Expand `event` into the dates it occupies within `window`.
///
/// - Exception instances yield their own start date if it is in the window.
/// - Non-recurring events yield every day of `start_date..=end_date` in the window.
/// - Recurring events yield the span of every pattern start up to the rule's end
///   date (or `config.horizon_years` after the start when the rule is open-ended).
///
/// Malformed input (end date before start date, zero interval, empty weekday
/// set, impossible day of month) yields an empty list.
pub fn expand_occurrences_with_config(
    event: &ScheduleEvent,
    window: &DateWindow,
    exceptions: &ExceptionIndex,
    config: &EngineConfig,
) -> Vec<NaiveDate> {
    if event.is_exception_instance {
        return if window.contains(event.start_date) {
            vec![event.start_date]
        } else {
            Vec::new()
        };
    }

    let span_days = days_between(event.start_date, event.end_date);
    if span_days < 0 {
        tracing::debug!(event_id = %event.id, "end date precedes start date; no occurrences");
        return Vec::new();
    }

    let rule = match event.effective_rule() {
        None | Some(RecurrenceRule::None) => return expand_single_span(event, window),
        Some(rule) => rule,
    };

    if let Some(reason) = degenerate_reason(rule) {
        tracing::debug!(event_id = %event.id, reason, "degenerate recurrence rule; no occurrences");
        return Vec::new();
    }

    let rule_end = rule.end_date();
    let horizon =
        rule_end.unwrap_or_else(|| recurrence_horizon(event.start_date, config.horizon_years));
    let last_start = horizon.min(window.end());

    // A pattern start earlier than this can't reach into the window.
    let earliest_reaching = window
        .start()
        .checked_sub_days(Days::new(span_days as u64))
        .unwrap_or(NaiveDate::MIN);
    let first_candidate = event.start_date.max(earliest_reaching);

    let weekday_filter = rule.weekdays();
    let series = event.series_key();
    let mut dates = BTreeSet::new();

    for candidate in first_candidate.iter_days().take_while(|d| *d <= last_start) {
        if !is_pattern_start(rule, event.start_date, candidate) {
            continue;
        }
        for day in candidate.iter_days().take(span_days as usize + 1) {
            if rule_end.is_some_and(|end| day > end) {
                break;
            }
            if !window.contains(day) {
                continue;
            }
            // A multi-day weekly event only occupies the selected weekdays.
            if weekday_filter.is_some_and(|days| !days.contains_date(day)) {
                continue;
            }
            if exceptions.is_overridden(series, day) {
                continue;
            }
            dates.insert(day);
        }
    }

    dates.into_iter().collect()
}

/// Every day of a non-recurring event's span that falls in the window.
fn expand_single_span(event: &ScheduleEvent, window: &DateWindow) -> Vec<NaiveDate> {
    let first = event.start_date.max(window.start());
    let last = event.end_date.min(window.end());
    first.iter_days().take_while(|d| *d <= last).collect()
}

/// Whether `candidate` (never earlier than `start`) begins an occurrence.
fn is_pattern_start(rule: &RecurrenceRule, start: NaiveDate, candidate: NaiveDate) -> bool {
    let offset = days_between(start, candidate);
    match *rule {
        RecurrenceRule::None => candidate == start,
        RecurrenceRule::Daily { interval, .. } => offset % i64::from(interval) == 0,
        RecurrenceRule::Weekly { days, .. } => days.contains_date(candidate),
        // Alternate seven-day blocks counted from the start date, not occurrences.
        RecurrenceRule::BiWeekly { days, .. } => {
            days.contains_date(candidate) && (offset / 7) % 2 == 0
        }
        // No clamping: day 31 never matches a 30-day month, so that month is skipped.
        RecurrenceRule::Monthly {
            interval,
            day_of_month,
            ..
        } => {
            candidate.day() == day_of_month
                && i64::from(months_between(start, candidate)) % i64::from(interval) == 0
        }
    }
}

fn degenerate_reason(rule: &RecurrenceRule) -> Option<&'static str> {
    match *rule {
        RecurrenceRule::Daily { interval: 0, .. } | RecurrenceRule::Monthly { interval: 0, .. } => {
            Some("zero interval")
        }
        RecurrenceRule::Weekly { days, .. } | RecurrenceRule::BiWeekly { days, .. }
            if days.is_empty() =>
        {
            Some("no weekdays selected")
        }
        RecurrenceRule::Monthly { day_of_month, .. } if !(1..=31).contains(&day_of_month) => {
            Some("day of month out of range")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeekdaySet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn bi_weekly_parity_counts_seven_day_blocks() {
        let rule = RecurrenceRule::BiWeekly {
            days: WeekdaySet::from_numbers(&[1, 3]).unwrap(),
            end_date: None,
        };
        // 2024-01-03 is a Wednesday; blocks run Wednesday to Tuesday.
        let start = d(2024, 1, 3);
        assert!(is_pattern_start(&rule, start, d(2024, 1, 3)));
        assert!(is_pattern_start(&rule, start, d(2024, 1, 8)));
        assert!(!is_pattern_start(&rule, start, d(2024, 1, 10)));
        assert!(!is_pattern_start(&rule, start, d(2024, 1, 15)));
        assert!(is_pattern_start(&rule, start, d(2024, 1, 17)));
    }

    #[test]
    fn degenerate_rules_are_named() {
        assert_eq!(
            degenerate_reason(&RecurrenceRule::Daily {
                interval: 0,
                end_date: None
            }),
            Some("zero interval")
        );
        assert_eq!(
            degenerate_reason(&RecurrenceRule::Monthly {
                interval: 1,
                day_of_month: 32,
                end_date: None
            }),
            Some("day of month out of range")
        );
        assert_eq!(
            degenerate_reason(&RecurrenceRule::Weekly {
                days: WeekdaySet::EMPTY,
                end_date: None
            }),
            Some("no weekdays selected")
        );
        assert_eq!(degenerate_reason(&RecurrenceRule::None), None);
    }
}
