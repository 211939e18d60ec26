//! Property-based tests for recurrence expansion and conflict detection using proptest.
//!
//! These tests verify invariants that should hold for *any* well-formed event,
//! not just the specific examples in `expander_tests.rs`.

use chrono::{Datelike, Days, NaiveDate};
use proptest::prelude::*;
use roster_engine::{
    detect_all, expand_event, expand_occurrences, DateWindow, ExceptionIndex, RecurrenceRule,
    ScheduleEvent, WeekdaySet,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A date in 2024-2025. Day is capped at 28 to avoid invalid month/day combos.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2024i32..=2025, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_weekdays() -> impl Strategy<Value = WeekdaySet> {
    prop::collection::vec(0u8..=6, 1..=7).prop_map(|n| WeekdaySet::from_numbers(&n).unwrap())
}

fn arb_end_date() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::of(arb_date())
}

fn arb_rule() -> impl Strategy<Value = RecurrenceRule> {
    prop_oneof![
        Just(RecurrenceRule::None),
        (1u32..=10, arb_end_date())
            .prop_map(|(interval, end_date)| RecurrenceRule::Daily { interval, end_date }),
        (arb_weekdays(), arb_end_date())
            .prop_map(|(days, end_date)| RecurrenceRule::Weekly { days, end_date }),
        (arb_weekdays(), arb_end_date())
            .prop_map(|(days, end_date)| RecurrenceRule::BiWeekly { days, end_date }),
        (1u32..=4, 1u32..=31, arb_end_date()).prop_map(|(interval, day_of_month, end_date)| {
            RecurrenceRule::Monthly {
                interval,
                day_of_month,
                end_date,
            }
        }),
    ]
}

/// An event starting on a random date, spanning 0-3 days, with a random rule.
fn arb_event() -> impl Strategy<Value = ScheduleEvent> {
    (arb_date(), 0u64..=3, arb_rule()).prop_map(|(start, span, rule)| {
        let mut event = ScheduleEvent::new("evt", start);
        event.end_date = start + Days::new(span);
        event.recurrence = Some(rule);
        event
    })
}

/// A window of 1-120 days starting in 2024-2025.
fn arb_window() -> impl Strategy<Value = DateWindow> {
    (arb_date(), 0u64..120).prop_map(|(start, len)| {
        DateWindow::new(start, start + Days::new(len)).unwrap()
    })
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: Output is strictly ascending (sorted and deduplicated)
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn expansion_is_strictly_ascending(event in arb_event(), window in arb_window()) {
        let dates = expand_occurrences(&event, &window, &ExceptionIndex::new());
        for pair in dates.windows(2) {
            prop_assert!(pair[0] < pair[1], "not strictly ascending: {:?}", pair);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: Every date is inside the window and not before the event start
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn dates_stay_in_bounds(event in arb_event(), window in arb_window()) {
        let dates = expand_occurrences(&event, &window, &ExceptionIndex::new());
        for day in &dates {
            prop_assert!(window.contains(*day), "{} outside {:?}", day, window);
            prop_assert!(*day >= event.start_date, "{} before start {}", day, event.start_date);
            if let Some(end) = event.recurrence.as_ref().and_then(RecurrenceRule::end_date) {
                prop_assert!(*day <= end, "{} after rule end {}", day, end);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: Expansion is idempotent
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn expansion_is_idempotent(event in arb_event(), window in arb_window()) {
        let index = ExceptionIndex::new();
        prop_assert_eq!(
            expand_occurrences(&event, &window, &index),
            expand_occurrences(&event, &window, &index)
        );
    }
}

// ---------------------------------------------------------------------------
// Property 4: Weekly variants only land on selected weekdays
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn weekly_dates_match_selected_weekdays(event in arb_event(), window in arb_window()) {
        let dates = expand_occurrences(&event, &window, &ExceptionIndex::new());
        if let Some(days) = event.recurrence.as_ref().and_then(RecurrenceRule::weekdays) {
            for day in &dates {
                prop_assert!(days.contains(day.weekday()), "{} not in {:?}", day, days.numbers());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: Single-day monthly occurrences fall on the requested day
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn monthly_dates_fall_on_day_of_month(event in arb_event(), window in arb_window()) {
        if let Some(RecurrenceRule::Monthly { day_of_month, .. }) = event.recurrence {
            if event.start_date == event.end_date {
                let dates = expand_occurrences(&event, &window, &ExceptionIndex::new());
                for day in &dates {
                    prop_assert_eq!(day.day(), day_of_month);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 6: An exception removes exactly its date and nothing else
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn exception_removes_exactly_one_date(
        event in arb_event(),
        window in arb_window(),
        pick in any::<prop::sample::Index>(),
    ) {
        let full = expand_event(&event, &window, std::slice::from_ref(&event));
        prop_assume!(!full.is_empty());
        let replaced = full[pick.index(full.len())];

        let mut exception = ScheduleEvent::new("exc", replaced);
        exception.is_exception_instance = true;
        exception.parent_series_id = Some(event.series_key().to_string());
        exception.exception_for_date = Some(replaced);

        let snapshot = vec![event.clone(), exception];
        let is_recurring = event.is_recurring();
        let reduced = expand_event(&event, &window, &snapshot);

        if is_recurring {
            let expected: Vec<NaiveDate> =
                full.iter().copied().filter(|d| *d != replaced).collect();
            prop_assert_eq!(reduced, expected);
        } else {
            // Non-recurring events have no occurrences to override.
            prop_assert_eq!(reduced, full);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 7: Bulk detection ignores input order
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn detection_ignores_input_order(
        starts in prop::collection::vec((0u64..10, 6u32..18, 1u32..4), 2..8),
    ) {
        let base = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let events: Vec<ScheduleEvent> = starts
            .iter()
            .enumerate()
            .map(|(i, &(offset, hour, len))| {
                let mut e = ScheduleEvent::new(format!("e{i}"), base + Days::new(offset));
                e.staff.provider_id = Some("p1".into());
                e.start_time = Some(format!("{hour:02}:00"));
                e.end_time = Some(format!("{:02}:00", hour + len));
                e
            })
            .collect();
        let window = DateWindow::new(base, base + Days::new(10)).unwrap();

        let mut reversed = events.clone();
        reversed.reverse();
        prop_assert_eq!(detect_all(&events, &window), detect_all(&reversed, &window));
    }
}
