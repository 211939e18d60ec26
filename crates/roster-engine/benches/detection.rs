use chrono::{Days, NaiveDate};
use criterion::{criterion_group, criterion_main, Criterion};
use roster_engine::{
    detect_all, find_conflicts_for_candidate, DateWindow, EditScope, RecurrenceRule,
    ScheduleEvent, WeekdaySet,
};
use std::hint::black_box;

/// A clinic-sized snapshot: 40 staff, each with a weekly series, a few one-off
/// shifts, and an exception per series.
fn snapshot() -> Vec<ScheduleEvent> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut events = Vec::new();

    for staff in 0..40 {
        let provider = format!("p{staff}");

        let mut series = ScheduleEvent::new(format!("series-{staff}"), start);
        series.staff.provider_id = Some(provider.clone());
        series.start_time = Some("09:00".into());
        series.end_time = Some("17:00".into());
        series.recurrence = Some(RecurrenceRule::Weekly {
            days: WeekdaySet::from_numbers(&[1, 2, 3, 4, 5]).unwrap(),
            end_date: None,
        });
        events.push(series);

        for n in 0..5u64 {
            let day = start + Days::new(n * 9 + staff as u64 % 7);
            let mut single = ScheduleEvent::new(format!("single-{staff}-{n}"), day);
            single.staff.provider_id = Some(provider.clone());
            single.start_time = Some("16:00".into());
            single.end_time = Some("18:00".into());
            events.push(single);
        }

        let replaced = start + Days::new(14);
        let mut exception = ScheduleEvent::new(format!("exc-{staff}"), replaced);
        exception.staff.provider_id = Some(provider);
        exception.start_time = Some("12:00".into());
        exception.end_time = Some("20:00".into());
        exception.is_exception_instance = true;
        exception.parent_series_id = Some(format!("series-{staff}"));
        exception.exception_for_date = Some(replaced);
        events.push(exception);
    }

    events
}

fn bench_detection(c: &mut Criterion) {
    let events = snapshot();
    let window = DateWindow::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
    )
    .unwrap();

    c.bench_function("detect_all_40_staff_75_days", |b| {
        b.iter(|| detect_all(black_box(&events), black_box(&window)))
    });

    let candidate = events[0].clone();
    c.bench_function("candidate_check_series_edit", |b| {
        b.iter(|| {
            find_conflicts_for_candidate(
                black_box(&candidate),
                EditScope::EntireSeries,
                black_box(&events),
                black_box(&window),
            )
        })
    });
}

criterion_group!(benches, bench_detection);
criterion_main!(benches);
