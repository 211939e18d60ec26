//! WASM bindings for roster-engine.
//!
//! Exposes occurrence expansion, bulk conflict detection, and candidate checks
//! to the calendar front end via `wasm-bindgen`. Event snapshots, configs and
//! results cross the boundary as JSON strings; dates are `YYYY-MM-DD` strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p roster-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir packages/roster-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/roster_engine_wasm.wasm
//! ```

use chrono::NaiveDate;
use roster_engine::conflict::{self, CandidateCheck, EditScope, SlotConflict};
use roster_engine::{expander, snapshot, DateWindow, EngineConfig, ExceptionIndex};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SlotDto {
    event_id: String,
    staff: String,
    start: String,
    end: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConflictDto {
    slot_a: SlotDto,
    slot_b: SlotDto,
    overlap_minutes: i64,
}

impl From<&conflict::TimeSlot> for SlotDto {
    fn from(s: &conflict::TimeSlot) -> Self {
        Self {
            event_id: s.event_id.clone(),
            staff: s.staff.to_string(),
            start: s.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            end: s.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

impl From<&SlotConflict> for ConflictDto {
    fn from(c: &SlotConflict) -> Self {
        Self {
            slot_a: SlotDto::from(&c.slot_a),
            slot_b: SlotDto::from(&c.slot_b),
            overlap_minutes: c.overlap_minutes,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers: plain-Rust implementations, mapped to `JsValue` only at the exports
// ---------------------------------------------------------------------------

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", s, e))
}

fn parse_window(start: &str, end: &str) -> Result<DateWindow, String> {
    DateWindow::new(parse_date(start)?, parse_date(end)?).map_err(|e| e.to_string())
}

fn parse_config(json: Option<&str>) -> Result<EngineConfig, String> {
    match json.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => serde_json::from_str(s).map_err(|e| format!("Invalid config JSON: {}", e)),
        None => Ok(EngineConfig::default()),
    }
}

fn parse_scope(json: Option<&str>) -> Result<EditScope, String> {
    match json.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => serde_json::from_str(s).map_err(|e| format!("Invalid edit scope JSON: {}", e)),
        None => Ok(EditScope::NewEvent),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn expand_impl(
    event_json: &str,
    snapshot_json: &str,
    window_start: &str,
    window_end: &str,
    config_json: Option<&str>,
) -> Result<String, String> {
    let event = snapshot::parse_event(event_json).map_err(|e| e.to_string())?;
    let events = snapshot::parse_snapshot(snapshot_json).map_err(|e| e.to_string())?;
    let window = parse_window(window_start, window_end)?;
    let config = parse_config(config_json)?;

    let exceptions = ExceptionIndex::from_events(&events);
    let dates: Vec<String> =
        expander::expand_occurrences_with_config(&event, &window, &exceptions, &config)
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect();
    to_json(&dates)
}

fn detect_impl(
    events_json: &str,
    window_start: &str,
    window_end: &str,
    config_json: Option<&str>,
) -> Result<String, String> {
    let events = snapshot::parse_snapshot(events_json).map_err(|e| e.to_string())?;
    let window = parse_window(window_start, window_end)?;
    let config = parse_config(config_json)?;

    let ids = conflict::detect_all_with_config(&events, &window, &config);
    to_json(&ids)
}

fn detect_pairs_impl(
    events_json: &str,
    window_start: &str,
    window_end: &str,
    config_json: Option<&str>,
) -> Result<String, String> {
    let events = snapshot::parse_snapshot(events_json).map_err(|e| e.to_string())?;
    let window = parse_window(window_start, window_end)?;
    let config = parse_config(config_json)?;

    let dtos: Vec<ConflictDto> = conflict::detect_conflict_pairs_with_config(&events, &window, &config)
        .iter()
        .map(ConflictDto::from)
        .collect();
    to_json(&dtos)
}

fn candidate_impl(
    candidate_json: &str,
    scope_json: Option<&str>,
    existing_json: &str,
    window_start: &str,
    window_end: &str,
    config_json: Option<&str>,
) -> Result<String, String> {
    let candidate = snapshot::parse_event(candidate_json).map_err(|e| e.to_string())?;
    let scope = parse_scope(scope_json)?;
    let existing = snapshot::parse_snapshot(existing_json).map_err(|e| e.to_string())?;
    let window = parse_window(window_start, window_end)?;
    let config = parse_config(config_json)?;

    let labels = CandidateCheck::new(&candidate, scope)
        .with_config(config)
        .conflict_labels(&existing, &window);
    to_json(&labels)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Expand one event into the dates it occupies within a window.
///
/// `snapshot_json` is the full event list (used to find exception instances).
/// Returns a JSON array of `YYYY-MM-DD` strings in ascending order.
#[wasm_bindgen(js_name = "expandOccurrences")]
pub fn expand_occurrences(
    event_json: &str,
    snapshot_json: &str,
    window_start: &str,
    window_end: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    expand_impl(
        event_json,
        snapshot_json,
        window_start,
        window_end,
        config_json.as_deref(),
    )
    .map_err(|e| JsValue::from_str(&e))
}

/// Ids of every event that overlaps another event of the same staff member.
///
/// Returns a JSON array of event id strings, sorted.
#[wasm_bindgen(js_name = "detectConflicts")]
pub fn detect_conflicts(
    events_json: &str,
    window_start: &str,
    window_end: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    detect_impl(events_json, window_start, window_end, config_json.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Every overlapping slot pair, with `slotA`, `slotB` and `overlapMinutes`.
#[wasm_bindgen(js_name = "detectConflictPairs")]
pub fn detect_conflict_pairs(
    events_json: &str,
    window_start: &str,
    window_end: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    detect_pairs_impl(events_json, window_start, window_end, config_json.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Labels of existing events a proposed event would overlap.
///
/// `scope_json` describes the edit, e.g. `{"kind":"entireSeries"}` or
/// `{"kind":"newException","seriesId":"s1","date":"2024-01-08"}`; omitted
/// means a brand-new event. Returns a JSON array of label strings.
#[wasm_bindgen(js_name = "findCandidateConflicts")]
pub fn find_candidate_conflicts(
    candidate_json: &str,
    scope_json: Option<String>,
    existing_json: &str,
    window_start: &str,
    window_end: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    candidate_impl(
        candidate_json,
        scope_json.as_deref(),
        existing_json,
        window_start,
        window_end,
        config_json.as_deref(),
    )
    .map_err(|e| JsValue::from_str(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"[
        {"id": "series", "title": "Clinic", "staff": {"providerId": "p1"},
         "startDate": "2024-01-01", "endDate": "2024-01-01",
         "startTime": "09:00", "endTime": "10:00",
         "recurrence": {"frequency": "WEEKLY", "daysOfWeek": [1]}},
        {"id": "single", "staff": {"providerId": "p1"},
         "startDate": "2024-01-15", "endDate": "2024-01-15",
         "startTime": "09:30", "endTime": "10:30"},
        {"id": "moved", "staff": {"providerId": "p1"},
         "startDate": "2024-01-09", "endDate": "2024-01-09",
         "startTime": "09:00", "endTime": "10:00",
         "isExceptionInstance": true, "parentSeriesId": "series",
         "exceptionForDate": "2024-01-08"}
    ]"#;

    #[test]
    fn expands_with_exceptions_applied() {
        let series = r#"{"id": "series", "startDate": "2024-01-01", "endDate": "2024-01-01",
            "recurrence": {"frequency": "WEEKLY", "daysOfWeek": [1]}}"#;
        let json = expand_impl(series, SNAPSHOT, "2024-01-01", "2024-01-21", None).unwrap();
        assert_eq!(json, r#"["2024-01-01","2024-01-15"]"#);
    }

    #[test]
    fn detects_conflicting_ids() {
        let json = detect_impl(SNAPSHOT, "2024-01-01", "2024-01-31", None).unwrap();
        assert_eq!(json, r#"["series","single"]"#);
    }

    #[test]
    fn reports_pairs_with_overlap() {
        let json = detect_pairs_impl(SNAPSHOT, "2024-01-01", "2024-01-31", Some("")).unwrap();
        let pairs: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(pairs.as_array().unwrap().len(), 1);
        assert_eq!(pairs[0]["overlapMinutes"], 30);
        assert_eq!(pairs[0]["slotA"]["staff"], "provider:p1");
        assert_eq!(pairs[0]["slotA"]["start"], "2024-01-15T09:00:00");
    }

    #[test]
    fn candidate_series_edit_ignores_own_series() {
        let candidate = r#"{"id": "series", "title": "Clinic", "staff": {"providerId": "p1"},
            "startDate": "2024-01-01", "endDate": "2024-01-01",
            "startTime": "09:15", "endTime": "10:15",
            "recurrence": {"frequency": "WEEKLY", "daysOfWeek": [1, 2]}}"#;
        let json = candidate_impl(
            candidate,
            Some(r#"{"kind": "entireSeries"}"#),
            SNAPSHOT,
            "2024-01-01",
            "2024-01-31",
            Some(r#"{"candidatePaddingDays": 7}"#),
        )
        .unwrap();
        assert_eq!(json, r#"["single (09:30-10:30)"]"#);
    }

    #[test]
    fn rejects_bad_window() {
        let err = detect_impl(SNAPSHOT, "2024-02-01", "2024-01-01", None).unwrap_err();
        assert!(err.contains("Invalid window"), "{err}");
        let err = detect_impl(SNAPSHOT, "Jan 1", "2024-01-01", None).unwrap_err();
        assert!(err.contains("Invalid date"), "{err}");
    }

    #[test]
    fn new_exception_scope_parses() {
        let scope =
            parse_scope(Some(r#"{"kind": "newException", "seriesId": "s1", "date": "2024-01-08"}"#))
                .unwrap();
        assert_eq!(
            scope,
            EditScope::NewException {
                series_id: "s1".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            }
        );
        assert_eq!(parse_scope(None).unwrap(), EditScope::NewEvent);
    }
}
