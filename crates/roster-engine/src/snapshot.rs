//! Parse an event snapshot handed over by the storage collaborator.

use serde_json::Value;

use crate::error::Result;
use crate::model::ScheduleEvent;

/// Parse a JSON array of events.
///
/// Fails only when the document is not a JSON array. Entries that don't
/// deserialize as a [`ScheduleEvent`] (missing dates, a MONTHLY rule without a
/// day of month, ...) are skipped with a warning, so one bad record never hides
/// the rest of the calendar.
pub fn parse_snapshot(json: &str) -> Result<Vec<ScheduleEvent>> {
    let entries: Vec<Value> = serde_json::from_str(json)?;
    let total = entries.len();

    let events: Vec<ScheduleEvent> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let id = entry.get("id").and_then(Value::as_str).map(str::to_owned);
            match serde_json::from_value(entry) {
                Ok(event) => Some(event),
                Err(err) => {
                    tracing::warn!(position, id = ?id, error = %err, "skipping malformed event");
                    None
                }
            }
        })
        .collect();

    if events.len() < total {
        tracing::warn!(
            kept = events.len(),
            skipped = total - events.len(),
            "snapshot contained malformed events"
        );
    }
    Ok(events)
}

/// Parse a single event.
pub fn parse_event(json: &str) -> Result<ScheduleEvent> {
    Ok(serde_json::from_str(json)?)
}
