//! Schedule events, recurrence rules, and staff assignment as supplied by the caller.
//!
//! Wire names are camelCase to match the calendar front end. Recurrence rules
//! arrive as a flat record (`frequency`, `interval`, `daysOfWeek`, ...) and are
//! converted into [`RecurrenceRule`], whose variants carry only the fields their
//! frequency needs.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Weekdays
// ---------------------------------------------------------------------------

/// Set of weekdays numbered 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    /// Build a set from weekday numbers, rejecting anything outside 0..=6.
    pub fn from_numbers(numbers: &[u8]) -> Result<Self> {
        numbers.iter().try_fold(Self::EMPTY, |set, &n| {
            if n > 6 {
                Err(EngineError::InvalidRule(format!(
                    "weekday number {n} is outside 0-6"
                )))
            } else {
                Ok(WeekdaySet(set.0 | (1u8 << n)))
            }
        })
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1u8 << weekday.num_days_from_sunday()) != 0
    }

    pub fn contains_date(&self, day: NaiveDate) -> bool {
        self.contains(day.weekday())
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Weekday numbers in ascending order.
    pub fn numbers(&self) -> Vec<u8> {
        (0u8..7).filter(|&n| self.0 & (1u8 << n) != 0).collect()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, |set, w| {
            WeekdaySet(set.0 | (1u8 << w.num_days_from_sunday()))
        })
    }
}

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

/// Frequency tag used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    None,
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
}

/// Flat wire form of a recurrence rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// A recurrence rule. `end_date` is inclusive; `None` means open-ended (capped
/// internally by the configured horizon).
///
/// Values that are representable but meaningless (interval 0, an empty weekday
/// set, day of month outside 1..=31) are accepted here and expand to nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleRecord", into = "RuleRecord")]
pub enum RecurrenceRule {
    None,
    Daily {
        interval: u32,
        end_date: Option<NaiveDate>,
    },
    Weekly {
        days: WeekdaySet,
        end_date: Option<NaiveDate>,
    },
    BiWeekly {
        days: WeekdaySet,
        end_date: Option<NaiveDate>,
    },
    Monthly {
        interval: u32,
        day_of_month: u32,
        end_date: Option<NaiveDate>,
    },
}

impl RecurrenceRule {
    pub fn frequency(&self) -> Frequency {
        match self {
            RecurrenceRule::None => Frequency::None,
            RecurrenceRule::Daily { .. } => Frequency::Daily,
            RecurrenceRule::Weekly { .. } => Frequency::Weekly,
            RecurrenceRule::BiWeekly { .. } => Frequency::BiWeekly,
            RecurrenceRule::Monthly { .. } => Frequency::Monthly,
        }
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            RecurrenceRule::None => None,
            RecurrenceRule::Daily { end_date, .. }
            | RecurrenceRule::Weekly { end_date, .. }
            | RecurrenceRule::BiWeekly { end_date, .. }
            | RecurrenceRule::Monthly { end_date, .. } => *end_date,
        }
    }

    /// Weekday filter for weekly variants, `None` for the others.
    pub fn weekdays(&self) -> Option<WeekdaySet> {
        match self {
            RecurrenceRule::Weekly { days, .. } | RecurrenceRule::BiWeekly { days, .. } => {
                Some(*days)
            }
            _ => None,
        }
    }
}

impl TryFrom<RuleRecord> for RecurrenceRule {
    type Error = EngineError;

    fn try_from(record: RuleRecord) -> Result<Self> {
        let interval = record.interval.unwrap_or(1);
        let end_date = record.end_date;
        let weekdays = |record: &RuleRecord| -> Result<WeekdaySet> {
            let numbers = record.days_of_week.as_deref().ok_or_else(|| {
                EngineError::InvalidRule(format!("{:?} rule without daysOfWeek", record.frequency))
            })?;
            WeekdaySet::from_numbers(numbers)
        };

        Ok(match record.frequency {
            Frequency::None => RecurrenceRule::None,
            Frequency::Daily => RecurrenceRule::Daily { interval, end_date },
            Frequency::Weekly => RecurrenceRule::Weekly {
                days: weekdays(&record)?,
                end_date,
            },
            Frequency::BiWeekly => RecurrenceRule::BiWeekly {
                days: weekdays(&record)?,
                end_date,
            },
            Frequency::Monthly => RecurrenceRule::Monthly {
                interval,
                day_of_month: record.day_of_month.ok_or_else(|| {
                    EngineError::InvalidRule("MONTHLY rule without dayOfMonth".to_string())
                })?,
                end_date,
            },
        })
    }
}

impl From<RecurrenceRule> for RuleRecord {
    fn from(rule: RecurrenceRule) -> Self {
        let mut record = RuleRecord {
            frequency: rule.frequency(),
            interval: None,
            days_of_week: None,
            day_of_month: None,
            end_date: rule.end_date(),
        };
        match rule {
            RecurrenceRule::None => {}
            RecurrenceRule::Daily { interval, .. } => record.interval = Some(interval),
            RecurrenceRule::Weekly { days, .. } | RecurrenceRule::BiWeekly { days, .. } => {
                record.days_of_week = Some(days.numbers());
            }
            RecurrenceRule::Monthly {
                interval,
                day_of_month,
                ..
            } => {
                record.interval = Some(interval);
                record.day_of_month = Some(day_of_month);
            }
        }
        record
    }
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

/// Staff references attached to an event, one list per staff category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaffAssignment {
    pub provider_id: Option<String>,
    pub front_desk_ids: Vec<String>,
    pub billing_ids: Vec<String>,
    pub behavioral_health_ids: Vec<String>,
    /// Co-scheduled assistants. Never checked for time conflicts.
    pub assistant_ids: Vec<String>,
}

impl StaffAssignment {
    /// The single staff member an event is grouped under for conflict checks.
    ///
    /// Precedence is fixed: provider, then the first front desk, billing and
    /// behavioral health id, in that order.
    pub fn primary(&self) -> Option<StaffIdentity> {
        if let Some(id) = self.provider_id.as_deref().filter(|id| !id.is_empty()) {
            return Some(StaffIdentity::Provider(id.to_string()));
        }
        first(&self.front_desk_ids)
            .map(StaffIdentity::FrontDesk)
            .or_else(|| first(&self.billing_ids).map(StaffIdentity::Billing))
            .or_else(|| first(&self.behavioral_health_ids).map(StaffIdentity::BehavioralHealth))
    }
}

fn first(ids: &[String]) -> Option<String> {
    ids.first().filter(|id| !id.is_empty()).cloned()
}

/// A staff member, qualified by the category their id belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "category", content = "id", rename_all = "camelCase")]
pub enum StaffIdentity {
    Provider(String),
    FrontDesk(String),
    Billing(String),
    BehavioralHealth(String),
}

impl StaffIdentity {
    pub fn id(&self) -> &str {
        match self {
            StaffIdentity::Provider(id)
            | StaffIdentity::FrontDesk(id)
            | StaffIdentity::Billing(id)
            | StaffIdentity::BehavioralHealth(id) => id,
        }
    }
}

impl fmt::Display for StaffIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = match self {
            StaffIdentity::Provider(_) => "provider",
            StaffIdentity::FrontDesk(_) => "front-desk",
            StaffIdentity::Billing(_) => "billing",
            StaffIdentity::BehavioralHealth(_) => "behavioral-health",
        };
        write!(f, "{category}:{}", self.id())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Parse an `HH:MM` or `HH:MM:SS` time of day.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| EngineError::InvalidTime(value.to_string()))
}

/// A unit of work or absence assigned to one primary staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub staff: StaffAssignment,
    pub start_date: NaiveDate,
    /// Inclusive; equal to `start_date` for single-day events.
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_absence: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    #[serde(default)]
    pub is_exception_instance: bool,
    /// For exception instances: the series occurrence this event replaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_for_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_series_id: Option<String>,
}

impl ScheduleEvent {
    /// A single-day, non-recurring event with no staff and no times.
    pub fn new(id: impl Into<String>, date: NaiveDate) -> Self {
        let id = id.into();
        Self {
            series_id: Some(id.clone()),
            id,
            title: None,
            staff: StaffAssignment::default(),
            start_date: date,
            end_date: date,
            start_time: None,
            end_time: None,
            is_absence: false,
            recurrence: None,
            is_exception_instance: false,
            exception_for_date: None,
            parent_series_id: None,
        }
    }

    /// Series this event belongs to: its own series id, or its id when unset.
    pub fn series_key(&self) -> &str {
        self.series_id.as_deref().unwrap_or(&self.id)
    }

    /// Series an exception instance overrides; falls back to `seriesId`.
    pub fn overridden_series(&self) -> Option<&str> {
        self.parent_series_id
            .as_deref()
            .or(self.series_id.as_deref())
    }

    /// The recurrence rule that actually drives expansion.
    ///
    /// Exception instances never recur, whatever rule they carry.
    pub fn effective_rule(&self) -> Option<&RecurrenceRule> {
        if self.is_exception_instance {
            None
        } else {
            self.recurrence.as_ref()
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self.effective_rule(), None | Some(RecurrenceRule::None))
    }

    /// Parsed start and end times, if both are present.
    ///
    /// Returns `Ok(None)` for all-day events and an error for unparsable values.
    pub fn time_range(&self) -> Result<Option<(NaiveTime, NaiveTime)>> {
        match (self.start_time.as_deref(), self.end_time.as_deref()) {
            (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                Ok(Some((parse_time_of_day(start)?, parse_time_of_day(end)?)))
            }
            _ => Ok(None),
        }
    }

    pub fn primary_staff(&self) -> Option<StaffIdentity> {
        self.staff.primary()
    }

    /// Label shown in conflict warnings: the title (or id) and the time range.
    pub fn display_label(&self) -> String {
        let name = self
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.id);
        match self.time_range() {
            Ok(Some((start, end))) => {
                format!("{name} ({}-{})", start.format("%H:%M"), end.format("%H:%M"))
            }
            _ => name.to_string(),
        }
    }
}
