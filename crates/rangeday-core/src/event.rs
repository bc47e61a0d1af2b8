//! Event definitions -- the durable source of truth for the planner.
//!
//! Events describe a range (an ordered slot in a day) plus a repeat rule.
//! They are only ever mutated through explicit CRUD; occurrences are derived
//! from them on demand. Wire field names stay camelCase for compatibility
//! with existing event records.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Canonical title carried by rest events.
pub const REST_TITLE: &str = "Rest";

pub const MIN_DURATION_MIN: u32 = 1;
pub const MAX_DURATION_MIN: u32 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A real range with a title and notes. Older records spell this
    /// "event".
    #[default]
    #[serde(alias = "event")]
    Normal,
    /// A filler marking "keep this slot free".
    Rest,
}

/// Repeat rule for an event, tagged the way event records store it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepeatRule {
    /// Single day: the event's start date only.
    #[default]
    None,
    Daily,
    Weekly {
        /// Weekday numbers, Sunday = 0.
        #[serde(rename = "daysOfWeek", default)]
        days_of_week: BTreeSet<u8>,
    },
    Monthly {
        #[serde(rename = "dayOfMonth")]
        day_of_month: u8,
    },
    Interval {
        #[serde(rename = "everyDays")]
        every_days: u32,
    },
    Dates {
        #[serde(rename = "dateList", default)]
        date_list: BTreeSet<NaiveDate>,
    },
}

impl RepeatRule {
    pub fn is_daily(&self) -> bool {
        matches!(self, RepeatRule::Daily)
    }
}

/// A planner event definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Identity; empty until the store assigns one.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: EventKind,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    /// Slot/priority within a day. Positive; uniqueness is not enforced.
    pub range_order: u32,
    /// Minutes the range occupies, 1..=1440. Absent means untimed.
    #[serde(default)]
    pub duration_min: Option<u32>,
    /// Earliest local date the definition is eligible.
    pub start_on: NaiveDate,
    #[serde(default)]
    pub repeat: RepeatRule,
    /// Optional weekday restriction (Sunday = 0) applied on top of `repeat`.
    #[serde(default)]
    pub weekday_filter: BTreeSet<u8>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Create a normal event with the given slot, starting `start_on`.
    pub fn new(
        title: impl Into<String>,
        range_order: u32,
        start_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        let mut event = Self {
            id: String::new(),
            kind: EventKind::Normal,
            title: title.into(),
            notes: String::new(),
            range_order,
            duration_min: None,
            start_on,
            repeat: RepeatRule::None,
            weekday_filter: BTreeSet::new(),
            archived: false,
            created_at: now,
            updated_at: now,
        };
        event.normalize();
        event
    }

    /// Create a rest event for the given slot.
    pub fn new_rest(range_order: u32, start_on: NaiveDate, now: DateTime<Utc>) -> Self {
        let mut event = Self::new(REST_TITLE, range_order, start_on, now);
        event.kind = EventKind::Rest;
        event.normalize();
        event
    }

    pub fn with_repeat(mut self, repeat: RepeatRule) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_duration_min(mut self, minutes: u32) -> Self {
        self.duration_min = Some(clamp_duration(minutes));
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_weekday_filter(mut self, weekdays: BTreeSet<u8>) -> Self {
        self.weekday_filter = weekdays;
        self
    }

    /// Coerce fields into their valid ranges: slot at least 1, duration
    /// clamped, rest events forced to the canonical title with no notes.
    pub fn normalize(&mut self) {
        self.range_order = self.range_order.max(1);
        self.duration_min = self.duration_min.map(clamp_duration);
        if self.kind == EventKind::Rest {
            self.title = REST_TITLE.to_string();
            self.notes.clear();
        }
    }

    /// Rest check; falls back to the canonical title for records that
    /// predate the kind field.
    pub fn is_rest(&self) -> bool {
        self.kind == EventKind::Rest || title_is_rest(&self.title)
    }
}

/// Clamp a duration to the allowed 1..=1440 minute range.
pub fn clamp_duration(minutes: u32) -> u32 {
    minutes.clamp(MIN_DURATION_MIN, MAX_DURATION_MIN)
}

pub(crate) fn title_is_rest(title: &str) -> bool {
    title.trim().eq_ignore_ascii_case(REST_TITLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        crate::date::parse_day_key(s).unwrap()
    }

    #[test]
    fn normalize_clamps_slot_and_duration() {
        let mut event = Event::new("Deep work", 0, day("2026-03-09"), now());
        event.duration_min = Some(5000);
        event.normalize();
        assert_eq!(event.range_order, 1);
        assert_eq!(event.duration_min, Some(MAX_DURATION_MIN));

        let timed = Event::new("Short", 2, day("2026-03-09"), now()).with_duration_min(0);
        assert_eq!(timed.duration_min, Some(MIN_DURATION_MIN));
    }

    #[test]
    fn rest_events_carry_canonical_title() {
        let mut rest = Event::new_rest(3, day("2026-03-09"), now());
        rest.notes = "should vanish".into();
        rest.normalize();
        assert_eq!(rest.title, REST_TITLE);
        assert!(rest.notes.is_empty());
        assert!(rest.is_rest());
    }

    #[test]
    fn rest_detection_falls_back_to_title() {
        let mut event = Event::new(" rest ", 1, day("2026-03-09"), now());
        event.kind = EventKind::Normal;
        assert!(event.is_rest());
        assert!(!Event::new("Focus", 1, day("2026-03-09"), now()).is_rest());
    }

    #[test]
    fn repeat_rule_wire_format() {
        let weekly = RepeatRule::Weekly {
            days_of_week: [1u8, 3, 5].into_iter().collect(),
        };
        let json = serde_json::to_value(&weekly).unwrap();
        assert_eq!(json["type"], "weekly");
        assert_eq!(json["daysOfWeek"], serde_json::json!([1, 3, 5]));

        let parsed: RepeatRule =
            serde_json::from_value(serde_json::json!({ "type": "monthly", "dayOfMonth": 15 }))
                .unwrap();
        assert_eq!(parsed, RepeatRule::Monthly { day_of_month: 15 });

        let bare: RepeatRule = serde_json::from_value(serde_json::json!({ "type": "none" })).unwrap();
        assert_eq!(bare, RepeatRule::None);
    }

    #[test]
    fn event_serializes_camel_case() {
        let event = Event::new("Focus", 2, day("2026-03-09"), now()).with_duration_min(45);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["rangeOrder"], 2);
        assert_eq!(json["durationMin"], 45);
        assert_eq!(json["startOn"], "2026-03-09");
        assert_eq!(json["archived"], false);
    }
}
