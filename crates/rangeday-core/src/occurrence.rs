//! Derived occurrences and their composite identity.
//!
//! An occurrence is one calendar-day instantiation of an event definition.
//! Its identity is the pair (event id, day key) -- stable across range-order
//! edits. The string form of the id exists only at the persistence boundary;
//! everything in-process works with the typed key.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::date::{format_day_key, parse_day_key};
use crate::event::{title_is_rest, Event, RepeatRule};

/// Composite identity of one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceId {
    pub event_id: String,
    pub day_key: NaiveDate,
}

impl OccurrenceId {
    pub fn new(event_id: impl Into<String>, day_key: NaiveDate) -> Self {
        Self {
            event_id: event_id.into(),
            day_key,
        }
    }

    /// Canonical string form used for durable progress-map keys.
    pub fn as_key(&self) -> String {
        format!("{}__{}", self.event_id, format_day_key(self.day_key))
    }

    /// Older records also embedded the range order in the key.
    pub fn legacy_key(&self, range_order: u32) -> String {
        format!(
            "{}__{}__R{}",
            self.event_id,
            format_day_key(self.day_key),
            range_order
        )
    }

    /// Parse the canonical string form back into a typed key.
    pub fn parse_key(key: &str) -> Option<Self> {
        let (event_id, day) = key.rsplit_once("__")?;
        Some(Self::new(event_id, parse_day_key(day)?))
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// Snapshot of an event on one concrete day. Derived, never the source of
/// truth; the id is recomputed from the fields rather than stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub event_id: String,
    pub day_key: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    pub range_order: u32,
    #[serde(default)]
    pub duration_min: Option<u32>,
    #[serde(default)]
    pub repeat: RepeatRule,
}

impl Occurrence {
    pub fn from_event(event: &Event, day_key: NaiveDate) -> Self {
        Self {
            event_id: event.id.clone(),
            day_key,
            title: event.title.clone(),
            notes: event.notes.clone(),
            range_order: event.range_order,
            duration_min: event.duration_min,
            repeat: event.repeat.clone(),
        }
    }

    pub fn id(&self) -> OccurrenceId {
        OccurrenceId::new(self.event_id.clone(), self.day_key)
    }

    pub fn is_daily(&self) -> bool {
        self.repeat.is_daily()
    }

    pub fn is_rest(&self) -> bool {
        title_is_rest(&self.title)
    }

    /// Projected time footprint. Untimed occurrences occupy zero time.
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_min.unwrap_or(0)))
    }
}

/// Plan ordering: range order ascending, event id lexical tiebreak.
pub fn plan_order(a: &Occurrence, b: &Occurrence) -> Ordering {
    a.range_order
        .cmp(&b.range_order)
        .then_with(|| a.event_id.cmp(&b.event_id))
}

/// Sort a single day's occurrences into plan order.
pub fn sort_plan(occurrences: &mut [Occurrence]) {
    occurrences.sort_by(plan_order);
}
