//! Notifications produced by planner commands.
//!
//! Every state change returns one of these; the surrounding surface (CLI
//! or GUI) renders them. They are plain data -- emitting one has no side
//! effects.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::occurrence::OccurrenceId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlannerEvent {
    DayStarted {
        day_key: NaiveDate,
        total: usize,
        at: DateTime<Utc>,
    },
    ProgressToggled {
        occurrence: OccurrenceId,
        done: bool,
        at: DateTime<Utc>,
    },
    CurrentMarkedDone {
        occurrence: OccurrenceId,
        at: DateTime<Utc>,
    },
    /// Manual skip; `occurrence` is the new current, if any remains.
    PointerAdvanced {
        occurrence: Option<OccurrenceId>,
        at: DateTime<Utc>,
    },
    /// The active plan was rebuilt after event CRUD.
    PlanRecalculated {
        day_key: NaiveDate,
        total: usize,
        at: DateTime<Utc>,
    },
    /// Recalculation emptied the plan; the session was closed.
    DayClosed {
        day_key: NaiveDate,
        at: DateTime<Utc>,
    },
    DayFinalized {
        day_key: NaiveDate,
        done_count: usize,
        total: usize,
        at: DateTime<Utc>,
    },
}
