//! Agenda range views over the occurrence engine.
//!
//! Three views, anchored on a date: a single day, the Monday-to-Sunday
//! week, and a wide "everything" window. The week view hides daily
//! repeats (they would swamp it); the day view applies the rest override
//! so it shows exactly what a started day would freeze.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::date::{end_of_week, start_of_week};
use crate::event::Event;
use crate::occurrence::Occurrence;
use crate::recurrence::build_occurrences;
use crate::rest::apply_rest_override;

/// Days the "all" view reaches back from the anchor.
const ALL_VIEW_BACK_DAYS: i64 = 14;
/// Days the "all" view reaches forward from the anchor.
const ALL_VIEW_AHEAD_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgendaView {
    #[default]
    Day,
    Week,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgendaRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive day range covered by a view around `anchor`.
pub fn view_range(view: AgendaView, anchor: NaiveDate) -> AgendaRange {
    match view {
        AgendaView::Day => AgendaRange {
            start: anchor,
            end: anchor,
        },
        AgendaView::Week => AgendaRange {
            start: start_of_week(anchor),
            end: end_of_week(anchor),
        },
        AgendaView::All => AgendaRange {
            start: anchor - Duration::days(ALL_VIEW_BACK_DAYS),
            end: anchor + Duration::days(ALL_VIEW_AHEAD_DAYS),
        },
    }
}

/// Move the anchor one step in `direction` (-1 or 1) at the view's pace.
pub fn shift_anchor(view: AgendaView, anchor: NaiveDate, direction: i64) -> NaiveDate {
    let step = match view {
        AgendaView::Day => 1,
        AgendaView::Week => 7,
        AgendaView::All => 30,
    };
    anchor + Duration::days(direction * step)
}

/// Occurrences for a view. The day view is rest-filtered; the week view
/// drops daily repeats.
pub fn agenda_occurrences(events: &[Event], view: AgendaView, anchor: NaiveDate) -> Vec<Occurrence> {
    let range = view_range(view, anchor);
    let mut occurrences = build_occurrences(events, range.start, range.end);
    match view {
        AgendaView::Day => occurrences = apply_rest_override(&occurrences, anchor),
        AgendaView::Week => occurrences.retain(|o| !o.is_daily()),
        AgendaView::All => {}
    }
    occurrences
}
