//! Occurrence expansion for recurring event definitions.
//!
//! `build_occurrences` is pure: identical inputs always produce the same
//! output, and calling it repeatedly for any range is safe. Cost is
//! O(days x events).

use chrono::{Datelike, NaiveDate};

use crate::date::{days_inclusive, weekday_number};
use crate::event::{Event, RepeatRule};
use crate::occurrence::Occurrence;

/// Expand `events` into occurrences over the inclusive day range.
///
/// Archived events and events without an identity are skipped; no
/// occurrence is emitted before an event's start date. Output is sorted by
/// day ascending, then range order, then event id.
pub fn build_occurrences(
    events: &[Event],
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Vec<Occurrence> {
    let days = days_inclusive(range_start, range_end);
    let mut occurrences = Vec::new();

    for event in events {
        if event.archived || event.id.is_empty() {
            continue;
        }
        for &day in &days {
            if day < event.start_on {
                continue;
            }
            if matches(event, day) {
                occurrences.push(Occurrence::from_event(event, day));
            }
        }
    }

    occurrences.sort_by(|a, b| {
        a.day_key
            .cmp(&b.day_key)
            .then(a.range_order.cmp(&b.range_order))
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
    occurrences
}

/// Whether `event` occurs on `day`. Callers guarantee `day >= start_on`.
///
/// The weekday filter is evaluated first and vetoes every repeat type.
/// Monthly rules skip months shorter than the requested day-of-month; a
/// day 31 rule simply never fires in a 30-day month.
pub fn matches(event: &Event, day: NaiveDate) -> bool {
    if !event.weekday_filter.is_empty() && !event.weekday_filter.contains(&weekday_number(day)) {
        return false;
    }

    match &event.repeat {
        RepeatRule::None => day == event.start_on,
        RepeatRule::Daily => true,
        RepeatRule::Weekly { days_of_week } => days_of_week.contains(&weekday_number(day)),
        RepeatRule::Monthly { day_of_month } => day.day() == u32::from(*day_of_month),
        RepeatRule::Interval { every_days } => {
            let every = i64::from((*every_days).max(1));
            (day - event.start_on).num_days() % every == 0
        }
        RepeatRule::Dates { date_list } => date_list.contains(&day),
    }
}
