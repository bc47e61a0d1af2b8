//! Live timing projection over an active plan.
//!
//! Projection is pure arithmetic over the session's start instant and the
//! frozen plan: each item starts where the previous one ends. It is
//! recomputed for display on demand and is never a transition source.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::occurrence::{Occurrence, OccurrenceId};

/// One projected plan item. Untimed occurrences have `start == end`; they
/// occupy no time but still count toward progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: OccurrenceId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScheduleItem {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Walk the plan in order, accumulating start/end boundaries from
/// `started_at`.
pub fn project_schedule(started_at: DateTime<Utc>, plan: &[Occurrence]) -> Vec<ScheduleItem> {
    let mut cursor = started_at;
    plan.iter()
        .map(|occ| {
            let end = cursor + occ.duration();
            let item = ScheduleItem {
                id: occ.id(),
                start: cursor,
                end,
            };
            cursor = end;
            item
        })
        .collect()
}

/// Seconds left in `item` at `now`, clamped at zero.
pub fn remaining_in(item: &ScheduleItem, now: DateTime<Utc>) -> Duration {
    (item.end - now).max(Duration::zero())
}

/// Seconds spent inside `item` at `now`, clamped at zero.
pub fn elapsed_in(item: &ScheduleItem, now: DateTime<Utc>) -> Duration {
    (now - item.start).max(Duration::zero())
}

/// Aggregate remaining time across not-done items. Each item contributes
/// `max(0, end - max(now, start))`, so time the user skipped past without
/// marking done is not counted.
pub fn total_remaining(
    schedule: &[ScheduleItem],
    progress: &BTreeMap<OccurrenceId, bool>,
    now: DateTime<Utc>,
) -> Duration {
    schedule
        .iter()
        .filter(|item| !progress.get(&item.id).copied().unwrap_or(false))
        .fold(Duration::zero(), |acc, item| {
            let floor = if now > item.start { now } else { item.start };
            acc + (item.end - floor).max(Duration::zero())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::parse_day_key;
    use crate::event::Event;
    use chrono::{NaiveDate, TimeZone};

    fn day(s: &str) -> NaiveDate {
        parse_day_key(s).unwrap()
    }

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap()
    }

    fn plan(durations: &[Option<u32>]) -> Vec<Occurrence> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let mut event = Event::new(format!("Item {i}"), (i + 1) as u32, day("2026-03-09"), started());
                event.id = format!("ev{i}");
                event.duration_min = *d;
                Occurrence::from_event(&event, day("2026-03-09"))
            })
            .collect()
    }

    #[test]
    fn boundaries_accumulate_from_start() {
        let schedule = project_schedule(started(), &plan(&[Some(30), Some(0), Some(45)]));
        let t = started();
        assert_eq!(schedule[0].start, t);
        assert_eq!(schedule[0].end, t + Duration::minutes(30));
        assert_eq!(schedule[1].start, t + Duration::minutes(30));
        assert_eq!(schedule[1].end, t + Duration::minutes(30));
        assert_eq!(schedule[2].start, t + Duration::minutes(30));
        assert_eq!(schedule[2].end, t + Duration::minutes(75));
    }

    #[test]
    fn untimed_item_has_zero_footprint() {
        let schedule = project_schedule(started(), &plan(&[None]));
        assert_eq!(schedule[0].start, schedule[0].end);
        assert_eq!(schedule[0].duration(), Duration::zero());
    }

    #[test]
    fn remaining_clamps_at_zero() {
        let schedule = project_schedule(started(), &plan(&[Some(30)]));
        let past_end = started() + Duration::minutes(45);
        assert_eq!(remaining_in(&schedule[0], past_end), Duration::zero());
        let midway = started() + Duration::minutes(10);
        assert_eq!(remaining_in(&schedule[0], midway), Duration::minutes(20));
        assert_eq!(elapsed_in(&schedule[0], midway), Duration::minutes(10));
    }

    #[test]
    fn total_remaining_skips_done_and_elapsed_time() {
        let plan = plan(&[Some(30), Some(30), Some(30)]);
        let schedule = project_schedule(started(), &plan);
        let mut progress: BTreeMap<OccurrenceId, bool> =
            plan.iter().map(|o| (o.id(), false)).collect();
        progress.insert(plan[0].id(), true);

        // 40 minutes in: item 0 is done, item 1 has 20 minutes left,
        // item 2 has not begun.
        let now = started() + Duration::minutes(40);
        assert_eq!(
            total_remaining(&schedule, &progress, now),
            Duration::minutes(20 + 30)
        );
    }

    #[test]
    fn total_remaining_excludes_skipped_past_time() {
        // User advanced past item 0 without marking it done; its window is
        // already fully elapsed, so it contributes nothing.
        let plan = plan(&[Some(30), Some(30)]);
        let schedule = project_schedule(started(), &plan);
        let progress: BTreeMap<OccurrenceId, bool> =
            plan.iter().map(|o| (o.id(), false)).collect();

        let now = started() + Duration::minutes(35);
        assert_eq!(
            total_remaining(&schedule, &progress, now),
            Duration::minutes(25)
        );
    }
}
