//! Rest-slot suppression for a single day.
//!
//! Rest is a filler for otherwise-empty slots, not a competing appointment:
//! when a non-daily occurrence claims a slot, the rest occurrence in the
//! same slot is dropped for that day. Daily occurrences coexist with rest.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::occurrence::{sort_plan, Occurrence};

/// Restrict `occurrences` to `day_key`, drop rest entries whose slot is
/// claimed by a non-daily occurrence, and return the result in plan order.
pub fn apply_rest_override(occurrences: &[Occurrence], day_key: NaiveDate) -> Vec<Occurrence> {
    let day_list: Vec<&Occurrence> = occurrences.iter().filter(|o| o.day_key == day_key).collect();

    let claimed: BTreeSet<u32> = day_list
        .iter()
        .filter(|o| !o.is_daily())
        .map(|o| o.range_order)
        .collect();

    let mut filtered: Vec<Occurrence> = day_list
        .into_iter()
        .filter(|o| !o.is_rest() || !claimed.contains(&o.range_order))
        .cloned()
        .collect();

    sort_plan(&mut filtered);
    filtered
}
