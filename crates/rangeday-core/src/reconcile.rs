//! Boot-time reconciliation of durable day-session records.
//!
//! Hydration may find expired records (past their retention deadline or
//! older than yesterday) and, after a crash or a second client, more than
//! one record claiming to be active. The decision of what to delete and
//! what to adopt is a pure function; the planner applies it against the
//! gateway.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::occurrence::{sort_plan, OccurrenceId};
use crate::session::DaySession;
use crate::store::{SessionRecord, SessionStatus};

/// What reconciliation did, for display.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    /// Records inspected.
    pub scanned: usize,
    /// Records past their retention window.
    pub expired: usize,
    /// Surplus active records collapsed by last-started-wins.
    pub duplicates: usize,
    /// Deletes that failed at the gateway (best-effort cleanup).
    pub delete_failures: usize,
    /// Day of the adopted session, if one survived.
    pub adopted_day: Option<NaiveDate>,
}

impl ReconcileSummary {
    pub fn message(&self) -> String {
        match self.adopted_day {
            Some(day) => format!(
                "Resumed the session for {day} ({} stale record(s) removed).",
                self.expired + self.duplicates
            ),
            None if self.expired + self.duplicates > 0 => format!(
                "Removed {} stale session record(s).",
                self.expired + self.duplicates
            ),
            None => "No session records to reconcile.".to_string(),
        }
    }
}

/// Outcome of the pure reconcile step.
#[derive(Debug, Clone)]
pub struct ReconcileDecision {
    /// Record ids to delete from the gateway.
    pub delete: Vec<String>,
    /// The single active record to adopt, if any.
    pub keep: Option<SessionRecord>,
    pub summary: ReconcileSummary,
}

/// Decide which records to delete and which single active record survives.
///
/// A record is expired when `now` is past its retention deadline or its day
/// is older than yesterday (two-day window: today and yesterday only, to
/// tolerate use shortly after local midnight). Among the surviving active
/// records the latest `started_at` wins -- last-started, not last-updated.
pub fn reconcile(
    records: Vec<SessionRecord>,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> ReconcileDecision {
    let yesterday = today - Duration::days(1);

    let mut summary = ReconcileSummary {
        scanned: records.len(),
        ..ReconcileSummary::default()
    };
    let mut delete = Vec::new();
    let mut live = Vec::new();

    for record in records {
        let expired = now > record.keep_until;
        let older_than_yesterday = record.day_key < yesterday;
        if expired || older_than_yesterday {
            summary.expired += 1;
            delete.push(record.id);
        } else {
            live.push(record);
        }
    }

    let mut actives: Vec<SessionRecord> = live
        .into_iter()
        .filter(|r| r.status == SessionStatus::Active && r.day_key >= yesterday)
        .collect();
    actives.sort_by(|a, b| b.started_at.cmp(&a.started_at));

    let keep = if actives.is_empty() {
        None
    } else {
        Some(actives.remove(0))
    };
    for extra in actives {
        summary.duplicates += 1;
        delete.push(extra.id);
    }

    summary.adopted_day = keep.as_ref().map(|r| r.day_key);
    ReconcileDecision {
        delete,
        keep,
        summary,
    }
}

/// Rebuild an in-memory session from a durable record.
///
/// Every occurrence id is recomputed from (event id, day key) rather than
/// trusting anything stored; progress entries are looked up under the
/// canonical key first, then under the legacy key that embedded the range
/// order. The plan is re-sorted into plan order and the progress key set is
/// rebuilt to match it exactly.
pub fn adopt(record: SessionRecord) -> DaySession {
    let mut plan = record.plan;
    sort_plan(&mut plan);

    let mut progress: BTreeMap<OccurrenceId, bool> = BTreeMap::new();
    for occ in &plan {
        let id = occ.id();
        let done = record
            .progress
            .get(&id.as_key())
            .or_else(|| record.progress.get(&id.legacy_key(occ.range_order)))
            .copied()
            .unwrap_or(false);
        progress.insert(id, done);
    }

    DaySession {
        day_key: record.day_key,
        started_at: record.started_at,
        plan,
        progress,
        current_index: record.current_index,
        keep_until: record.keep_until,
        remote_id: if record.id.is_empty() {
            None
        } else {
            Some(record.id)
        },
    }
}
