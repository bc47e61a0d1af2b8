//! Debounced persistence of the active session.
//!
//! Session mutations are coalesced into a single pending-write value with
//! a deadline; the in-memory session stays authoritative and the durable
//! copy may lag by up to one debounce window. Starting or finalizing a day
//! bypasses the window: the queue is cancelled and the write (or delete)
//! happens immediately, so a stale snapshot cannot resurrect a closed
//! session. There is no background thread -- the caller drives
//! `flush_due`/`flush_now`.

use chrono::{DateTime, Duration, Utc};

use crate::error::StoreError;
use crate::store::{PlannerStore, SessionRecord};

/// Default debounce window for coalescing session writes.
pub const DEFAULT_DEBOUNCE_MS: i64 = 450;

/// A queued session write waiting out its debounce window.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub record: SessionRecord,
    pub due_at: DateTime<Utc>,
}

/// Coalesces session mutations into one durable write.
#[derive(Debug)]
pub struct SaveQueue {
    pending: Option<PendingSave>,
    debounce: Duration,
}

impl SaveQueue {
    pub fn new(debounce_ms: i64) -> Self {
        Self {
            pending: None,
            debounce: Duration::milliseconds(debounce_ms.max(0)),
        }
    }

    /// Queue a snapshot, replacing any pending write and restarting the
    /// debounce window.
    pub fn queue(&mut self, record: SessionRecord, now: DateTime<Utc>) {
        self.pending = Some(PendingSave {
            record,
            due_at: now + self.debounce,
        });
    }

    /// Drop the pending write, if any. Returns it for inspection.
    pub fn cancel(&mut self) -> Option<PendingSave> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|p| p.due_at)
    }

    /// Flush the pending write when its deadline has passed. Returns true
    /// when a write was performed.
    pub fn flush_due<S: PlannerStore>(
        &mut self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match &self.pending {
            Some(pending) if pending.due_at <= now => self.flush_now(store),
            _ => Ok(false),
        }
    }

    /// Flush immediately, regardless of the deadline. On failure the
    /// pending write is dropped; the next mutation queues a fresh snapshot
    /// (optimistic, no automatic retry).
    pub fn flush_now<S: PlannerStore>(&mut self, store: &S) -> Result<bool, StoreError> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        store.update_session(&pending.record)?;
        Ok(true)
    }
}

impl Default for SaveQueue {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::{keep_until, parse_day_key};
    use crate::store::{SessionStatus, SqliteStore};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap()
    }

    fn record(store: &SqliteStore) -> SessionRecord {
        let day = parse_day_key("2026-03-09").unwrap();
        let record = SessionRecord {
            id: String::new(),
            day_key: day,
            status: SessionStatus::Active,
            started_at: now(),
            ended_at: None,
            plan: Vec::new(),
            progress: BTreeMap::new(),
            current_index: 0,
            keep_until: keep_until(day),
            created_at: now(),
            updated_at: now(),
        };
        store.create_session(&record).unwrap()
    }

    #[test]
    fn flush_due_waits_for_the_deadline() {
        let store = SqliteStore::open_memory().unwrap();
        let mut queue = SaveQueue::new(450);
        let mut rec = record(&store);
        rec.current_index = 3;
        queue.queue(rec, now());

        // Window still open: nothing written.
        assert!(!queue.flush_due(&store, now()).unwrap());
        assert!(queue.is_pending());

        // Past the deadline: the coalesced snapshot lands.
        let later = now() + Duration::milliseconds(500);
        assert!(queue.flush_due(&store, later).unwrap());
        assert!(!queue.is_pending());
        assert_eq!(store.list_sessions().unwrap()[0].current_index, 3);
    }

    #[test]
    fn queue_replaces_pending_and_restarts_window() {
        let store = SqliteStore::open_memory().unwrap();
        let mut queue = SaveQueue::new(450);
        let rec = record(&store);

        let mut first = rec.clone();
        first.current_index = 1;
        queue.queue(first, now());

        let mut second = rec;
        second.current_index = 2;
        let later = now() + Duration::milliseconds(300);
        queue.queue(second, later);

        // The first deadline has passed but the window restarted.
        assert!(!queue.flush_due(&store, now() + Duration::milliseconds(460)).unwrap());
        assert!(queue.flush_due(&store, later + Duration::milliseconds(450)).unwrap());
        assert_eq!(store.list_sessions().unwrap()[0].current_index, 2);
    }

    #[test]
    fn cancel_prevents_resurrection() {
        let store = SqliteStore::open_memory().unwrap();
        let mut queue = SaveQueue::new(450);
        let rec = record(&store);
        let id = rec.id.clone();
        queue.queue(rec, now());

        // Finalize path: cancel the pending write, delete immediately.
        assert!(queue.cancel().is_some());
        store.delete_session(&id).unwrap();

        let later = now() + Duration::seconds(5);
        assert!(!queue.flush_due(&store, later).unwrap());
        assert!(store.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn failed_flush_drops_the_snapshot() {
        let store = SqliteStore::open_memory().unwrap();
        let mut queue = SaveQueue::new(0);
        let day = parse_day_key("2026-03-09").unwrap();
        let ghost = SessionRecord {
            id: "never-created".into(),
            day_key: day,
            status: SessionStatus::Active,
            started_at: now(),
            ended_at: None,
            plan: Vec::new(),
            progress: BTreeMap::new(),
            current_index: 0,
            keep_until: keep_until(day),
            created_at: now(),
            updated_at: now(),
        };
        queue.queue(ghost, now());
        assert!(queue.flush_now(&store).is_err());
        assert!(!queue.is_pending());
    }
}
