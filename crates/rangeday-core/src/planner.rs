//! High-level facade over the store, session manager, reconciliation, and
//! debounced saves.
//!
//! The surrounding surface (CLI or GUI) talks to a `Planner`: it hydrates
//! once at startup, mutates events and the active session through it, and
//! drives the pending-write queue. Event CRUD automatically recalculates
//! an active plan. In-memory state is authoritative; a store failure never
//! rolls it back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::agenda::{agenda_occurrences, AgendaView};
use crate::date::format_hms;
use crate::error::Result;
use crate::event::Event;
use crate::events::PlannerEvent;
use crate::occurrence::{Occurrence, OccurrenceId};
use crate::pending::SaveQueue;
use crate::projector::{
    elapsed_in, project_schedule, remaining_in, total_remaining, ScheduleItem,
};
use crate::reconcile::{adopt, reconcile, ReconcileSummary};
use crate::session::{DaySession, RecalcOutcome, SessionManager};
use crate::store::{PlannerStore, SessionRecord, SessionStatus};

/// Display snapshot of the current range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRange {
    pub occurrence: OccurrenceId,
    pub title: String,
    pub range_order: u32,
    /// True when the range has no duration; there is nothing to count down.
    pub untimed: bool,
    pub remaining_secs: i64,
    pub remaining_hms: String,
    pub elapsed_secs: i64,
}

/// Display snapshot of the active session at a given instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub day_key: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub done_count: usize,
    pub total: usize,
    /// Everything done. A display state; finalizing stays explicit.
    pub completed: bool,
    pub current: Option<CurrentRange>,
    pub total_remaining_secs: i64,
    pub total_remaining_hms: String,
}

/// Facade wiring the persistence gateway to the engines.
pub struct Planner<S: PlannerStore> {
    store: S,
    events: Vec<Event>,
    sessions: SessionManager,
    saves: SaveQueue,
}

impl<S: PlannerStore> Planner<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            events: Vec::new(),
            sessions: SessionManager::new(),
            saves: SaveQueue::default(),
        }
    }

    pub fn with_debounce_ms(mut self, debounce_ms: i64) -> Self {
        self.saves = SaveQueue::new(debounce_ms);
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn find_event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn active_session(&self) -> Option<&DaySession> {
        self.sessions.active()
    }

    pub fn has_pending_save(&self) -> bool {
        self.saves.is_pending()
    }

    /// Next free slot: one past the highest range order in use.
    pub fn suggested_range_order(&self) -> u32 {
        self.events
            .iter()
            .map(|e| e.range_order)
            .max()
            .unwrap_or(0)
            + 1
    }

    // ── Startup ──────────────────────────────────────────────────────

    /// Load events, reconcile day-session records, and adopt the surviving
    /// active session, if any.
    pub fn hydrate(&mut self, today: NaiveDate, now: DateTime<Utc>) -> Result<ReconcileSummary> {
        self.events = self.store.list_events()?;

        let records = self.store.list_sessions()?;
        let decision = reconcile(records, today, now);
        let mut summary = decision.summary;
        for id in &decision.delete {
            // Best-effort cleanup; a failed delete is retried at next boot.
            if self.store.delete_session(id).is_err() {
                summary.delete_failures += 1;
            }
        }
        if let Some(record) = decision.keep {
            self.sessions.adopt(adopt(record));
        }
        Ok(summary)
    }

    // ── Event CRUD ───────────────────────────────────────────────────

    pub fn create_event(
        &mut self,
        mut event: Event,
        now: DateTime<Utc>,
    ) -> Result<(Event, Option<PlannerEvent>)> {
        event.normalize();
        event.updated_at = now;
        let created = self.store.create_event(&event)?;
        self.events.push(created.clone());
        let note = self.recalc_after_crud(now)?;
        Ok((created, note))
    }

    pub fn update_event(
        &mut self,
        mut event: Event,
        now: DateTime<Utc>,
    ) -> Result<(Event, Option<PlannerEvent>)> {
        event.normalize();
        event.updated_at = now;
        let stored = self.store.update_event(&event)?;
        if let Some(position) = self.events.iter().position(|e| e.id == stored.id) {
            self.events[position] = stored.clone();
        } else {
            self.events.push(stored.clone());
        }
        let note = self.recalc_after_crud(now)?;
        Ok((stored, note))
    }

    pub fn delete_event(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PlannerEvent>> {
        self.store.delete_event(id)?;
        self.events.retain(|e| e.id != id);
        self.recalc_after_crud(now)
    }

    /// Commit a new slot ordering: range orders become 1..n following the
    /// given event ids. Returns how many events changed.
    pub fn reorder_events(
        &mut self,
        ordered_event_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<(usize, Option<PlannerEvent>)> {
        let mut changed = 0;
        for (index, event_id) in ordered_event_ids.iter().enumerate() {
            let new_order = (index + 1) as u32;
            let Some(position) = self.events.iter().position(|e| e.id == *event_id) else {
                continue;
            };
            if self.events[position].range_order == new_order {
                continue;
            }
            let mut updated = self.events[position].clone();
            updated.range_order = new_order;
            updated.updated_at = now;
            let stored = self.store.update_event(&updated)?;
            self.events[position] = stored;
            changed += 1;
        }
        let note = self.recalc_after_crud(now)?;
        Ok((changed, note))
    }

    // ── Day session commands ─────────────────────────────────────────

    /// Start today's session and create its durable record immediately,
    /// bypassing the debounce.
    ///
    /// The single-active invariant is protected opportunistically: lingering
    /// active records are deleted before the create, with no transactional
    /// guarantee against a genuinely concurrent second writer.
    pub fn start_day(
        &mut self,
        day_key: NaiveDate,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<PlannerEvent> {
        let (total, record) = {
            let session = self.sessions.start(day_key, today, &self.events, now)?;
            (session.total(), SessionRecord::from_session(session, now))
        };

        if let Ok(existing) = self.store.list_sessions() {
            for stale in existing.iter().filter(|r| r.status == SessionStatus::Active) {
                // Best-effort sweep; hydrate-time reconciliation retries.
                let _ = self.store.delete_session(&stale.id);
            }
        }

        self.saves.cancel();
        let created = self.store.create_session(&record)?;
        if let Some(session) = self.sessions.active_mut() {
            session.remote_id = Some(created.id.clone());
        }

        Ok(PlannerEvent::DayStarted {
            day_key,
            total,
            at: now,
        })
    }

    pub fn toggle(&mut self, id: &OccurrenceId, now: DateTime<Utc>) -> Result<PlannerEvent> {
        let done = self.sessions.toggle(id)?;
        self.queue_save(now);
        Ok(PlannerEvent::ProgressToggled {
            occurrence: id.clone(),
            done,
            at: now,
        })
    }

    pub fn mark_current_done(&mut self, now: DateTime<Utc>) -> Result<Option<PlannerEvent>> {
        let Some(marked) = self.sessions.mark_current_done()? else {
            return Ok(None);
        };
        self.queue_save(now);
        Ok(Some(PlannerEvent::CurrentMarkedDone {
            occurrence: marked,
            at: now,
        }))
    }

    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<PlannerEvent> {
        let next = self.sessions.advance()?;
        self.queue_save(now);
        Ok(PlannerEvent::PointerAdvanced {
            occurrence: next,
            at: now,
        })
    }

    /// Close the session: cancel any pending write and delete the durable
    /// record immediately, bypassing the debounce.
    pub fn finalize_day(&mut self, now: DateTime<Utc>) -> Result<PlannerEvent> {
        self.saves.cancel();
        let closed = self.sessions.finalize()?;
        if let Some(remote_id) = &closed.remote_id {
            self.store.delete_session(remote_id)?;
        }
        Ok(PlannerEvent::DayFinalized {
            day_key: closed.day_key,
            done_count: closed.done_count(),
            total: closed.total(),
            at: now,
        })
    }

    pub fn current_occurrence(&mut self) -> Option<&Occurrence> {
        self.sessions.current_occurrence()
    }

    // ── Persistence queue ────────────────────────────────────────────

    /// Flush the pending session write when its deadline has passed.
    pub fn flush_due(&mut self, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.saves.flush_due(&self.store, now)?)
    }

    /// Flush the pending session write immediately.
    pub fn flush_now(&mut self) -> Result<bool> {
        Ok(self.saves.flush_now(&self.store)?)
    }

    // ── Display queries ──────────────────────────────────────────────

    /// Projected boundaries of the active plan, if a session is running.
    pub fn project_schedule(&self) -> Option<Vec<ScheduleItem>> {
        self.sessions
            .active()
            .map(|s| project_schedule(s.started_at, &s.plan))
    }

    /// Live status at `now`. Heals a stale pointer as a side effect.
    pub fn status(&mut self, now: DateTime<Utc>) -> Option<StatusSnapshot> {
        let current_id = self.sessions.current_occurrence().map(Occurrence::id);
        let session = self.sessions.active()?;
        let schedule = project_schedule(session.started_at, &session.plan);
        let total_rem = total_remaining(&schedule, &session.progress, now);

        let current = current_id.and_then(|id| {
            let occ = session.plan.iter().find(|o| o.id() == id)?;
            let item = schedule.iter().find(|i| i.id == id)?;
            let remaining = remaining_in(item, now).num_seconds();
            Some(CurrentRange {
                occurrence: id,
                title: occ.title.clone(),
                range_order: occ.range_order,
                untimed: item.start == item.end,
                remaining_secs: remaining,
                remaining_hms: format_hms(remaining),
                elapsed_secs: elapsed_in(item, now).num_seconds(),
            })
        });

        Some(StatusSnapshot {
            day_key: session.day_key,
            started_at: session.started_at,
            done_count: session.done_count(),
            total: session.total(),
            completed: session.is_complete(),
            current,
            total_remaining_secs: total_rem.num_seconds(),
            total_remaining_hms: format_hms(total_rem.num_seconds()),
        })
    }

    /// Occurrences for a view. When the anchor day has an active session
    /// the frozen plan is returned instead of a fresh computation.
    pub fn agenda(&self, view: AgendaView, anchor: NaiveDate) -> Vec<Occurrence> {
        if view == AgendaView::Day {
            if let Some(session) = self.sessions.active() {
                if session.day_key == anchor {
                    return session.plan.clone();
                }
            }
        }
        agenda_occurrences(&self.events, view, anchor)
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Recalculate an active plan after event CRUD. An empty result closes
    /// the session and deletes its record rather than persisting an
    /// invalid active state.
    fn recalc_after_crud(&mut self, now: DateTime<Utc>) -> Result<Option<PlannerEvent>> {
        match self.sessions.recalc(&self.events) {
            RecalcOutcome::Idle => Ok(None),
            RecalcOutcome::Updated => {
                self.queue_save(now);
                let session = match self.sessions.active() {
                    Some(session) => session,
                    None => return Ok(None),
                };
                Ok(Some(PlannerEvent::PlanRecalculated {
                    day_key: session.day_key,
                    total: session.total(),
                    at: now,
                }))
            }
            RecalcOutcome::Closed(closed) => {
                self.saves.cancel();
                if let Some(remote_id) = &closed.remote_id {
                    self.store.delete_session(remote_id)?;
                }
                Ok(Some(PlannerEvent::DayClosed {
                    day_key: closed.day_key,
                    at: now,
                }))
            }
        }
    }

    fn queue_save(&mut self, now: DateTime<Utc>) {
        if let Some(session) = self.sessions.active() {
            if session.remote_id.is_some() {
                self.saves.queue(SessionRecord::from_session(session, now), now);
            }
        }
    }
}
