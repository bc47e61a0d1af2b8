//! Day-session lifecycle state machine.
//!
//! A day session freezes the filtered plan for "today" when the day is
//! started and tracks per-occurrence progress plus a current pointer.
//! The manager owns the single active session as an explicit value; every
//! command is synchronous and either transitions or reports a
//! `ValidationError` without transitioning.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Active        (start)
//! Active -> Active      (toggle | mark_current_done | advance | recalc)
//! Active -> Idle        (finalize, or recalc collapsing to an empty plan)
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::date::keep_until;
use crate::error::ValidationError;
use crate::event::Event;
use crate::occurrence::{Occurrence, OccurrenceId};
use crate::recurrence::build_occurrences;
use crate::rest::apply_rest_override;

/// The filtered plan for one day: expand, rest-override, plan order.
pub fn plan_for_day(events: &[Event], day_key: NaiveDate) -> Vec<Occurrence> {
    let occurrences = build_occurrences(events, day_key, day_key);
    apply_rest_override(&occurrences, day_key)
}

/// An active "day started" session.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySession {
    pub day_key: NaiveDate,
    pub started_at: DateTime<Utc>,
    /// Ordered snapshot of the day's occurrences, frozen at start or the
    /// last recalculation.
    pub plan: Vec<Occurrence>,
    /// Per-occurrence done flags; the key set always equals the plan's.
    pub progress: BTreeMap<OccurrenceId, bool>,
    pub current_index: usize,
    pub keep_until: DateTime<Utc>,
    /// Handle of the durable record, once created.
    pub remote_id: Option<String>,
}

impl DaySession {
    pub fn total(&self) -> usize {
        self.plan.len()
    }

    pub fn done_count(&self) -> usize {
        self.progress.values().filter(|done| **done).count()
    }

    /// Display state only; finalize stays a separate explicit action.
    pub fn is_complete(&self) -> bool {
        self.total() > 0 && self.done_count() == self.total()
    }

    pub fn is_done(&self, id: &OccurrenceId) -> bool {
        self.progress.get(id).copied().unwrap_or(false)
    }

    /// Self-healing read of the current occurrence: a pointer at a done or
    /// out-of-range slot is repaired to the first not-done occurrence.
    /// None when the plan is empty or fully done.
    pub fn current_occurrence(&mut self) -> Option<&Occurrence> {
        let pointer_ok = self
            .plan
            .get(self.current_index)
            .map(|occ| !self.is_done(&occ.id()))
            .unwrap_or(false);
        if pointer_ok {
            return self.plan.get(self.current_index);
        }
        let idx = self.first_not_done()?;
        self.current_index = idx;
        self.plan.get(idx)
    }

    fn first_not_done(&self) -> Option<usize> {
        self.plan.iter().position(|occ| !self.is_done(&occ.id()))
    }

    /// Forward circular scan from the slot after the pointer, wrapping
    /// once; the pointer stays put when everything is done.
    fn advance_pointer(&mut self) {
        let total = self.plan.len();
        if total == 0 {
            return;
        }
        for step in 1..=total {
            let idx = (self.current_index + step) % total;
            if !self.is_done(&self.plan[idx].id()) {
                self.current_index = idx;
                return;
            }
        }
    }
}

/// Result of recalculating an active plan after event CRUD.
#[derive(Debug, Clone, PartialEq)]
pub enum RecalcOutcome {
    /// No session was active; nothing to do.
    Idle,
    /// The plan was rebuilt in place.
    Updated,
    /// The plan collapsed to empty; the session was closed. Carries the
    /// discarded session so the caller can delete its durable record.
    Closed(DaySession),
}

/// Owns the single active day session.
#[derive(Debug, Default)]
pub struct SessionManager {
    active: Option<DaySession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&DaySession> {
        self.active.as_ref()
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut DaySession> {
        self.active.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Install a session rebuilt from a durable record (reconciliation).
    pub fn adopt(&mut self, session: DaySession) {
        self.active = Some(session);
    }

    /// Start a day session. Rejected when another session is active, when
    /// `day_key` is not today, or when the filtered plan is empty.
    pub fn start(
        &mut self,
        day_key: NaiveDate,
        today: NaiveDate,
        events: &[Event],
        now: DateTime<Utc>,
    ) -> Result<&DaySession, ValidationError> {
        if let Some(active) = &self.active {
            return Err(ValidationError::AlreadyActive {
                day_key: active.day_key,
            });
        }
        if day_key != today {
            return Err(ValidationError::NotToday { day_key, today });
        }
        let plan = plan_for_day(events, day_key);
        if plan.is_empty() {
            return Err(ValidationError::EmptyPlan { day_key });
        }

        let progress = plan.iter().map(|occ| (occ.id(), false)).collect();
        Ok(self.active.insert(DaySession {
            day_key,
            started_at: now,
            plan,
            progress,
            current_index: 0,
            keep_until: keep_until(day_key),
            remote_id: None,
        }))
    }

    /// Flip one occurrence's done flag. Toggling twice is an involution.
    /// When the current occurrence is flipped to done the pointer advances.
    pub fn toggle(&mut self, id: &OccurrenceId) -> Result<bool, ValidationError> {
        let session = self.active.as_mut().ok_or(ValidationError::NoActiveSession)?;
        let Some(flag) = session.progress.get(id).copied() else {
            return Err(ValidationError::UnknownOccurrence(id.to_string()));
        };
        let was_current = session
            .plan
            .get(session.current_index)
            .map(|occ| occ.id() == *id)
            .unwrap_or(false);

        let done = !flag;
        session.progress.insert(id.clone(), done);
        if was_current && done {
            session.advance_pointer();
        }
        Ok(done)
    }

    /// One-way variant of toggle: mark the current occurrence done (never
    /// clears) and advance. Returns None when there is nothing left to mark.
    pub fn mark_current_done(&mut self) -> Result<Option<OccurrenceId>, ValidationError> {
        let session = self.active.as_mut().ok_or(ValidationError::NoActiveSession)?;
        let Some(current_id) = session.current_occurrence().map(Occurrence::id) else {
            return Ok(None);
        };
        session.progress.insert(current_id.clone(), true);
        session.advance_pointer();
        Ok(Some(current_id))
    }

    /// Manual skip: move the pointer to the next not-done occurrence
    /// without touching progress. Returns the new current id.
    pub fn advance(&mut self) -> Result<Option<OccurrenceId>, ValidationError> {
        let session = self.active.as_mut().ok_or(ValidationError::NoActiveSession)?;
        session.advance_pointer();
        Ok(session.current_occurrence().map(Occurrence::id))
    }

    /// Rebuild the plan for the active day from the current events.
    ///
    /// Progress carries forward only for occurrence ids still present;
    /// the pointer follows the same occurrence when it survives not-done,
    /// otherwise falls to the first not-done slot, otherwise 0. An empty
    /// recomputed plan closes the session.
    pub fn recalc(&mut self, events: &[Event]) -> RecalcOutcome {
        let day_key = match &self.active {
            Some(session) => session.day_key,
            None => return RecalcOutcome::Idle,
        };

        let new_plan = plan_for_day(events, day_key);
        if new_plan.is_empty() {
            return match self.active.take() {
                Some(closed) => RecalcOutcome::Closed(closed),
                None => RecalcOutcome::Idle,
            };
        }

        let session = match self.active.as_mut() {
            Some(session) => session,
            None => return RecalcOutcome::Idle,
        };

        let old_current = session.current_occurrence().map(Occurrence::id);

        let new_progress: BTreeMap<OccurrenceId, bool> = new_plan
            .iter()
            .map(|occ| {
                let id = occ.id();
                let done = session.progress.get(&id).copied().unwrap_or(false);
                (id, done)
            })
            .collect();

        session.plan = new_plan;
        session.progress = new_progress;

        let new_index = old_current
            .and_then(|id| {
                if session.is_done(&id) {
                    None
                } else {
                    session.plan.iter().position(|occ| occ.id() == id)
                }
            })
            .or_else(|| session.first_not_done())
            .unwrap_or(0);
        session.current_index = new_index;

        RecalcOutcome::Updated
    }

    /// Close the session and return it so the caller can delete the
    /// durable record immediately.
    pub fn finalize(&mut self) -> Result<DaySession, ValidationError> {
        self.active.take().ok_or(ValidationError::NoActiveSession)
    }

    pub fn current_occurrence(&mut self) -> Option<&Occurrence> {
        self.active.as_mut().and_then(DaySession::current_occurrence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::parse_day_key;
    use crate::event::{Event, RepeatRule};
    use chrono::TimeZone;

    fn day(s: &str) -> NaiveDate {
        parse_day_key(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        day("2026-03-09")
    }

    fn event(id: &str, range_order: u32, repeat: RepeatRule) -> Event {
        let mut event = Event::new(format!("Event {id}"), range_order, today(), now())
            .with_repeat(repeat);
        event.id = id.into();
        event
    }

    fn occ_id(event_id: &str) -> OccurrenceId {
        OccurrenceId::new(event_id, today())
    }

    fn started_manager(events: &[Event]) -> SessionManager {
        let mut manager = SessionManager::new();
        manager
            .start(today(), today(), events, now())
            .expect("start");
        manager
    }

    #[test]
    fn start_rejects_non_today() {
        let events = vec![event("a", 1, RepeatRule::Daily)];
        let mut manager = SessionManager::new();
        let err = manager
            .start(day("2026-03-10"), today(), &events, now())
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotToday { .. }));
        assert!(!manager.is_active());
    }

    #[test]
    fn start_rejects_empty_plan() {
        let mut manager = SessionManager::new();
        let err = manager.start(today(), today(), &[], now()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyPlan { day_key: today() });
    }

    #[test]
    fn start_rejects_second_session() {
        let events = vec![event("a", 1, RepeatRule::Daily)];
        let mut manager = started_manager(&events);
        let err = manager.start(today(), today(), &events, now()).unwrap_err();
        assert_eq!(err, ValidationError::AlreadyActive { day_key: today() });
    }

    #[test]
    fn start_freezes_plan_with_all_false_progress() {
        let events = vec![
            event("b", 2, RepeatRule::Daily),
            event("a", 1, RepeatRule::None),
        ];
        let manager = started_manager(&events);
        let session = manager.active().unwrap();
        assert_eq!(session.total(), 2);
        assert_eq!(session.plan[0].event_id, "a");
        assert_eq!(session.plan[1].event_id, "b");
        assert_eq!(session.done_count(), 0);
        assert_eq!(session.current_index, 0);
    }

    #[test]
    fn toggle_twice_is_involution() {
        let events = vec![event("a", 1, RepeatRule::Daily)];
        let mut manager = started_manager(&events);
        assert!(manager.toggle(&occ_id("a")).unwrap());
        assert!(!manager.toggle(&occ_id("a")).unwrap());
        assert!(!manager.active().unwrap().is_done(&occ_id("a")));
    }

    #[test]
    fn toggle_unknown_id_is_rejected() {
        let events = vec![event("a", 1, RepeatRule::Daily)];
        let mut manager = started_manager(&events);
        let err = manager.toggle(&occ_id("ghost")).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownOccurrence(_)));
    }

    #[test]
    fn toggling_current_to_done_advances_pointer() {
        let events = vec![
            event("a", 1, RepeatRule::None),
            event("b", 2, RepeatRule::Daily),
        ];
        let mut manager = started_manager(&events);
        manager.toggle(&occ_id("a")).unwrap();
        assert_eq!(manager.current_occurrence().unwrap().event_id, "b");
    }

    #[test]
    fn toggling_non_current_leaves_pointer() {
        let events = vec![
            event("a", 1, RepeatRule::Daily),
            event("b", 2, RepeatRule::Daily),
        ];
        let mut manager = started_manager(&events);
        manager.toggle(&occ_id("b")).unwrap();
        assert_eq!(manager.current_occurrence().unwrap().event_id, "a");
    }

    #[test]
    fn mark_current_done_is_one_way() {
        let events = vec![
            event("a", 1, RepeatRule::Daily),
            event("b", 2, RepeatRule::Daily),
        ];
        let mut manager = started_manager(&events);
        assert_eq!(manager.mark_current_done().unwrap(), Some(occ_id("a")));
        assert_eq!(manager.mark_current_done().unwrap(), Some(occ_id("b")));
        // Everything done: nothing left to mark, progress untouched.
        assert_eq!(manager.mark_current_done().unwrap(), None);
        assert!(manager.active().unwrap().is_complete());
    }

    #[test]
    fn advance_skips_without_touching_progress() {
        let events = vec![
            event("a", 1, RepeatRule::Daily),
            event("b", 2, RepeatRule::Daily),
        ];
        let mut manager = started_manager(&events);
        assert_eq!(manager.advance().unwrap(), Some(occ_id("b")));
        assert_eq!(manager.active().unwrap().done_count(), 0);
        // Wraps around.
        assert_eq!(manager.advance().unwrap(), Some(occ_id("a")));
    }

    #[test]
    fn current_heals_to_first_not_done() {
        let events = vec![
            event("a", 1, RepeatRule::Daily),
            event("b", 2, RepeatRule::Daily),
            event("c", 3, RepeatRule::Daily),
        ];
        let mut manager = started_manager(&events);
        manager.toggle(&occ_id("a")).unwrap();
        manager.toggle(&occ_id("b")).unwrap();
        assert_eq!(manager.current_occurrence().unwrap().event_id, "c");

        manager.toggle(&occ_id("c")).unwrap();
        assert!(manager.current_occurrence().is_none());
    }

    #[test]
    fn current_heals_out_of_range_pointer() {
        let events = vec![event("a", 1, RepeatRule::Daily)];
        let mut manager = started_manager(&events);
        manager.active_mut().unwrap().current_index = 42;
        assert_eq!(manager.current_occurrence().unwrap().event_id, "a");
        assert_eq!(manager.active().unwrap().current_index, 0);
    }

    #[test]
    fn recalc_keeps_progress_for_surviving_occurrences() {
        // Spec scenario: A (slot 1, single day) done, B (slot 2, daily)
        // edited while active.
        let mut events = vec![
            event("a", 1, RepeatRule::None),
            event("b", 2, RepeatRule::Daily),
        ];
        let mut manager = started_manager(&events);
        manager.toggle(&occ_id("a")).unwrap();
        assert_eq!(manager.current_occurrence().unwrap().event_id, "b");

        events[1].duration_min = Some(60);
        assert_eq!(manager.recalc(&events), RecalcOutcome::Updated);

        let session = manager.active().unwrap();
        assert_eq!(session.total(), 2);
        assert!(session.is_done(&occ_id("a")));
        assert!(!session.is_done(&occ_id("b")));
        assert_eq!(session.plan[1].duration_min, Some(60));
    }

    #[test]
    fn recalc_progress_keys_match_plan_exactly() {
        let mut events = vec![
            event("a", 1, RepeatRule::Daily),
            event("b", 2, RepeatRule::Daily),
        ];
        let mut manager = started_manager(&events);

        events.remove(0);
        events.push(event("c", 3, RepeatRule::Daily));
        manager.recalc(&events);

        let session = manager.active().unwrap();
        let plan_ids: Vec<OccurrenceId> = session.plan.iter().map(Occurrence::id).collect();
        let progress_ids: Vec<OccurrenceId> = session.progress.keys().cloned().collect();
        assert_eq!(plan_ids, progress_ids);
        assert_eq!(plan_ids, vec![occ_id("b"), occ_id("c")]);
    }

    #[test]
    fn recalc_pointer_follows_surviving_occurrence() {
        let mut events = vec![
            event("a", 1, RepeatRule::Daily),
            event("b", 2, RepeatRule::Daily),
        ];
        let mut manager = started_manager(&events);
        manager.advance().unwrap(); // current: b

        // Reorder: b moves to slot 1, a to slot 3.
        events[1].range_order = 1;
        events[0].range_order = 3;
        manager.recalc(&events);

        assert_eq!(manager.current_occurrence().unwrap().event_id, "b");
        assert_eq!(manager.active().unwrap().current_index, 0);
    }

    #[test]
    fn recalc_empty_plan_closes_session() {
        let events = vec![event("a", 1, RepeatRule::None)];
        let mut manager = started_manager(&events);
        match manager.recalc(&[]) {
            RecalcOutcome::Closed(closed) => assert_eq!(closed.day_key, today()),
            other => panic!("expected Closed, got {other:?}"),
        }
        assert!(!manager.is_active());
        assert_eq!(manager.recalc(&[]), RecalcOutcome::Idle);
    }

    #[test]
    fn rest_suppression_applies_at_start() {
        let mut rest = Event::new_rest(2, today(), now()).with_repeat(RepeatRule::Daily);
        rest.id = "rest".into();
        let events = vec![rest, event("meet", 2, RepeatRule::None)];
        let manager = started_manager(&events);
        let session = manager.active().unwrap();
        assert_eq!(session.total(), 1);
        assert_eq!(session.plan[0].event_id, "meet");
    }

    #[test]
    fn finalize_discards_session() {
        let events = vec![event("a", 1, RepeatRule::Daily)];
        let mut manager = started_manager(&events);
        let closed = manager.finalize().unwrap();
        assert_eq!(closed.day_key, today());
        assert!(!manager.is_active());
        assert_eq!(
            manager.finalize().unwrap_err(),
            ValidationError::NoActiveSession
        );
    }
}
