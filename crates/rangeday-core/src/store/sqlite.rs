//! SQLite-backed planner store.
//!
//! Events and day-session records live in two tables at
//! `~/.config/rangeday/rangeday.db`. Structured fields (repeat rules,
//! plans, progress maps) are stored as JSON columns.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{data_dir, PlannerStore, SessionRecord, SessionStatus};
use crate::date::{format_day_key, parse_day_key};
use crate::error::StoreError;
use crate::event::{Event, EventKind, RepeatRule};
use crate::occurrence::Occurrence;

fn format_kind(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Normal => "normal",
        EventKind::Rest => "rest",
    }
}

fn parse_kind(kind_str: &str) -> EventKind {
    match kind_str {
        "rest" => EventKind::Rest,
        _ => EventKind::Normal,
    }
}

fn format_status(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Active => "active",
        SessionStatus::Ended => "ended",
    }
}

fn parse_status(status_str: &str) -> SessionStatus {
    match status_str {
        "active" => SessionStatus::Active,
        _ => SessionStatus::Ended,
    }
}

/// Parse an RFC3339 timestamp with fallback to the current time.
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

struct EventRow {
    id: String,
    kind: String,
    title: String,
    notes: String,
    range_order: i64,
    duration_min: Option<i64>,
    start_on: String,
    repeat: String,
    weekday_filter: String,
    archived: bool,
    created_at: String,
    updated_at: String,
}

struct SessionRow {
    id: String,
    day_key: String,
    status: String,
    started_at: String,
    ended_at: Option<String>,
    plan: String,
    progress: String,
    current_index: i64,
    keep_until: String,
    created_at: String,
    updated_at: String,
}

fn row_to_event(row: EventRow) -> Result<Event, StoreError> {
    let repeat: RepeatRule = serde_json::from_str(&row.repeat)
        .map_err(|e| StoreError::Decode(format!("repeat for event {}: {e}", row.id)))?;
    let weekday_filter: BTreeSet<u8> = serde_json::from_str(&row.weekday_filter)
        .map_err(|e| StoreError::Decode(format!("weekday filter for event {}: {e}", row.id)))?;
    let start_on = parse_day_key(&row.start_on)
        .ok_or_else(|| StoreError::Decode(format!("start date for event {}", row.id)))?;

    Ok(Event {
        id: row.id,
        kind: parse_kind(&row.kind),
        title: row.title,
        notes: row.notes,
        range_order: row.range_order.max(1) as u32,
        duration_min: row.duration_min.map(|d| d.clamp(1, 1440) as u32),
        start_on,
        repeat,
        weekday_filter,
        archived: row.archived,
        created_at: parse_datetime_fallback(&row.created_at),
        updated_at: parse_datetime_fallback(&row.updated_at),
    })
}

fn row_to_session(row: SessionRow) -> Result<SessionRecord, StoreError> {
    let plan: Vec<Occurrence> = serde_json::from_str(&row.plan)
        .map_err(|e| StoreError::Decode(format!("plan for session {}: {e}", row.id)))?;
    let progress: BTreeMap<String, bool> = serde_json::from_str(&row.progress)
        .map_err(|e| StoreError::Decode(format!("progress for session {}: {e}", row.id)))?;
    let day_key = parse_day_key(&row.day_key)
        .ok_or_else(|| StoreError::Decode(format!("day key for session {}", row.id)))?;

    Ok(SessionRecord {
        id: row.id,
        day_key,
        status: parse_status(&row.status),
        started_at: parse_datetime_fallback(&row.started_at),
        ended_at: row.ended_at.as_deref().map(parse_datetime_fallback),
        plan,
        progress,
        current_index: row.current_index.max(0) as usize,
        keep_until: parse_datetime_fallback(&row.keep_until),
        created_at: parse_datetime_fallback(&row.created_at),
        updated_at: parse_datetime_fallback(&row.updated_at),
    })
}

/// SQLite database holding events and day-session records.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database at `~/.config/rangeday/rangeday.db`, creating the
    /// file and schema as needed.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Self::open_at(dir.join("rangeday.db"))
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, StoreError> {
        let conn =
            Connection::open(&path).map_err(|source| StoreError::OpenFailed { path, source })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS events (
                id             TEXT PRIMARY KEY,
                kind           TEXT NOT NULL DEFAULT 'normal',
                title          TEXT NOT NULL,
                notes          TEXT NOT NULL DEFAULT '',
                range_order    INTEGER NOT NULL,
                duration_min   INTEGER,
                start_on       TEXT NOT NULL,
                repeat         TEXT NOT NULL,
                weekday_filter TEXT NOT NULL DEFAULT '[]',
                archived       INTEGER NOT NULL DEFAULT 0,
                created_at     TEXT NOT NULL,
                updated_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS day_sessions (
                id            TEXT PRIMARY KEY,
                day_key       TEXT NOT NULL,
                status        TEXT NOT NULL,
                started_at    TEXT NOT NULL,
                ended_at      TEXT,
                plan          TEXT NOT NULL,
                progress      TEXT NOT NULL,
                current_index INTEGER NOT NULL DEFAULT 0,
                keep_until    TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_day_sessions_status ON day_sessions(status);
            CREATE INDEX IF NOT EXISTS idx_day_sessions_day_key ON day_sessions(day_key);",
        )?;
        Ok(())
    }

    fn event_rows(&self) -> Result<Vec<EventRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, title, notes, range_order, duration_min, start_on,
                    repeat, weekday_filter, archived, created_at, updated_at
             FROM events ORDER BY range_order, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EventRow {
                id: row.get(0)?,
                kind: row.get(1)?,
                title: row.get(2)?,
                notes: row.get(3)?,
                range_order: row.get(4)?,
                duration_min: row.get(5)?,
                start_on: row.get(6)?,
                repeat: row.get(7)?,
                weekday_filter: row.get(8)?,
                archived: row.get(9)?,
                created_at: row.get(10)?,
                updated_at: row.get(11)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn session_rows(&self) -> Result<Vec<SessionRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, day_key, status, started_at, ended_at, plan, progress,
                    current_index, keep_until, created_at, updated_at
             FROM day_sessions ORDER BY started_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                day_key: row.get(1)?,
                status: row.get(2)?,
                started_at: row.get(3)?,
                ended_at: row.get(4)?,
                plan: row.get(5)?,
                progress: row.get(6)?,
                current_index: row.get(7)?,
                keep_until: row.get(8)?,
                created_at: row.get(9)?,
                updated_at: row.get(10)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn write_event(&self, event: &Event, insert: bool) -> Result<usize, StoreError> {
        let repeat = serde_json::to_string(&event.repeat)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let weekday_filter = serde_json::to_string(&event.weekday_filter)
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let sql = if insert {
            "INSERT INTO events (kind, title, notes, range_order, duration_min, start_on,
                                 repeat, weekday_filter, archived, created_at, updated_at, id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        } else {
            "UPDATE events SET kind = ?1, title = ?2, notes = ?3, range_order = ?4,
                               duration_min = ?5, start_on = ?6, repeat = ?7,
                               weekday_filter = ?8, archived = ?9, created_at = ?10,
                               updated_at = ?11
             WHERE id = ?12"
        };

        let changed = self.conn.execute(
            sql,
            params![
                format_kind(event.kind),
                event.title,
                event.notes,
                event.range_order,
                event.duration_min,
                format_day_key(event.start_on),
                repeat,
                weekday_filter,
                event.archived,
                event.created_at.to_rfc3339(),
                event.updated_at.to_rfc3339(),
                event.id,
            ],
        )?;
        Ok(changed)
    }

    fn write_session(&self, record: &SessionRecord, insert: bool) -> Result<usize, StoreError> {
        let plan = serde_json::to_string(&record.plan)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let progress = serde_json::to_string(&record.progress)
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let sql = if insert {
            "INSERT INTO day_sessions (day_key, status, started_at, ended_at, plan, progress,
                                       current_index, keep_until, created_at, updated_at, id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        } else {
            "UPDATE day_sessions SET day_key = ?1, status = ?2, started_at = ?3, ended_at = ?4,
                                     plan = ?5, progress = ?6, current_index = ?7,
                                     keep_until = ?8, created_at = ?9, updated_at = ?10
             WHERE id = ?11"
        };

        let changed = self.conn.execute(
            sql,
            params![
                format_day_key(record.day_key),
                format_status(record.status),
                record.started_at.to_rfc3339(),
                record.ended_at.map(|dt| dt.to_rfc3339()),
                plan,
                progress,
                record.current_index as i64,
                record.keep_until.to_rfc3339(),
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
                record.id,
            ],
        )?;
        Ok(changed)
    }
}

impl PlannerStore for SqliteStore {
    fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.event_rows()?.into_iter().map(row_to_event).collect()
    }

    fn create_event(&self, event: &Event) -> Result<Event, StoreError> {
        let mut stored = event.clone();
        if stored.id.is_empty() {
            stored.id = Uuid::new_v4().to_string();
        }
        self.write_event(&stored, true)?;
        Ok(stored)
    }

    fn update_event(&self, event: &Event) -> Result<Event, StoreError> {
        let changed = self.write_event(event, false)?;
        if changed == 0 {
            return Err(StoreError::NotFound(event.id.clone()));
        }
        Ok(event.clone())
    }

    fn delete_event(&self, id: &str) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        self.session_rows()?.into_iter().map(row_to_session).collect()
    }

    fn create_session(&self, record: &SessionRecord) -> Result<SessionRecord, StoreError> {
        let mut stored = record.clone();
        if stored.id.is_empty() {
            stored.id = Uuid::new_v4().to_string();
        }
        self.write_session(&stored, true)?;
        Ok(stored)
    }

    fn update_session(&self, record: &SessionRecord) -> Result<SessionRecord, StoreError> {
        let changed = self.write_session(record, false)?;
        if changed == 0 {
            return Err(StoreError::NotFound(record.id.clone()));
        }
        Ok(record.clone())
    }

    fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM day_sessions WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::keep_until;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap()
    }

    fn sample_event() -> Event {
        let day = parse_day_key("2026-03-09").unwrap();
        Event::new("Focus block", 2, day, now())
            .with_duration_min(45)
            .with_repeat(RepeatRule::Weekly {
                days_of_week: [1u8, 3].into_iter().collect(),
            })
    }

    fn sample_record(store: &SqliteStore) -> SessionRecord {
        let day = parse_day_key("2026-03-09").unwrap();
        let event = store.create_event(&sample_event()).unwrap();
        let occ = Occurrence::from_event(&event, day);
        SessionRecord {
            id: String::new(),
            day_key: day,
            status: SessionStatus::Active,
            started_at: now(),
            ended_at: None,
            plan: vec![occ.clone()],
            progress: [(occ.id().as_key(), false)].into_iter().collect(),
            current_index: 0,
            keep_until: keep_until(day),
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn event_crud_round_trip() {
        let store = SqliteStore::open_memory().unwrap();
        let created = store.create_event(&sample_event()).unwrap();
        assert!(!created.id.is_empty());

        let listed = store.list_events().unwrap();
        assert_eq!(listed, vec![created.clone()]);

        let mut edited = created.clone();
        edited.title = "Renamed".into();
        edited.duration_min = Some(60);
        store.update_event(&edited).unwrap();
        assert_eq!(store.list_events().unwrap()[0].title, "Renamed");

        store.delete_event(&created.id).unwrap();
        assert!(store.list_events().unwrap().is_empty());
    }

    #[test]
    fn update_missing_event_is_not_found() {
        let store = SqliteStore::open_memory().unwrap();
        let mut event = sample_event();
        event.id = "ghost".into();
        assert!(matches!(
            store.update_event(&event),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_event("ghost"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn session_crud_round_trip() {
        let store = SqliteStore::open_memory().unwrap();
        let created = store.create_session(&sample_record(&store)).unwrap();
        assert!(!created.id.is_empty());

        let listed = store.list_sessions().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], created);

        let mut edited = created.clone();
        edited.current_index = 1;
        for done in edited.progress.values_mut() {
            *done = true;
        }
        store.update_session(&edited).unwrap();
        let reloaded = store.list_sessions().unwrap();
        assert_eq!(reloaded[0].current_index, 1);
        assert!(reloaded[0].progress.values().all(|done| *done));

        store.delete_session(&created.id).unwrap();
        assert!(store.list_sessions().unwrap().is_empty());
    }
}
