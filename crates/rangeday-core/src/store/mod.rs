//! Persistence gateway for events and day-session records.
//!
//! The core requires only eventual durability and read-after-write on the
//! same client; the gateway may be a local database or a remote REST
//! collection. Progress maps cross this boundary with string keys (the
//! canonical occurrence-key form); everything in-process uses typed keys.

pub mod http;
pub mod sqlite;

pub use http::HttpStore;
pub use sqlite::SqliteStore;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::event::Event;
use crate::occurrence::Occurrence;
use crate::session::DaySession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

/// Durable form of a day session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Opaque record handle, assigned by the store.
    #[serde(default)]
    pub id: String,
    pub day_key: NaiveDate,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    pub plan: Vec<Occurrence>,
    /// Done flags keyed by occurrence key; canonical or legacy form.
    #[serde(default)]
    pub progress: BTreeMap<String, bool>,
    #[serde(default)]
    pub current_index: usize,
    pub keep_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Snapshot an in-memory session for a durable write.
    pub fn from_session(session: &DaySession, now: DateTime<Utc>) -> Self {
        Self {
            id: session.remote_id.clone().unwrap_or_default(),
            day_key: session.day_key,
            status: SessionStatus::Active,
            started_at: session.started_at,
            ended_at: None,
            plan: session.plan.clone(),
            progress: session
                .progress
                .iter()
                .map(|(id, done)| (id.as_key(), *done))
                .collect(),
            current_index: session.current_index,
            keep_until: session.keep_until,
            created_at: session.started_at,
            updated_at: now,
        }
    }
}

/// CRUD gateway the planner persists through.
pub trait PlannerStore {
    fn list_events(&self) -> Result<Vec<Event>, StoreError>;
    /// Create the record, assigning an id when the event has none.
    fn create_event(&self, event: &Event) -> Result<Event, StoreError>;
    fn update_event(&self, event: &Event) -> Result<Event, StoreError>;
    fn delete_event(&self, id: &str) -> Result<(), StoreError>;

    fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError>;
    /// Create the record, assigning an id when the record has none.
    fn create_session(&self, record: &SessionRecord) -> Result<SessionRecord, StoreError>;
    fn update_session(&self, record: &SessionRecord) -> Result<SessionRecord, StoreError>;
    fn delete_session(&self, id: &str) -> Result<(), StoreError>;
}

impl<S: PlannerStore + ?Sized> PlannerStore for Box<S> {
    fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        (**self).list_events()
    }

    fn create_event(&self, event: &Event) -> Result<Event, StoreError> {
        (**self).create_event(event)
    }

    fn update_event(&self, event: &Event) -> Result<Event, StoreError> {
        (**self).update_event(event)
    }

    fn delete_event(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete_event(id)
    }

    fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        (**self).list_sessions()
    }

    fn create_session(&self, record: &SessionRecord) -> Result<SessionRecord, StoreError> {
        (**self).create_session(record)
    }

    fn update_session(&self, record: &SessionRecord) -> Result<SessionRecord, StoreError> {
        (**self).update_session(record)
    }

    fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete_session(id)
    }
}

/// Returns `~/.config/rangeday[-dev]/` based on RANGEDAY_ENV.
///
/// Set RANGEDAY_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("RANGEDAY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("rangeday-dev")
    } else {
        base_dir.join("rangeday")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
