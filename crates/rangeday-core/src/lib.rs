//! # Rangeday Core Library
//!
//! Core business logic for Rangeday, a daily planner organized around
//! "ranges" -- ordered slots in a day rather than fixed clock times. The
//! CLI binary (and any GUI layer) is a thin surface over this library.
//!
//! ## Architecture
//!
//! - **Recurrence engine**: pure expansion of event definitions into
//!   per-day occurrences, with rest-slot suppression
//! - **Day sessions**: a state machine freezing today's plan and tracking
//!   progress, with recalculation-under-edit semantics
//! - **Projection**: pure live-timing queries over an active plan
//! - **Storage**: a persistence gateway with SQLite and REST backends,
//!   written through a debounced pending-write queue
//! - **Reconciliation**: boot-time cleanup of stale and duplicate session
//!   records
//!
//! ## Key Components
//!
//! - [`Planner`]: facade the surrounding surface talks to
//! - [`SessionManager`]: day-session state machine
//! - [`build_occurrences`]: recurrence expansion
//! - [`PlannerStore`]: persistence gateway trait

pub mod agenda;
pub mod config;
pub mod date;
pub mod error;
pub mod event;
pub mod events;
pub mod occurrence;
pub mod pending;
pub mod planner;
pub mod projector;
pub mod reconcile;
pub mod recurrence;
pub mod rest;
pub mod session;
pub mod store;

pub use agenda::{agenda_occurrences, shift_anchor, view_range, AgendaRange, AgendaView};
pub use config::{Config, PersistenceConfig, StoreBackend};
pub use error::{ConfigError, CoreError, Result, StoreError, ValidationError};
pub use event::{Event, EventKind, RepeatRule};
pub use events::PlannerEvent;
pub use occurrence::{Occurrence, OccurrenceId};
pub use pending::{SaveQueue, DEFAULT_DEBOUNCE_MS};
pub use planner::{CurrentRange, Planner, StatusSnapshot};
pub use projector::{project_schedule, total_remaining, ScheduleItem};
pub use reconcile::{adopt, reconcile, ReconcileDecision, ReconcileSummary};
pub use recurrence::build_occurrences;
pub use rest::apply_rest_override;
pub use session::{plan_for_day, DaySession, RecalcOutcome, SessionManager};
pub use store::{HttpStore, PlannerStore, SessionRecord, SessionStatus, SqliteStore};
