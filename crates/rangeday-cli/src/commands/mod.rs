//! CLI command implementations.

pub mod agenda;
pub mod config;
pub mod day;
pub mod event;

use chrono::Utc;
use rangeday_core::date::today_local;
use rangeday_core::{Config, HttpStore, Planner, PlannerStore, SqliteStore, StoreBackend};

/// Open the configured store, build a planner, and hydrate it (loading
/// events and reconciling any leftover day-session records).
pub fn open_planner() -> Result<Planner<Box<dyn PlannerStore>>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store: Box<dyn PlannerStore> = match config.persistence.backend {
        StoreBackend::Local => Box::new(SqliteStore::open()?),
        StoreBackend::Remote => {
            let base = config
                .persistence
                .api_base_url
                .as_deref()
                .ok_or("remote backend selected but persistence.api_base_url is not set")?;
            Box::new(HttpStore::new(base)?)
        }
    };

    let mut planner = Planner::new(store).with_debounce_ms(config.persistence.debounce_ms);
    planner.hydrate(today_local(), Utc::now())?;
    Ok(planner)
}
