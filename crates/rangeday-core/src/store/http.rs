//! REST-backed planner store.
//!
//! Talks to a hosted endpoint exposing `events/` and `sessions/`
//! collections with JSON bodies. The client is blocking; the core is
//! single-threaded and every durable operation is synchronous from the
//! caller's view.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::{PlannerStore, SessionRecord};
use crate::error::StoreError;
use crate::event::Event;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Planner store backed by a remote REST endpoint.
pub struct HttpStore {
    base: Url,
    client: Client,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized)
            .map_err(|_| StoreError::InvalidBaseUrl(base_url.to_string()))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::RequestFailed {
                url: normalized,
                message: e.to_string(),
            })?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base
            .join(path)
            .map_err(|_| StoreError::InvalidBaseUrl(format!("{}{path}", self.base)))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| request_failed(&url, e))?;
        decode(url, response)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .map_err(|e| request_failed(&url, e))?;
        decode(url, response)
    }

    fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .put(url.clone())
            .json(body)
            .send()
            .map_err(|e| request_failed(&url, e))?;
        decode(url, response)
    }

    fn delete(&self, path: &str) -> Result<(), StoreError> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .delete(url.clone())
            .send()
            .map_err(|e| request_failed(&url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::BadStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }
}

fn request_failed(url: &Url, err: reqwest::Error) -> StoreError {
    StoreError::RequestFailed {
        url: url.to_string(),
        message: err.to_string(),
    }
}

fn decode<T: DeserializeOwned>(
    url: Url,
    response: reqwest::blocking::Response,
) -> Result<T, StoreError> {
    let status = response.status();
    if !status.is_success() {
        return Err(StoreError::BadStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    response.json().map_err(|e| StoreError::Decode(e.to_string()))
}

impl PlannerStore for HttpStore {
    fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.get_json("events")
    }

    fn create_event(&self, event: &Event) -> Result<Event, StoreError> {
        self.post_json("events", event)
    }

    fn update_event(&self, event: &Event) -> Result<Event, StoreError> {
        self.put_json(&format!("events/{}", event.id), event)
    }

    fn delete_event(&self, id: &str) -> Result<(), StoreError> {
        self.delete(&format!("events/{id}"))
    }

    fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        self.get_json("sessions")
    }

    fn create_session(&self, record: &SessionRecord) -> Result<SessionRecord, StoreError> {
        self.post_json("sessions", record)
    }

    fn update_session(&self, record: &SessionRecord) -> Result<SessionRecord, StoreError> {
        self.put_json(&format!("sessions/{}", record.id), record)
    }

    fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        self.delete(&format!("sessions/{id}"))
    }
}
