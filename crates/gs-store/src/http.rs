//! HTTP backend (feature `http`).
//!
//! Speaks the JSON request surface toward an out-of-process sink, so the
//! pipeline can feed a remote persistence service instead of a local file.
//! Uses a blocking client on purpose: batch hand-offs already run on
//! blocking tasks, and queries are operator actions, not hot-path work.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use gs_core::{PersistedPosition, PositionRecord};

use crate::sink::{BulkOutcome, PositionStore};
use crate::{QueryOptions, StoreError, StoreResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A [`PositionStore`] speaking HTTP/JSON to a remote sink.
pub struct RemoteStore {
    base_url: String,
    client:   Client,
}

impl RemoteStore {
    /// Build a client for the sink rooted at `base_url`
    /// (e.g. `http://localhost:7152/api`).
    pub fn new(base_url: impl Into<String>) -> StoreResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { base_url, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

impl PositionStore for RemoteStore {
    fn insert(&self, record: &PositionRecord) -> StoreResult<PersistedPosition> {
        let response = self
            .client
            .post(self.url("positions"))
            .json(record)
            .send()?;
        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::Conflict {
                latitude:  record.latitude,
                longitude: record.longitude,
            });
        }
        Ok(response.error_for_status()?.json()?)
    }

    fn insert_bulk(&self, batch: &[PositionRecord]) -> StoreResult<BulkOutcome> {
        // The sink rejects empty arrays; fail fast without a round-trip.
        if batch.is_empty() {
            return Err(StoreError::EmptyBatch);
        }
        let response = self
            .client
            .post(self.url("positions/bulk"))
            .json(&batch)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }

    fn get(&self, id: i64) -> StoreResult<PersistedPosition> {
        let response = self.client.get(self.url(&format!("positions/{id}"))).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id));
        }
        Ok(response.error_for_status()?.json()?)
    }

    fn query(&self, opts: &QueryOptions) -> StoreResult<Vec<PersistedPosition>> {
        let mut params: Vec<(&str, String)> = Vec::with_capacity(3);
        if let Some(inside) = opts.inside {
            params.push(("inside", inside.to_string()));
        }
        params.push(("sort", opts.sort.wire_name().to_string()));
        params.push(("asc", opts.ascending.to_string()));

        let response = self
            .client
            .get(self.url("positions/filtered"))
            .query(&params)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }

    fn delete(&self, id: i64) -> StoreResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("positions/{id}")))
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id));
        }
        response.error_for_status()?;
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        self.client
            .delete(self.url("positions"))
            .send()?
            .error_for_status()?;
        Ok(())
    }
}
