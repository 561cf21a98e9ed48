//! In-memory record store.
//!
//! Stands in for the remote auth/data provider in tests and local runs.
//! Besides plain storage it can model a few things a real backend does:
//! server-side normalization of written rows, outages of the query or
//! update path, and response latency.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use marketplace_identity_sdk::{Filter, RecordStore, Session, SessionSource, StoreError};
use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Rewrites a row after a patch has been merged into it.
pub type Normalizer = Arc<dyn Fn(&mut Map<String, Value>) + Send + Sync>;

#[derive(Default)]
struct Faults {
    query: Option<String>,
    update: Option<String>,
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<String, Vec<Map<String, Value>>>>,
    session: RwLock<Option<Session>>,
    normalizers: RwLock<HashMap<String, Normalizer>>,
    faults: RwLock<Faults>,
    latency: RwLock<HashMap<String, Duration>>,
    queries: AtomicUsize,
    updates: AtomicUsize,
}

impl InMemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row to `table`.
    ///
    /// # Errors
    /// Fails when `row` is not a JSON object.
    pub fn insert(&self, table: &str, row: Value) -> anyhow::Result<()> {
        let Value::Object(row) = row else {
            anyhow::bail!("rows must be JSON objects");
        };
        self.tables
            .write()
            .entry(table.to_owned())
            .or_default()
            .push(row);
        Ok(())
    }

    /// Current contents of the row with `id`, if any.
    #[must_use]
    pub fn row(&self, table: &str, id: &str) -> Option<Value> {
        self.tables
            .read()
            .get(table)?
            .iter()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            .map(|row| Value::Object(row.clone()))
    }

    pub fn sign_in(&self, user_id: &str) {
        *self.session.write() = Some(Session::new(user_id));
    }

    pub fn sign_out(&self) {
        *self.session.write() = None;
    }

    /// Installs a normalizer applied to every row of `table` after an update.
    pub fn set_normalizer(&self, table: &str, normalizer: Normalizer) {
        self.normalizers
            .write()
            .insert(table.to_owned(), normalizer);
    }

    /// Makes every query fail with `message` (or stop failing with `None`).
    pub fn fail_queries(&self, message: Option<&str>) {
        self.faults.write().query = message.map(ToOwned::to_owned);
    }

    /// Makes every update fail with `message` (or stop failing with `None`).
    pub fn fail_updates(&self, message: Option<&str>) {
        self.faults.write().update = message.map(ToOwned::to_owned);
    }

    /// Delays by `delay` every query filtered on an `id` or `role` equal to
    /// `key`, and every update of the row whose id is `key`.
    pub fn set_latency(&self, key: &str, delay: Duration) {
        self.latency.write().insert(key.to_owned(), delay);
    }

    /// Number of queries received so far, failed ones included.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Number of updates received so far, failed ones included.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn query_fault(&self) -> Result<(), StoreError> {
        match &self.faults.read().query {
            Some(message) => Err(StoreError::transport(message.as_str())),
            None => Ok(()),
        }
    }

    fn delay_for(&self, filter: &Filter) -> Option<Duration> {
        let latency = self.latency.read();
        ["id", "role"]
            .into_iter()
            .filter_map(|column| filter.value_of(column)?.as_str())
            .find_map(|key| latency.get(key).copied())
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn matching(&self, table: &str, filter: &Filter) -> Vec<Map<String, Value>> {
        self.tables
            .read()
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionSource for InMemoryRecordStore {
    async fn current_session(&self) -> Option<Session> {
        self.session.read().clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn query_one(&self, table: &str, filter: &Filter) -> Result<Value, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Self::pause(self.delay_for(filter)).await;
        self.query_fault()?;

        let mut rows = self.matching(table, filter);
        match rows.len() {
            0 => Err(StoreError::NotFound),
            1 => Ok(Value::Object(rows.remove(0))),
            count => Err(StoreError::Ambiguous { count }),
        }
    }

    async fn query_many(
        &self,
        table: &str,
        filter: &Filter,
        columns: &[&str],
    ) -> Result<Vec<Value>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Self::pause(self.delay_for(filter)).await;
        self.query_fault()?;

        let rows = self
            .matching(table, filter)
            .into_iter()
            .map(|row| {
                if columns.is_empty() {
                    return Value::Object(row);
                }
                let projected: Map<String, Value> = row
                    .into_iter()
                    .filter(|(column, _)| columns.contains(&column.as_str()))
                    .collect();
                Value::Object(projected)
            })
            .collect();
        Ok(rows)
    }

    async fn update_one(
        &self,
        table: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let delay = self.latency.read().get(id).copied();
        Self::pause(delay).await;
        if let Some(message) = &self.faults.read().update {
            return Err(StoreError::transport(message.as_str()));
        }

        let normalizer = self.normalizers.read().get(table).cloned();
        let mut tables = self.tables.write();
        let row = tables
            .get_mut(table)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or(StoreError::NotFound)?;

        for (column, value) in patch {
            row.insert(column.clone(), value.clone());
        }
        if let Some(normalize) = normalizer {
            normalize(row);
        }
        Ok(())
    }
}
