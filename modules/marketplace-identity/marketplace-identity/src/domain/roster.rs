//! Read-only role rosters.

use std::sync::Arc;

use marketplace_identity_sdk::{Filter, IdentityError, RecordStore, Role, RosterEntry};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::error::{decode_failure, query_failure};
use super::generation::{Generation, InFlight, Pending};
use crate::config::IdentityConfig;

/// Snapshot of a roster reader. `roster` is empty, never absent, when
/// nothing has loaded or the last load failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RosterState {
    pub roster: Vec<RosterEntry>,
    pub loading: bool,
    pub error: Option<IdentityError>,
}

impl RosterState {
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(IdentityError::message)
    }
}

#[derive(Default)]
struct Inner {
    generation: Generation,
    state: RosterState,
}

impl Pending for Inner {
    fn generation(&mut self) -> &mut Generation {
        &mut self.generation
    }

    fn clear_pending(&mut self) {
        self.state.loading = false;
    }
}

pub struct RoleFilteredRosterReader {
    store: Arc<dyn RecordStore>,
    users_table: String,
    mount_role: Role,
    inner: Mutex<Inner>,
    /// Liveness flag only; see [`RoleFilteredRosterReader::teardown`].
    lifetime: CancellationToken,
}

impl RoleFilteredRosterReader {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, config: &IdentityConfig) -> Self {
        Self {
            store,
            users_table: config.users_table.clone(),
            mount_role: config.roster_role,
            inner: Mutex::new(Inner::default()),
            lifetime: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> RosterState {
        self.inner.lock().state.clone()
    }

    /// Looks up an entry of the currently loaded roster.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<RosterEntry> {
        self.inner
            .lock()
            .state
            .roster
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    /// Stops all further state updates. A load already in flight still
    /// returns its result to its caller.
    pub fn teardown(&self) {
        self.lifetime.cancel();
    }

    /// Loads the roster for the configured role.
    ///
    /// # Errors
    /// Same as [`RoleFilteredRosterReader::load_roster`].
    pub async fn mount(&self) -> Result<Vec<RosterEntry>, IdentityError> {
        self.load_roster(self.mount_role).await
    }

    /// Loads every participant holding `role`, in store order, projected to
    /// `id`, `name`, `business_name` and `email`.
    ///
    /// # Errors
    /// `StoreError` when the query fails or a row is malformed; the roster
    /// state is then empty.
    #[instrument(skip(self), fields(role = %role))]
    pub async fn load_roster(&self, role: Role) -> Result<Vec<RosterEntry>, IdentityError> {
        let request = InFlight::start(&self.inner, &self.lifetime, |inner| {
            inner.state.loading = true;
            inner.state.error = None;
        });
        let result = self.fetch(role).await;
        let settled = request.settle(|inner| {
            inner.state = match &result {
                Ok(roster) => RosterState {
                    roster: roster.clone(),
                    loading: false,
                    error: None,
                },
                Err(err) => RosterState {
                    roster: Vec::new(),
                    loading: false,
                    error: Some(err.clone()),
                },
            };
        });
        if !settled {
            debug!("discarding superseded roster load");
        }
        result
    }

    async fn fetch(&self, role: Role) -> Result<Vec<RosterEntry>, IdentityError> {
        let rows = self
            .store
            .query_many(
                &self.users_table,
                &Filter::eq("role", role.as_str()),
                &RosterEntry::COLUMNS,
            )
            .await
            .map_err(|e| query_failure("load_roster", e))?;

        let roster = rows
            .into_iter()
            .map(serde_json::from_value::<RosterEntry>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_failure("load_roster", "roster entry", &e))?;

        debug!(count = roster.len(), "roster loaded");
        Ok(roster)
    }
}
