//! Cached account record with read-after-write synchronization.
//!
//! The controller owns one cached [`UserRecord`]. Writes go to the store
//! and, once accepted, the cache is repopulated from a fresh read of the
//! authoritative row rather than by merging the patch locally, so
//! server-side normalization shows up in the cache.
//!
//! Loads are tagged with a generation; only the most recently issued load
//! may populate the cache, whatever order responses arrive in.

use std::sync::Arc;

use marketplace_identity_sdk::{
    AccountPatch, Filter, IdentityError, Notifier, RecordStore, UserRecord,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{decode_failure, lookup_failure, update_failure};
use super::generation::{Generation, InFlight, Pending};
use crate::config::IdentityConfig;

/// Columns an account update may never write.
pub const IMMUTABLE_COLUMNS: [&str; 2] = ["id", "role"];

/// Snapshot of the controller as seen by a consuming screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountState {
    pub account: Option<UserRecord>,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<IdentityError>,
}

impl AccountState {
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(IdentityError::message)
    }
}

#[derive(Default)]
struct Inner {
    generation: Generation,
    last_id: Option<String>,
    saves_in_flight: usize,
    state: AccountState,
}

impl Pending for Inner {
    fn generation(&mut self) -> &mut Generation {
        &mut self.generation
    }

    fn clear_pending(&mut self) {
        self.state.loading = false;
    }
}

/// Keeps `saving` raised until dropped, so an abandoned update lowers it too.
struct Saving<'a> {
    controller: &'a AccountRecordController,
}

impl Drop for Saving<'_> {
    fn drop(&mut self) {
        self.controller.finish_save();
    }
}

/// Whether a load reports its own failures to the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notify {
    OnFailure,
    Silent,
}

pub struct AccountRecordController {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    users_table: String,
    success_message: String,
    inner: Mutex<Inner>,
    /// Liveness flag checked before every state write and notification.
    /// Never awaited: store calls already issued run to completion.
    lifetime: CancellationToken,
}

impl AccountRecordController {
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        config: &IdentityConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            users_table: config.users_table.clone(),
            success_message: config.update_success_message.clone(),
            inner: Mutex::new(Inner::default()),
            lifetime: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> AccountState {
        self.inner.lock().state.clone()
    }

    /// Id most recently passed to a (non-empty) `load`.
    #[must_use]
    pub fn last_id(&self) -> Option<String> {
        self.inner.lock().last_id.clone()
    }

    /// Stops all further state updates and notifications.
    pub fn teardown(&self) {
        self.lifetime.cancel();
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// Fetches the record for `id` into the cache.
    ///
    /// An empty `id` does nothing and returns `Ok(None)`. The fetched record
    /// is always returned to the caller, even when a newer load has
    /// superseded this one and the cache was left alone.
    ///
    /// # Errors
    /// `NotFound` when no record has this id, `StoreError` when the query
    /// fails, is ambiguous, or returns a malformed row. The cache keeps its
    /// previous value.
    #[instrument(skip(self))]
    pub async fn load(&self, id: &str) -> Result<Option<UserRecord>, IdentityError> {
        self.load_with(id, Notify::OnFailure).await
    }

    /// Loads the last id again; `Ok(None)` if nothing was ever loaded.
    ///
    /// # Errors
    /// Same as [`AccountRecordController::load`].
    pub async fn refetch(&self) -> Result<Option<UserRecord>, IdentityError> {
        let Some(id) = self.last_id() else {
            debug!("refetch requested before any load");
            return Ok(None);
        };
        self.load_with(&id, Notify::OnFailure).await
    }

    /// Sends `patch` for `id` to the store.
    ///
    /// Returns `true` once the store accepts the write; the cache is then
    /// refreshed by a fresh load. Returns `false` when the write is refused,
    /// leaving the cache as it was. Exactly one notification is fired per
    /// call.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: &AccountPatch) -> bool {
        if let Err(err) = Self::validate(id, patch) {
            warn!(error = %err, "account update refused before reaching the store");
            self.record_update_error(err);
            return false;
        }

        let saving = self.begin_save();
        let outcome = self
            .store
            .update_one(&self.users_table, id, &patch.to_fields())
            .await;
        drop(saving);

        match outcome {
            Err(e) => {
                self.record_update_error(update_failure("update", e));
                false
            }
            Ok(()) => {
                info!("account update accepted");
                if !self.is_torn_down() {
                    self.notifier.notify_success(&self.success_message);
                }
                if let Err(err) = self.load_with(id, Notify::Silent).await {
                    warn!(error = %err, "refresh after update failed");
                }
                true
            }
        }
    }

    fn validate(id: &str, patch: &AccountPatch) -> Result<(), IdentityError> {
        if id.is_empty() {
            return Err(IdentityError::update_rejected("Account id is required"));
        }
        if let Some(column) = patch
            .columns()
            .find(|column| IMMUTABLE_COLUMNS.contains(column))
        {
            return Err(IdentityError::update_rejected(format!(
                "Field '{column}' cannot be changed"
            )));
        }
        Ok(())
    }

    async fn load_with(
        &self,
        id: &str,
        notify: Notify,
    ) -> Result<Option<UserRecord>, IdentityError> {
        if id.is_empty() {
            debug!("ignoring load for empty id");
            return Ok(None);
        }

        let request = InFlight::start(&self.inner, &self.lifetime, |inner| {
            inner.last_id = Some(id.to_owned());
            inner.state.loading = true;
            inner.state.error = None;
        });
        let result = self.fetch(id).await;
        let applied = request.settle(|inner| {
            inner.state.loading = false;
            match &result {
                Ok(record) => {
                    inner.state.account = Some(record.clone());
                    inner.state.error = None;
                }
                Err(err) => inner.state.error = Some(err.clone()),
            }
        });
        if !applied {
            debug!("discarding superseded account load");
        }

        if let Err(err) = &result {
            if applied && notify == Notify::OnFailure {
                self.notifier.notify_failure(err.message());
            }
        }
        result.map(Some)
    }

    async fn fetch(&self, id: &str) -> Result<UserRecord, IdentityError> {
        let row = self
            .store
            .query_one(&self.users_table, &Filter::eq("id", id))
            .await
            .map_err(|e| lookup_failure("load", "Account", e))?;
        serde_json::from_value(row).map_err(|e| decode_failure("load", "account record", &e))
    }

    fn begin_save(&self) -> Saving<'_> {
        let mut inner = self.inner.lock();
        if !self.lifetime.is_cancelled() {
            inner.saves_in_flight += 1;
            inner.state.saving = true;
            inner.state.error = None;
        }
        Saving { controller: self }
    }

    fn finish_save(&self) {
        let mut inner = self.inner.lock();
        if self.lifetime.is_cancelled() {
            return;
        }
        inner.saves_in_flight = inner.saves_in_flight.saturating_sub(1);
        inner.state.saving = inner.saves_in_flight > 0;
    }

    fn record_update_error(&self, err: IdentityError) {
        if self.is_torn_down() {
            return;
        }
        self.notifier.notify_failure(err.message());
        self.inner.lock().state.error = Some(err);
    }
}
