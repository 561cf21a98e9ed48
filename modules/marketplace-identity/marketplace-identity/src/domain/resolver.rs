//! Role-gated identity resolution.

use std::sync::Arc;

use marketplace_identity_sdk::{
    Filter, IdentityError, RecordStore, ResolvedIdentity, Role, Session, SessionSource, UserRecord,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::error::{decode_failure, lookup_failure};
use super::generation::{Generation, InFlight, Pending};
use crate::config::IdentityConfig;

/// Snapshot of a resolver as seen by a consuming screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolutionState {
    pub identity: Option<ResolvedIdentity>,
    pub is_pending: bool,
    pub error: Option<IdentityError>,
}

impl ResolutionState {
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(IdentityError::message)
    }
}

#[derive(Default)]
struct Inner {
    generation: Generation,
    state: ResolutionState,
}

impl Pending for Inner {
    fn generation(&mut self) -> &mut Generation {
        &mut self.generation
    }

    fn clear_pending(&mut self) {
        self.state.is_pending = false;
    }
}

/// Confirms that the session's user holds a required role.
///
/// A failure is terminal until `resolve` is called again; there is no retry.
pub struct RoleIdentityResolver {
    store: Arc<dyn RecordStore>,
    users_table: String,
    inner: Mutex<Inner>,
    /// Liveness flag checked before every state write. It is never awaited:
    /// store calls already issued run to completion after teardown.
    lifetime: CancellationToken,
}

impl RoleIdentityResolver {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, config: &IdentityConfig) -> Self {
        Self {
            store,
            users_table: config.users_table.clone(),
            inner: Mutex::new(Inner::default()),
            lifetime: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> ResolutionState {
        self.inner.lock().state.clone()
    }

    /// Stops all further state updates. Requests still in flight complete,
    /// but their results are only returned to their callers.
    pub fn teardown(&self) {
        self.lifetime.cancel();
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// Resolves `session` into an identity for `required`.
    ///
    /// # Errors
    /// - `Unauthenticated` when `session` is `None` (no store query is made)
    /// - `NotFound` when the user has no record
    /// - `StoreError` when the lookup fails, is ambiguous, or returns a malformed row
    /// - `RoleMismatch` when the stored role is not `required` (including
    ///   empty or unrecognized roles)
    #[instrument(skip_all, fields(role = %required))]
    pub async fn resolve(
        &self,
        session: Option<&Session>,
        required: Role,
    ) -> Result<ResolvedIdentity, IdentityError> {
        let request = InFlight::start(&self.inner, &self.lifetime, |inner| {
            inner.state = ResolutionState {
                identity: None,
                is_pending: true,
                error: None,
            };
        });
        let result = self.check(session, required).await;
        let settled = request.settle(|inner| {
            inner.state = match &result {
                Ok(identity) => ResolutionState {
                    identity: Some(identity.clone()),
                    is_pending: false,
                    error: None,
                },
                Err(err) => ResolutionState {
                    identity: None,
                    is_pending: false,
                    error: Some(err.clone()),
                },
            };
        });
        if !settled {
            debug!("discarding superseded resolution");
        }
        result
    }

    /// Reads the current session from `sessions` and resolves it.
    ///
    /// # Errors
    /// Same as [`RoleIdentityResolver::resolve`].
    pub async fn resolve_current(
        &self,
        sessions: &dyn SessionSource,
        required: Role,
    ) -> Result<ResolvedIdentity, IdentityError> {
        let session = sessions.current_session().await;
        self.resolve(session.as_ref(), required).await
    }

    async fn check(
        &self,
        session: Option<&Session>,
        required: Role,
    ) -> Result<ResolvedIdentity, IdentityError> {
        let Some(session) = session else {
            debug!("no active session");
            return Err(IdentityError::unauthenticated());
        };
        let user_id = session.user_id();

        let row = self
            .store
            .query_one(&self.users_table, &Filter::eq("id", user_id))
            .await
            .map_err(|e| lookup_failure("resolve", "User record", e))?;
        let record: UserRecord = serde_json::from_value(row)
            .map_err(|e| decode_failure("resolve", "user record", &e))?;

        if record.role() != Some(required) {
            warn!(
                user_id,
                stored_role = %record.stored_role,
                "stored role does not match required role"
            );
            return Err(IdentityError::role_mismatch(required));
        }

        debug!(user_id, "identity resolved");
        Ok(ResolvedIdentity {
            id: user_id.to_owned(),
            role: required,
        })
    }
}
