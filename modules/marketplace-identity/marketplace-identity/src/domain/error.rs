//! Conversion of store failures into the identity error taxonomy.

use marketplace_identity_sdk::{IdentityError, StoreError};

/// Maps a failed single-record lookup of `what` (e.g. "User record").
///
/// An ambiguous match is a store error, not a pick-the-first.
pub(crate) fn lookup_failure(op: &str, what: &str, err: StoreError) -> IdentityError {
    tracing::warn!(operation = op, error = %err, "marketplace-identity store lookup failed");
    match err {
        StoreError::NotFound => IdentityError::not_found(format!("{what} not found")),
        StoreError::Ambiguous { count } => {
            IdentityError::store(format!("{what} lookup matched {count} records"))
        }
        StoreError::Transport(message) => IdentityError::store(message),
    }
}

/// Maps a failed multi-row query.
pub(crate) fn query_failure(op: &str, err: StoreError) -> IdentityError {
    tracing::warn!(operation = op, error = %err, "marketplace-identity store query failed");
    IdentityError::store(err.to_string())
}

/// Maps a row that came back from the store but does not decode.
pub(crate) fn decode_failure(op: &str, what: &str, err: &serde_json::Error) -> IdentityError {
    tracing::error!(operation = op, error = %err, "marketplace-identity received a malformed row");
    IdentityError::store(format!("Malformed {what}: {err}"))
}

/// Maps a failed update.
pub(crate) fn update_failure(op: &str, err: StoreError) -> IdentityError {
    tracing::error!(operation = op, error = %err, "marketplace-identity update failed");
    IdentityError::update_rejected(err.to_string())
}
