//! Error types for the marketplace identity SDK.

use thiserror::Error;

/// Failure reported by a [`RecordStore`](crate::RecordStore) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A single-record query matched no rows.
    #[error("no rows returned")]
    NotFound,

    /// A single-record query matched more than one row.
    #[error("expected a single row but the query matched {count}")]
    Ambiguous { count: usize },

    /// Transport or query failure; carries the store's message.
    #[error("{0}")]
    Transport(String),
}

impl StoreError {
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// Discriminant of an [`IdentityError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    RoleMismatch,
    NotFound,
    StoreError,
    UpdateRejected,
}

/// Error surfaced by the identity layer to consuming screens.
///
/// Every variant carries a human-readable message, and `Display` renders
/// exactly that message so screens can show it verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// No active session.
    #[error("{message}")]
    Unauthenticated { message: String },

    /// Session is valid but the stored role is not the one required.
    #[error("{message}")]
    RoleMismatch { message: String },

    /// The queried record does not exist.
    #[error("{message}")]
    NotFound { message: String },

    /// The store could not answer the query.
    #[error("{message}")]
    Store { message: String },

    /// The store refused or failed an update.
    #[error("{message}")]
    UpdateRejected { message: String },
}

impl IdentityError {
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::Unauthenticated {
            message: "No active session".to_owned(),
        }
    }

    #[must_use]
    pub fn role_mismatch(required: crate::Role) -> Self {
        Self::RoleMismatch {
            message: format!("User is not a {required}"),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn update_rejected(message: impl Into<String>) -> Self {
        Self::UpdateRejected {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            Self::RoleMismatch { .. } => ErrorKind::RoleMismatch,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Store { .. } => ErrorKind::StoreError,
            Self::UpdateRejected { .. } => ErrorKind::UpdateRejected,
        }
    }

    /// Display message, identical to the `Display` output.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthenticated { message }
            | Self::RoleMismatch { message }
            | Self::NotFound { message }
            | Self::Store { message }
            | Self::UpdateRejected { message } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn role_mismatch_message_names_required_role() {
        let err = IdentityError::role_mismatch(Role::Vendor);
        assert_eq!(err.to_string(), "User is not a vendor");
        assert_eq!(err.message(), "User is not a vendor");
        assert_eq!(err.kind(), ErrorKind::RoleMismatch);
    }

    #[test]
    fn display_is_the_bare_message() {
        let err = IdentityError::store("connection refused");
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(err.kind(), ErrorKind::StoreError);
    }

    #[test]
    fn store_error_messages() {
        assert_eq!(
            StoreError::Ambiguous { count: 2 }.to_string(),
            "expected a single row but the query matched 2"
        );
        assert_eq!(StoreError::transport("timeout").to_string(), "timeout");
    }
}
