//! Marketplace identity SDK.
//!
//! Transport-agnostic contract shared by the identity layer and its
//! consumers: participant models, the collaborator traits the layer talks
//! to (session source, record store, notifier), and the error taxonomy.

pub mod api;
pub mod errors;
pub mod models;

pub use api::{Filter, Notifier, RecordStore, SessionSource};
pub use errors::{ErrorKind, IdentityError, StoreError};
pub use models::{
    AccountPatch, ResolvedIdentity, Role, RosterEntry, Session, UnknownRole, UserRecord,
};
