//! Marketplace identity module.
//!
//! Role-gated identity resolution, a read-after-write account cache, and
//! read-only role rosters, all built on the collaborator traits defined in
//! `marketplace-identity-sdk` and re-exported here.

pub use marketplace_identity_sdk::{
    AccountPatch, ErrorKind, Filter, IdentityError, Notifier, RecordStore, ResolvedIdentity,
    Role, RosterEntry, Session, SessionSource, StoreError, UserRecord,
};

pub mod config;
pub mod domain;
pub mod infra;

pub use config::{ConfigError, IdentityConfig};
pub use domain::account::{AccountRecordController, AccountState};
pub use domain::resolver::{ResolutionState, RoleIdentityResolver};
pub use domain::roster::{RoleFilteredRosterReader, RosterState};
