//! Public models for the marketplace identity module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the identity layer, the record store, and consuming screens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Participant category. Decides which dashboard and permissions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Vendor,
    Supplier,
    Retailer,
    Distributor,
    Consumer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Vendor,
        Role::Supplier,
        Role::Retailer,
        Role::Distributor,
        Role::Consumer,
    ];

    /// Text stored in the `role` column for this role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Vendor => "vendor",
            Role::Supplier => "supplier",
            Role::Retailer => "retailer",
            Role::Distributor => "distributor",
            Role::Consumer => "consumer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored role text that does not name any known [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_owned()))
    }
}

/// Authenticated session handed out by the auth provider.
///
/// Only the user id is consumed by this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// One marketplace participant as stored in the users table.
///
/// `role` keeps the raw stored text so that records with an empty or
/// unrecognized role still decode; use [`UserRecord::role`] to interpret it.
/// Columns this layer does not know about travel in `profile` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(rename = "role", default)]
    pub stored_role: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl UserRecord {
    /// Parsed role, or `None` when the stored text is not a known role.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.stored_role.parse().ok()
    }
}

/// Roster row. Only these four columns are ever fetched for a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl RosterEntry {
    /// Projection requested from the store.
    pub const COLUMNS: [&'static str; 4] = ["id", "name", "business_name", "email"];
}

/// A user id confirmed to belong to a specific role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub id: String,
    pub role: Role,
}

/// Partial update for an account record.
///
/// Only fields that are set are sent to the store. `profile` carries
/// additional columns verbatim.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub business_name: Option<String>,
    pub email: Option<String>,
    pub profile: Map<String, Value>,
}

impl AccountPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn business_name(mut self, business_name: impl Into<String>) -> Self {
        self.business_name = Some(business_name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn field(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.profile.insert(column.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.business_name.is_none()
            && self.email.is_none()
            && self.profile.is_empty()
    }

    /// Column names this patch writes, in no particular order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        [
            self.name.as_ref().map(|_| "name"),
            self.business_name.as_ref().map(|_| "business_name"),
            self.email.as_ref().map(|_| "email"),
        ]
        .into_iter()
        .flatten()
        .chain(self.profile.keys().map(String::as_str))
    }

    /// Row fragment sent to the store.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = self.profile.clone();
        if let Some(name) = &self.name {
            fields.insert("name".to_owned(), Value::from(name.as_str()));
        }
        if let Some(business_name) = &self.business_name {
            fields.insert(
                "business_name".to_owned(),
                Value::from(business_name.as_str()),
            );
        }
        if let Some(email) = &self.email {
            fields.insert("email".to_owned(), Value::from(email.as_str()));
        }
        fields
    }
}
