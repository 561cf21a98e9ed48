//! Configuration for the marketplace identity module.
//!
//! Two ways to obtain an [`IdentityConfig`]:
//!
//! 1. **Module section** (`from_module_section`): lenient, falls back to
//!    defaults when the module has no `config` object, fails only when one
//!    is present but invalid.
//! 2. **Layered** (`load`): defaults, then an optional YAML file, then
//!    `MARKETPLACE_*` environment variables, merged with `figment`.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use marketplace_identity_sdk::Role;
use serde::{Deserialize, Serialize};

/// Environment variable prefix for layered loading.
pub const ENV_PREFIX: &str = "MARKETPLACE_";

const CONFIG_KEYS: [&str; 3] = ["users_table", "update_success_message", "roster_role"];

/// Configuration error for typed config operations
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("module config must be an object")]
    InvalidModuleStructure,
    #[error("invalid marketplace-identity config: {source}")]
    InvalidConfig {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to load marketplace-identity config: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Module configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Table holding one row per marketplace participant.
    pub users_table: String,

    /// Message shown after an account update is accepted by the store.
    pub update_success_message: String,

    /// Role listed by a roster reader when it is mounted.
    pub roster_role: Role,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            users_table: "users".to_owned(),
            update_success_message: "Account updated successfully".to_owned(),
            roster_role: Role::Supplier,
        }
    }
}

impl IdentityConfig {
    /// Reads the config from a module section shaped as `{ "config": { ... } }`.
    ///
    /// - section is `null` or has no `config` field → defaults
    /// - section is some other non-object → `InvalidModuleStructure`
    /// - `config` present but invalid → `InvalidConfig`
    ///
    /// # Errors
    /// Returns `ConfigError` if the section is malformed or the config cannot be deserialized.
    pub fn from_module_section(section: &serde_json::Value) -> Result<Self, ConfigError> {
        if section.is_null() {
            return Ok(Self::default());
        }

        let obj = section
            .as_object()
            .ok_or(ConfigError::InvalidModuleStructure)?;

        let Some(config_section) = obj.get("config") else {
            return Ok(Self::default());
        };

        serde_json::from_value(config_section.clone())
            .map_err(|source| ConfigError::InvalidConfig { source })
    }

    /// Layered load: defaults, then `path` (YAML, if given), then
    /// `MARKETPLACE_USERS_TABLE`, `MARKETPLACE_UPDATE_SUCCESS_MESSAGE`,
    /// `MARKETPLACE_ROSTER_ROLE`.
    ///
    /// A missing YAML file is treated as empty.
    ///
    /// # Errors
    /// Returns `ConfigError::Load` if any layer fails to parse or the merged
    /// result does not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).only(&CONFIG_KEYS));

        let config: Self = figment.extract().map_err(Box::new)?;
        tracing::debug!(
            users_table = %config.users_table,
            roster_role = %config.roster_role,
            "marketplace-identity config loaded"
        );
        Ok(config)
    }
}
