//! Collaborator traits for the marketplace identity layer.
//!
//! The identity layer owns none of these: the session source and record
//! store are the remote auth/data provider, the notifier is whatever toast
//! surface the consuming screen uses.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::StoreError;
use crate::models::Session;

/// Conjunction of column equality predicates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and_eq(column, value)
    }

    #[must_use]
    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    #[must_use]
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Value required for `column`, if the filter constrains it.
    #[must_use]
    pub fn value_of(&self, column: &str) -> Option<&Value> {
        self.conditions
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Whether `row` satisfies every condition.
    #[must_use]
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        self.conditions
            .iter()
            .all(|(column, expected)| row.get(column) == Some(expected))
    }
}

/// Source of the current authenticated session.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn current_session(&self) -> Option<Session>;
}

/// Remote record store.
///
/// Implementations must be safe for concurrent independent calls; the
/// identity layer does no client-side locking around them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch exactly one row.
    ///
    /// Returns [`StoreError::NotFound`] for zero rows and
    /// [`StoreError::Ambiguous`] for more than one.
    async fn query_one(&self, table: &str, filter: &Filter) -> Result<Value, StoreError>;

    /// Fetch all matching rows in store order, projected to `columns`
    /// (all columns when empty).
    async fn query_many(
        &self,
        table: &str,
        filter: &Filter,
        columns: &[&str],
    ) -> Result<Vec<Value>, StoreError>;

    /// Apply `patch` to the row with the given id. Only the columns present
    /// in `patch` change.
    async fn update_one(
        &self,
        table: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<(), StoreError>;
}

/// Fire-and-forget user-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_failure(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn filter_matches_all_conditions() {
        let filter = Filter::eq("role", "supplier").and_eq("id", "u1");
        assert!(filter.matches(&row(json!({ "id": "u1", "role": "supplier", "name": "x" }))));
        assert!(!filter.matches(&row(json!({ "id": "u2", "role": "supplier" }))));
        assert!(!filter.matches(&row(json!({ "id": "u1" }))));
    }

    #[test]
    fn empty_filter_matches_any_row() {
        assert!(Filter::default().matches(&Map::new()));
    }

    #[test]
    fn value_of_returns_first_condition_for_column() {
        let filter = Filter::eq("id", "u1");
        assert_eq!(filter.value_of("id"), Some(&json!("u1")));
        assert_eq!(filter.value_of("role"), None);
    }
}
