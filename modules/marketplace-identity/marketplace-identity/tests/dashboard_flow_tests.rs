#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the flows role dashboards compose from the three components

mod common;

use std::sync::Arc;

use common::{Toasts, config, marketplace};
use marketplace_identity::infra::TracingNotifier;
use marketplace_identity::{
    AccountPatch, AccountRecordController, ErrorKind, RoleFilteredRosterReader,
    RoleIdentityResolver, Role, Session,
};
use serde_json::{Map, Value};

// =============================================================================
// Supplier dashboard: resolve identity, then load and edit the account
// =============================================================================

#[tokio::test]
async fn test_supplier_resolves_and_edits_account() {
    let store = marketplace();
    store.set_normalizer(
        "users",
        Arc::new(|row: &mut Map<String, Value>| {
            if let Some(Value::String(name)) = row.get_mut("business_name") {
                *name = name.to_uppercase();
            }
        }),
    );
    store.sign_in("u1");
    let toasts = Arc::new(Toasts::default());
    let resolver = RoleIdentityResolver::new(store.clone(), &config());
    let account = AccountRecordController::new(store.clone(), toasts.clone(), &config());

    let identity = resolver
        .resolve_current(store.as_ref(), Role::Supplier)
        .await
        .unwrap();
    assert_eq!(identity.id, "u1");

    account.load(&identity.id).await.unwrap();
    assert!(
        account
            .update(&identity.id, &AccountPatch::new().business_name("Acme Farms"))
            .await
    );

    let cached = account.state().account.unwrap();
    assert_eq!(cached.business_name.as_deref(), Some("ACME FARMS"));
    assert_eq!(cached.profile.get("region"), Some(&Value::from("north")));
    assert_eq!(
        *toasts.success.lock(),
        vec!["Account updated successfully".to_owned()]
    );
    assert!(toasts.failure.lock().is_empty());
}

#[tokio::test]
async fn test_supplier_session_cannot_open_vendor_dashboard() {
    let store = marketplace();
    let resolver = RoleIdentityResolver::new(store.clone(), &config());
    let session = Session::new("u1");

    let err = resolver
        .resolve(Some(&session), Role::Vendor)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RoleMismatch);
    let state = resolver.state();
    assert_eq!(state.identity, None);
    assert_eq!(state.error_message(), Some("User is not a vendor"));
}

#[tokio::test]
async fn test_signed_out_user_gets_unauthenticated_for_every_role() {
    let store = marketplace();
    let resolver = RoleIdentityResolver::new(store.clone(), &config());

    for role in Role::ALL {
        let err = resolver
            .resolve_current(store.as_ref(), role)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }
    assert_eq!(store.query_count(), 0);
}

// =============================================================================
// Vendor dashboard: supplier roster
// =============================================================================

#[tokio::test]
async fn test_vendor_lists_suppliers() {
    let store = marketplace();
    let resolver = RoleIdentityResolver::new(store.clone(), &config());
    let roster = RoleFilteredRosterReader::new(store.clone(), &config());

    resolver
        .resolve(Some(&Session::new("u2")), Role::Vendor)
        .await
        .unwrap();
    let suppliers = roster.mount().await.unwrap();

    let names: Vec<_> = suppliers
        .iter()
        .map(|entry| entry.business_name.clone().unwrap())
        .collect();
    assert_eq!(names, vec!["Sam's Orchard", "Sue's Greens"]);
}

#[tokio::test]
async fn test_roster_outage_renders_empty_list_with_message() {
    let store = marketplace();
    store.fail_queries(Some("upstream timeout"));
    let roster = RoleFilteredRosterReader::new(store.clone(), &config());

    assert!(roster.mount().await.is_err());

    let state = roster.state();
    assert!(state.roster.is_empty());
    assert_eq!(state.error_message(), Some("upstream timeout"));
}

// =============================================================================
// Notifier wiring
// =============================================================================

#[tokio::test]
async fn test_tracing_notifier_can_back_a_controller() {
    let store = marketplace();
    let account =
        AccountRecordController::new(store.clone(), Arc::new(TracingNotifier), &config());

    assert!(
        account
            .update("u4", &AccountPatch::new().email("ops@dee.example"))
            .await
    );
    store.fail_updates(Some("row is locked"));
    assert!(
        !account
            .update("u4", &AccountPatch::new().email("other@dee.example"))
            .await
    );

    let state = account.state();
    assert_eq!(state.error_message(), Some("row is locked"));
    assert_eq!(
        state.account.unwrap().email.as_deref(),
        Some("ops@dee.example")
    );
}

#[tokio::test]
async fn test_custom_table_and_message_from_config() {
    let store = marketplace();
    store
        .insert(
            "participants",
            serde_json::json!({ "id": "p1", "role": "retailer", "name": "Ria" }),
        )
        .unwrap();
    let config = marketplace_identity::IdentityConfig::from_module_section(&serde_json::json!({
        "config": {
            "users_table": "participants",
            "update_success_message": "Saved",
            "roster_role": "retailer"
        }
    }))
    .unwrap();
    let toasts = Arc::new(Toasts::default());
    let account = AccountRecordController::new(store.clone(), toasts.clone(), &config);
    let roster = RoleFilteredRosterReader::new(store.clone(), &config);

    assert!(account.update("p1", &AccountPatch::new().name("Ria M.")).await);
    assert_eq!(*toasts.success.lock(), vec!["Saved".to_owned()]);
    assert_eq!(roster.mount().await.unwrap()[0].name.as_deref(), Some("Ria M."));
}
