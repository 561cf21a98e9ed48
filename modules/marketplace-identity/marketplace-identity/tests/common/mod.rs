#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common test utilities for marketplace-identity integration tests

use std::sync::{Arc, Once};

use marketplace_identity::infra::InMemoryRecordStore;
use marketplace_identity::{IdentityConfig, Notifier};
use parking_lot::Mutex;
use serde_json::json;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        if let Err(err) = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
        {
            eprintln!("tracing subscriber already installed: {err}");
        }
    });
}

pub fn config() -> IdentityConfig {
    IdentityConfig::default()
}

/// A small marketplace: two suppliers, a vendor, a distributor, a consumer.
pub fn marketplace() -> Arc<InMemoryRecordStore> {
    init_tracing();
    let store = InMemoryRecordStore::new();
    for row in [
        json!({ "id": "u1", "role": "supplier", "name": "Sam", "business_name": "Sam's Orchard", "email": "sam@example.com", "region": "north" }),
        json!({ "id": "u2", "role": "vendor", "name": "Val", "business_name": "Val's Stall", "email": "val@example.com" }),
        json!({ "id": "u3", "role": "supplier", "name": "Sue", "business_name": "Sue's Greens", "email": "sue@example.com" }),
        json!({ "id": "u4", "role": "distributor", "name": "Dee", "business_name": "Dee Logistics", "email": "dee@example.com" }),
        json!({ "id": "u5", "role": "consumer", "name": "Cal", "email": "cal@example.com" }),
    ] {
        store.insert("users", row).unwrap();
    }
    Arc::new(store)
}

#[derive(Default)]
pub struct Toasts {
    pub success: Mutex<Vec<String>>,
    pub failure: Mutex<Vec<String>>,
}

impl Notifier for Toasts {
    fn notify_success(&self, message: &str) {
        self.success.lock().push(message.to_owned());
    }

    fn notify_failure(&self, message: &str) {
        self.failure.lock().push(message.to_owned());
    }
}
