#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Fixtures shared by the domain tests.

use std::sync::Arc;

use marketplace_identity_sdk::Notifier;
use parking_lot::Mutex;
use serde_json::json;

use crate::infra::InMemoryRecordStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure(String),
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        self.notices.lock().push(Notice::Success(message.to_owned()));
    }

    fn notify_failure(&self, message: &str) {
        self.notices.lock().push(Notice::Failure(message.to_owned()));
    }
}

/// Users table with one participant per role plus a few odd rows.
pub fn seeded_store() -> Arc<InMemoryRecordStore> {
    let store = InMemoryRecordStore::new();
    let rows = [
        json!({ "id": "u1", "role": "supplier", "name": "Sam", "business_name": "Sam's Orchard", "email": "sam@example.com", "phone": "555-0101" }),
        json!({ "id": "u2", "role": "vendor", "name": "Val", "business_name": "Val's Stall", "email": "val@example.com" }),
        json!({ "id": "u3", "role": "supplier", "name": "Sue", "business_name": "Sue's Greens", "email": "sue@example.com" }),
        json!({ "id": "u4", "role": "retailer", "name": "Rex", "business_name": "Rex Market", "email": "rex@example.com" }),
        json!({ "id": "u5", "role": "", "name": "Nobody" }),
        json!({ "id": "u6", "role": "farmer", "name": "Fern" }),
        json!({ "id": "dup", "role": "vendor", "name": "First" }),
        json!({ "id": "dup", "role": "vendor", "name": "Second" }),
        json!({ "id": "bad", "role": "vendor", "name": 42 }),
    ];
    for row in rows {
        store.insert("users", row).unwrap();
    }
    Arc::new(store)
}
