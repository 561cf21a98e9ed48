pub mod in_memory_store;
pub mod notifier;

pub use in_memory_store::{InMemoryRecordStore, Normalizer};
pub use notifier::TracingNotifier;
