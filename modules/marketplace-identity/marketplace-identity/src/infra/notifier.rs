//! Notifier that reports user-visible notifications as tracing events.

use marketplace_identity_sdk::Notifier;

/// Forwards notifications to `tracing` under the `marketplace_identity::notify`
/// target, for hosts without a toast surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, message: &str) {
        tracing::info!(target: "marketplace_identity::notify", kind = "success", "{message}");
    }

    fn notify_failure(&self, message: &str) {
        tracing::warn!(target: "marketplace_identity::notify", kind = "failure", "{message}");
    }
}
