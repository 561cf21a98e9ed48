//! Request generations used to let only the latest request settle state.

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Ticket handed to a request when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Monotonic request counter owned by one component's state.
///
/// Lives inside the component's mutex so that checking a ticket and
/// applying its result happen under the same lock.
#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    /// Starts a new request, superseding every earlier ticket.
    pub fn advance(&mut self) -> Ticket {
        self.current += 1;
        Ticket(self.current)
    }

    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current == ticket.0
    }
}

/// Component state that tracks one in-flight request at a time.
pub trait Pending {
    fn generation(&mut self) -> &mut Generation;

    /// Clears the in-flight flag of a request that ended without settling.
    fn clear_pending(&mut self);
}

/// Guard for one request against a component's state.
///
/// Settling applies the request's result if it is still the latest and the
/// component is live. A guard dropped unsettled (the caller abandoned the
/// future) clears the pending flag under the same conditions.
pub struct InFlight<'a, S: Pending> {
    state: &'a Mutex<S>,
    lifetime: &'a CancellationToken,
    ticket: Ticket,
    armed: bool,
}

impl<'a, S: Pending> InFlight<'a, S> {
    /// Issues a new ticket and runs `on_start` unless the component is torn
    /// down.
    #[must_use]
    pub fn start(
        state: &'a Mutex<S>,
        lifetime: &'a CancellationToken,
        on_start: impl FnOnce(&mut S),
    ) -> Self {
        let mut guard = state.lock();
        let ticket = guard.generation().advance();
        if !lifetime.is_cancelled() {
            on_start(&mut guard);
        }
        drop(guard);
        Self {
            state,
            lifetime,
            ticket,
            armed: true,
        }
    }

    /// Applies `apply` if this is still the latest request. Returns whether
    /// it was applied.
    #[must_use]
    pub fn settle(mut self, apply: impl FnOnce(&mut S)) -> bool {
        self.armed = false;
        let mut state = self.state.lock();
        if self.lifetime.is_cancelled() || !state.generation().is_current(self.ticket) {
            return false;
        }
        apply(&mut state);
        true
    }
}

impl<S: Pending> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if !self.armed || self.lifetime.is_cancelled() {
            return;
        }
        let mut state = self.state.lock();
        if state.generation().is_current(self.ticket) {
            state.clear_pending();
        }
    }
}
