//! A cloneable handle for poking a conversation from external code.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

/// A cloneable handle for aborting and observing a conversation's turn.
///
/// All fields are `Arc`-wrapped, so cloning is cheap. The handle stays valid
/// across turns; each turn installs a fresh cancellation token behind it.
#[derive(Clone)]
pub struct ConversationHandle {
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) is_running: Arc<AtomicBool>,
}

impl ConversationHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Abort the in-flight turn. Partial content is kept; no failure text is
    /// written. Harmless when nothing is running.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// Whether a turn is currently in flight.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Claim the turn guard and install a fresh token. Fails while a
    /// previous turn has not fully wound down.
    pub(crate) fn try_begin_turn(&self) -> bool {
        if self
            .is_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        *self.cancel.lock() = CancellationToken::new();
        true
    }

    /// The token installed for the current turn.
    pub(crate) fn current_token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    /// Release the turn guard.
    pub(crate) fn end_turn(&self) {
        self.is_running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_exclusive_until_released() {
        let handle = ConversationHandle::new();
        assert!(handle.try_begin_turn());
        assert!(handle.is_running());
        assert!(!handle.try_begin_turn());

        handle.end_turn();
        assert!(!handle.is_running());
        assert!(handle.try_begin_turn());
    }

    #[test]
    fn test_each_turn_gets_a_fresh_token() {
        let handle = ConversationHandle::new();
        assert!(handle.try_begin_turn());
        let first = handle.current_token();
        handle.abort();
        assert!(first.is_cancelled());
        handle.end_turn();

        // The stale cancellation must not leak into the next turn
        assert!(handle.try_begin_turn());
        assert!(!handle.current_token().is_cancelled());
    }
}
