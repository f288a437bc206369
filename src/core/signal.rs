//! # Process-wide shutdown signal.
//!
//! [`ShutdownSignal`] wraps a [`CancellationToken`]. It is level-triggered: once fired it
//! stays fired, and a task that checks late still observes it. Firing is idempotent.
//!
//! ```text
//! OS signal ─┐
//! task error ─┼─► Supervisor ──► signal.fire() ──► every task's fired().await wakes
//! Coordinator ┘
//! ```

use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Cloneable broadcast cancellation event.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Creates an unfired signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Further calls have no effect.
    pub fn fire(&self) {
        self.token.cancel();
    }

    /// True once the signal (or a parent) has fired.
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the signal fires; immediately if it already has.
    pub async fn fired(&self) {
        self.token.cancelled().await;
    }

    /// Owned variant of [`fired`](Self::fired), for APIs that need a `'static` future.
    pub fn fired_owned(self) -> WaitForCancellationFutureOwned {
        self.token.cancelled_owned()
    }

    /// Derives a signal that fires with this one but can also be fired on its own
    /// without affecting the parent.
    pub fn child(&self) -> ShutdownSignal {
        ShutdownSignal {
            token: self.token.child_token(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn late_observer_sees_fired_signal() {
        let signal = ShutdownSignal::new();
        signal.fire();
        signal.fire();

        let late = signal.clone();
        assert!(late.is_fired());
        tokio::time::timeout(Duration::from_millis(10), late.fired())
            .await
            .unwrap();
    }

    #[test]
    fn child_follows_parent_but_not_vice_versa() {
        let parent = ShutdownSignal::new();
        let child = parent.child();
        child.fire();
        assert!(!parent.is_fired());

        let other = parent.child();
        parent.fire();
        assert!(other.is_fired());
    }
}
