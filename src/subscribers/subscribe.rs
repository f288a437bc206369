//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for reacting to runtime events. Each subscriber is
//! driven by its own worker fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::SubscriberSet); a slow subscriber never blocks the poll loops.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue. On overflow events are dropped.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
