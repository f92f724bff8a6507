//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging in-process event handlers into
//! the [`Broadcaster`](crate::Broadcaster). Each attached subscriber is driven by a
//! dedicated worker loop fed by its own bounded queue, exactly like a remote
//! connection.
//!
//! ## Contract
//! - Implementations may be slow; they do **not** block the publisher nor other members.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If the queue overflows, the subscriber is
//!   dropped from the connection set like any other failed member.
//!
//! ## Example
//! ```rust
//! use procvisor::{Event, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, ev: &Event) {
//!         let _ = ev; // write audit record...
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for in-process event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
