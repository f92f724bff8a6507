//! WebSocket connection gateway (feature `gateway`).
//!
//! - [`Admission`]: shared-secret check performed once per connection
//! - [`Gateway`]: axum router bridging sockets to a [`SupervisorHandle`](crate::SupervisorHandle)

mod admission;
mod server;

pub use admission::Admission;
pub use server::{Gateway, SECRET_HEADER};
