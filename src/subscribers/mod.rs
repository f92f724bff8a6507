//! # Event fan-out for the procvisor runtime.
//!
//! This module provides the [`Broadcaster`] (the connection set) and the
//! [`Subscribe`] trait for in-process observers.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Supervisor actor ──┐
//!   stdout pump ───────┼── publish(Event) ──► Broadcaster ──► every member queue
//!   stderr pump ───────┘                                        │
//!                                        ┌──────────────────────┼──────────────┐
//!                                        ▼                      ▼              ▼
//!                                  ws connection 1        ws connection N   LogWriter
//! ```
//!
//! ## Member types
//! - **Connections**: registered by the gateway through the supervisor, seeded with
//!   the current `STATUS`.
//! - **Subscribers**: in-process [`Subscribe`] implementations attached with
//!   [`Broadcaster::attach`], e.g. [`LogWriter`].

mod broadcaster;
mod log;
mod subscribe;

pub use broadcaster::{Broadcaster, ConnectionId, Subscription};
pub use log::LogWriter;
pub use subscribe::Subscribe;
