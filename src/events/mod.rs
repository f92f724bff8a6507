//! Event and command model.
//!
//! ## Contents
//! - [`Event`], [`EventKind`], [`WorkerState`] outbound notifications and their wire form
//! - [`Command`] inbound control vocabulary
//!
//! ## Quick reference
//! - **Publishers**: the supervisor actor (`STATUS`, diagnostics) and the worker
//!   stream pumps (`LOG`, `ERROR`).
//! - **Consumers**: the [`Broadcaster`](crate::Broadcaster), which forwards events
//!   verbatim to every connection and attached subscriber.

mod command;
mod event;

pub use command::{Command, UnknownCommand};
pub use event::{Event, EventKind, WorkerState};
