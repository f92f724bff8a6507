//! # procvisor
//!
//! **procvisor** supervises exactly one long-running external process (the
//! *worker*) and lets remote clients start, stop and observe it over a
//! persistent message channel, with the worker's output republished as a live
//! log stream.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ws client #1      ws client #2      ws client #N
//!        │                 │                 │
//!        ▼                 ▼                 ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  Gateway (feature "gateway")                              │
//! │  - Admission (shared secret, once per connection)         │
//! │  - inbound "start" / "stop" | "kill" / "status"           │
//! └──────┬───────────────────────────────────────────▲────────┘
//!        │ Command                                   │ Event JSON
//!        ▼                                           │
//! ┌──────────────────────────────┐         ┌─────────┴─────────┐
//! │  SupervisorActor             │ publish │    Broadcaster    │
//! │  - Option<WorkerHandle>      ├────────►│  (connection set) ├──► LogWriter
//! │  - Escalation timers         │         └─────────▲─────────┘
//! └──────┬───────────────▲───────┘                   │ LOG / ERROR
//!        │ spawn/signal  │ WorkerExit                │
//!        ▼               │                           │
//! ┌──────────────────────┴───────────────────────────┴────────┐
//! │  worker process group (stdout pump, stderr pump, watcher) │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! STOPPED ──start──► spawn in own process group ──► STATUS started
//!                     ├─► stdout line ──► LOG
//!                     ├─► stderr line ──► ERROR
//!                     └─► exit ─────────► STATUS stopped
//! STARTED ──stop───► SIGTERM(group) ──► STATUS stopped
//!                     └─► after grace, if still alive: SIGKILL(group)
//! ```
//!
//! ## Features
//! | Area            | Description                                          | Key types                                |
//! |-----------------|------------------------------------------------------|------------------------------------------|
//! | **Supervision** | Single-worker lifecycle with idempotent commands     | [`Supervisor`], [`SupervisorHandle`]     |
//! | **Fan-out**     | Non-blocking delivery to every admitted observer     | [`Broadcaster`], [`Subscription`]        |
//! | **Subscribers** | In-process event handlers                            | [`Subscribe`], [`LogWriter`]             |
//! | **Events**      | Wire model and command vocabulary                    | [`Event`], [`EventKind`], [`Command`]    |
//! | **Errors**      | Typed errors for spawn, admission and configuration  | [`SpawnError`], [`AdmissionError`]       |
//! | **Configuration** | Worker command, grace window and capacities        | [`SupervisorConfig`], [`WorkerCommand`]  |
//!
//! ## Optional features
//! - `gateway` (default): axum WebSocket gateway and the `procvisor` binary.
//!
//! ## Example
//! ```rust,no_run
//! use procvisor::{EventKind, Supervisor, SupervisorConfig, WorkerCommand};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cmd: WorkerCommand = "ping -c 3 127.0.0.1".parse()?;
//!     let sup = Supervisor::spawn(SupervisorConfig::new(cmd));
//!
//!     // The first event is the seeded `STATUS stopped`.
//!     let mut events = sup.connect("example").await?;
//!     events.recv().await;
//!     sup.start().await?;
//!
//!     while let Some(ev) = events.recv().await {
//!         println!("{}: {}", ev.kind.as_str(), ev.message);
//!         if ev.kind == EventKind::Status && ev.message == "stopped" {
//!             break;
//!         }
//!     }
//!     sup.shutdown().await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(unix))]
compile_error!("procvisor signals POSIX process groups and supports unix targets only");

mod core;
mod error;
mod events;
mod subscribers;

#[cfg(feature = "gateway")]
pub mod gateway;

// ---- Public re-exports ----

pub use crate::core::{
    Escalation, EscalationOutcome, SignalOutcome, Supervisor, SupervisorBuilder,
    SupervisorConfig, SupervisorHandle, WorkerCommand, WorkerStatus, group_exists, signal_group,
    wait_for_shutdown_signal,
};
pub use error::{AdmissionError, ConfigError, SpawnError, SupervisorError};
pub use events::{Command, Event, EventKind, UnknownCommand, WorkerState};
pub use subscribers::{Broadcaster, ConnectionId, LogWriter, Subscribe, Subscription};
