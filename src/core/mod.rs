//! Runtime core: the worker lifecycle supervisor.
//!
//! The public API from this module is [`Supervisor`] / [`SupervisorBuilder`]
//! (construction), [`SupervisorHandle`] (commands) and [`SupervisorConfig`].
//!
//! Internal modules:
//! - [`supervisor`]: the actor that owns the single worker handle;
//! - [`worker`]: spawns the worker and pumps its streams and exit into events;
//! - [`signal`]: process-group signalling and the SIGKILL escalation timer;
//! - [`shutdown`]: SIGINT, SIGTERM and SIGQUIT handling for the host process.

mod builder;
mod config;
mod handle;
mod shutdown;
mod signal;
mod supervisor;
mod worker;

pub use builder::{Supervisor, SupervisorBuilder};
pub use config::{SupervisorConfig, WorkerCommand};
pub use handle::SupervisorHandle;
pub use shutdown::wait_for_shutdown_signal;
pub use signal::{Escalation, EscalationOutcome, SignalOutcome, group_exists, signal_group};
pub use supervisor::WorkerStatus;
