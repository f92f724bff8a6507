//! # Supervisor actor: the single owner of the worker handle.
//!
//! Every state transition runs inside one task, so `start`, `stop`, `status`,
//! connection seeding and exit reconciliation are atomic with respect to each other.
//!
//! ## Architecture
//! ```text
//! SupervisorHandle ── Request ──► [command queue] ──┐
//!                                                   ├──► SupervisorActor::run()
//! exit watcher ───── WorkerExit ─► [exit queue] ────┘        │
//!                                                            ├─► current: Option<WorkerHandle>
//!                                                            ├─► escalations: Vec<Escalation>
//!                                                            └─► Broadcaster::publish(Event)
//! ```
//!
//! ## State machine
//! ```text
//! STOPPED ──start──► STARTED      (spawn, STATUS started)
//! STARTED ──stop───► STOPPED      (SIGTERM group, schedule SIGKILL, STATUS stopped)
//! STARTED ──exit───► STOPPED      (reconcile, STATUS stopped)
//! STARTED ──start──► STARTED      (no-op, STATUS started)
//! STOPPED ──stop───► STOPPED      (no-op, STATUS stopped)
//! ```
//!
//! ## Rules
//! - At most one [`WorkerHandle`] exists at any time.
//! - Exit notifications carry the handle generation; stale ones are ignored.
//! - `stop()` clears the handle immediately and never waits for the grace window.
//! - Spawn failures publish `ERROR` then `STATUS stopped`, leaving no handle behind.

use std::sync::Arc;

use nix::sys::signal::Signal;
use tokio::sync::{mpsc, oneshot};

use crate::core::config::SupervisorConfig;
use crate::core::signal::{Escalation, SignalOutcome, signal_group};
use crate::core::worker::{self, WorkerExit, WorkerHandle};
use crate::events::{Command, Event, WorkerState};
use crate::subscribers::{Broadcaster, Subscription};

/// Point-in-time view of the supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStatus {
    /// Externally reported state.
    pub state: WorkerState,
    /// Process id of the live worker, if any.
    pub pid: Option<u32>,
}

/// Messages accepted by the actor.
pub(crate) enum Request {
    Command(Command),
    Connect {
        name: Arc<str>,
        reply: oneshot::Sender<Subscription>,
    },
    Snapshot {
        reply: oneshot::Sender<WorkerStatus>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

pub(crate) struct SupervisorActor {
    cfg: SupervisorConfig,
    broadcaster: Arc<Broadcaster>,
    current: Option<WorkerHandle>,
    generation: u64,
    escalations: Vec<Escalation>,
    exits: mpsc::UnboundedSender<WorkerExit>,
}

impl SupervisorActor {
    pub(crate) fn new(
        cfg: SupervisorConfig,
        broadcaster: Arc<Broadcaster>,
        exits: mpsc::UnboundedSender<WorkerExit>,
    ) -> Self {
        Self {
            cfg,
            broadcaster,
            current: None,
            generation: 0,
            escalations: Vec::new(),
            exits,
        }
    }

    /// Serves requests and exit notifications until shutdown or until every
    /// handle has been dropped. Either way a running worker is stopped first.
    pub(crate) async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        mut exits: mpsc::UnboundedReceiver<WorkerExit>,
    ) {
        loop {
            tokio::select! {
                req = requests.recv() => match req {
                    Some(Request::Shutdown { reply }) => {
                        self.shutdown().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(req) => self.handle(req),
                    None => {
                        self.shutdown().await;
                        break;
                    }
                },
                Some(exit) = exits.recv() => self.reconcile(exit),
            }
        }
        tracing::debug!("supervisor actor exited");
    }

    fn handle(&mut self, req: Request) {
        match req {
            Request::Command(Command::Start) => self.start(),
            Request::Command(Command::Stop) => self.stop(),
            Request::Command(Command::Status) => self.status(),
            Request::Connect { name, reply } => {
                let seed = Event::status(self.state());
                let _ = reply.send(self.broadcaster.register(name, Some(seed)));
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(WorkerStatus {
                    state: self.state(),
                    pid: self.current.as_ref().map(|h| h.pid),
                });
            }
            // Handled by the run loop.
            Request::Shutdown { .. } => {}
        }
    }

    fn state(&self) -> WorkerState {
        if self.current.is_some() {
            WorkerState::Started
        } else {
            WorkerState::Stopped
        }
    }

    fn start(&mut self) {
        if self.current.is_some() {
            self.publish_state();
            return;
        }

        let spawned = match worker::spawn(&self.cfg.command) {
            Ok(spawned) => spawned,
            Err(err) => {
                tracing::warn!(
                    command = %self.cfg.command,
                    label = err.as_label(),
                    "{}",
                    err.as_message()
                );
                self.broadcaster.publish(Event::error(err.as_message()));
                self.publish_state();
                return;
            }
        };

        // A new group can only reuse an id whose previous group is empty.
        for stale in self.escalations.iter().filter(|e| e.pgid() == spawned.pid()) {
            stale.cancel();
        }

        self.generation += 1;
        tracing::info!(
            pid = spawned.pid(),
            generation = self.generation,
            command = %self.cfg.command,
            "worker started"
        );
        // Published before the pumps exist, so no LOG can precede it.
        self.broadcaster.publish(Event::status(WorkerState::Started));
        self.current = Some(spawned.observe(
            self.generation,
            self.cfg.drain,
            Arc::clone(&self.broadcaster),
            self.exits.clone(),
        ));
    }

    fn stop(&mut self) {
        let Some(handle) = self.current.take() else {
            self.publish_state();
            return;
        };

        handle.streams.cancel();
        let outcome = signal_group(handle.pid, Signal::SIGTERM);
        match outcome {
            SignalOutcome::Delivered => {
                tracing::info!(pid = handle.pid, "sent SIGTERM to worker process group");
            }
            SignalOutcome::AlreadyGone => {
                tracing::debug!(pid = handle.pid, "worker process group already gone");
            }
            SignalOutcome::Failed(errno) => {
                tracing::warn!(pid = handle.pid, %errno, "failed to signal worker process group");
            }
        }

        if outcome != SignalOutcome::AlreadyGone {
            self.escalations.retain(|e| !e.is_finished());
            self.escalations.push(Escalation::schedule(
                handle.pid,
                self.cfg.grace,
                handle.exited.clone(),
            ));
        }

        self.publish_state();
    }

    fn status(&self) {
        self.publish_state();
    }

    fn reconcile(&mut self, exit: WorkerExit) {
        let current = self.current.as_ref().map(|h| h.generation);
        if current != Some(exit.generation) {
            tracing::debug!(generation = exit.generation, "ignoring exit of a stopped worker");
            return;
        }

        let Some(handle) = self.current.take() else {
            return;
        };
        match exit.status {
            Ok(status) => {
                tracing::info!(pid = handle.pid, %status, "worker exited on its own");
            }
            Err(err) => {
                tracing::warn!(pid = handle.pid, error = %err, "failed to wait for worker");
                self.broadcaster
                    .publish(Event::error(format!("failed to wait for worker: {err}")));
            }
        }
        self.publish_state();
    }

    async fn shutdown(&mut self) {
        if self.current.is_some() {
            self.stop();
        }
        for escalation in self.escalations.drain(..) {
            let pgid = escalation.pgid();
            let outcome = escalation.wait().await;
            tracing::debug!(pgid, ?outcome, "escalation settled during shutdown");
        }
    }

    fn publish_state(&self) {
        self.broadcaster.publish(Event::status(self.state()));
    }
}
