//! # SupervisorHandle: cloneable front door to the supervisor actor.
//!
//! Every method enqueues a request on the actor's bounded command queue; the
//! resulting events are observed through a [`Subscription`], never returned
//! directly. Requests from one handle are served in the order they were sent.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::core::supervisor::{Request, WorkerStatus};
use crate::error::SupervisorError;
use crate::events::Command;
use crate::subscribers::{Broadcaster, Subscription};

/// Cloneable handle to a running supervisor.
///
/// Dropping every clone stops the worker and ends the actor.
#[derive(Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<Request>,
    broadcaster: Arc<Broadcaster>,
}

impl SupervisorHandle {
    pub(crate) fn new(tx: mpsc::Sender<Request>, broadcaster: Arc<Broadcaster>) -> Self {
        Self { tx, broadcaster }
    }

    /// Starts the worker; emits `STATUS started` (no second worker if already running).
    pub async fn start(&self) -> Result<(), SupervisorError> {
        self.dispatch(Command::Start).await
    }

    /// Stops the worker; emits `STATUS stopped` without waiting for the exit.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        self.dispatch(Command::Stop).await
    }

    /// Emits the current `STATUS`.
    pub async fn status(&self) -> Result<(), SupervisorError> {
        self.dispatch(Command::Status).await
    }

    /// Forwards a parsed inbound command.
    pub async fn dispatch(&self, command: Command) -> Result<(), SupervisorError> {
        self.send(Request::Command(command)).await
    }

    /// Registers a new observer seeded with the current `STATUS`.
    ///
    /// The seed is queued before any event published after registration.
    pub async fn connect(&self, name: impl Into<Arc<str>>) -> Result<Subscription, SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Connect {
            name: name.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SupervisorError::Closed)
    }

    /// Returns the current state and worker pid without emitting an event.
    pub async fn snapshot(&self) -> Result<WorkerStatus, SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Snapshot { reply }).await?;
        rx.await.map_err(|_| SupervisorError::Closed)
    }

    /// Stops a running worker, waits for pending escalations, and ends the actor.
    pub async fn shutdown(&self) -> Result<(), SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Shutdown { reply }).await?;
        rx.await.map_err(|_| SupervisorError::Closed)
    }

    /// The broadcaster shared by this supervisor.
    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    async fn send(&self, req: Request) -> Result<(), SupervisorError> {
        self.tx.send(req).await.map_err(|_| SupervisorError::Closed)
    }
}
