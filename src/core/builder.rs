use std::sync::Arc;

use tokio::sync::mpsc;

use super::{config::SupervisorConfig, handle::SupervisorHandle, supervisor::SupervisorActor};
use crate::subscribers::{Broadcaster, Subscribe};

/// Entry point for constructing a worker supervisor.
pub struct Supervisor;

impl Supervisor {
    /// Creates a builder with the given configuration.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    /// Spawns a supervisor without in-process subscribers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(cfg: SupervisorConfig) -> SupervisorHandle {
        SupervisorBuilder::new(cfg).build()
    }
}

/// Builder for a supervisor with optional subscribers.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets in-process subscribers (e.g. [`LogWriter`](crate::LogWriter)).
    ///
    /// They are attached before the actor starts, so they observe every event.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Spawns the supervisor actor and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> SupervisorHandle {
        let broadcaster = Broadcaster::new(self.cfg.queue_capacity_clamped());
        for sub in self.subscribers {
            broadcaster.attach(sub);
        }

        let (tx, requests) = mpsc::channel(self.cfg.command_capacity_clamped());
        let (exits_tx, exits) = mpsc::unbounded_channel();

        let actor = SupervisorActor::new(self.cfg, Arc::clone(&broadcaster), exits_tx);
        tokio::spawn(actor.run(requests, exits));

        SupervisorHandle::new(tx, broadcaster)
    }
}
