//! # LogWriter: mirrors worker events into `tracing`.
//!
//! ## Example output
//! ```text
//! INFO procvisor::worker: started
//! INFO procvisor::worker: waiting for peer...
//! WARN procvisor::worker: interface eth0 not found
//! INFO procvisor::worker: stopped
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::Log => tracing::info!(target: "procvisor::worker", "{}", e.message),
            EventKind::Error => tracing::warn!(target: "procvisor::worker", "{}", e.message),
            EventKind::Status => {
                tracing::info!(target: "procvisor::worker", status = %e.message, "worker status")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
