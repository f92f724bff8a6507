//! # Outbound events delivered to every admitted connection.
//!
//! The [`EventKind`] enum classifies the three notifications the supervisor emits:
//! - **`LOG`**: one trimmed line of the worker's standard output
//! - **`ERROR`**: one trimmed line of standard error, or a diagnostic
//! - **`STATUS`**: the worker state, exactly `"started"` or `"stopped"`
//!
//! ## Wire format
//! ```text
//! { "type": "LOG" | "ERROR" | "STATUS", "message": "<string>" }
//! ```
//!
//! ## Example
//! ```rust
//! use procvisor::{Event, EventKind, WorkerState};
//!
//! let ev = Event::status(WorkerState::Started);
//! assert_eq!(ev.kind, EventKind::Status);
//! assert_eq!(ev.to_json().unwrap(), r#"{"type":"STATUS","message":"started"}"#);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of outbound events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    /// Worker standard output line.
    Log,
    /// Worker standard error line or supervisor diagnostic.
    Error,
    /// Worker lifecycle state.
    Status,
}

impl EventKind {
    /// Returns the wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Log => "LOG",
            EventKind::Error => "ERROR",
            EventKind::Status => "STATUS",
        }
    }
}

/// Externally observable worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// No worker handle exists.
    #[default]
    Stopped,
    /// A worker handle exists.
    Started,
}

impl WorkerState {
    /// Returns the wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Stopped => "stopped",
            WorkerState::Started => "started",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable notification with a kind and a message.
///
/// Events carry no identity beyond their content: two events with the same
/// kind and message are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Event classification (serialized as `type`).
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Payload text.
    pub message: String,
}

impl Event {
    /// Creates an event of the given kind.
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a `LOG` event, trimming surrounding whitespace.
    #[inline]
    pub fn log(line: impl AsRef<str>) -> Self {
        Self::new(EventKind::Log, line.as_ref().trim())
    }

    /// Creates an `ERROR` event, trimming surrounding whitespace.
    #[inline]
    pub fn error(line: impl AsRef<str>) -> Self {
        Self::new(EventKind::Error, line.as_ref().trim())
    }

    /// Creates a `STATUS` event for the given state.
    #[inline]
    pub fn status(state: WorkerState) -> Self {
        Self::new(EventKind::Status, state.as_str())
    }

    /// The rejection sent to a connection that fails admission.
    #[inline]
    pub fn unauthorized() -> Self {
        Self::new(EventKind::Error, "Unauthorized")
    }

    /// Serializes the event into its JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
