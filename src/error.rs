//! Error types used by the procvisor runtime and gateway.
//!
//! - [`SpawnError`]: the worker executable could not be launched.
//! - [`SupervisorError`]: the supervisor actor is no longer reachable.
//! - [`AdmissionError`]: a connection presented a bad or missing secret.
//! - [`ConfigError`]: invalid configuration (e.g. an empty worker command).
//!
//! Each type provides `as_label` (stable snake_case for logs) and `as_message`.
//! Signal delivery failures are not errors here: they are reported as
//! [`SignalOutcome`](crate::SignalOutcome) values and ignored by the supervisor.

use thiserror::Error;

/// # Errors produced when launching the worker.
///
/// Never fatal: the supervisor turns these into an `ERROR` event and stays `STOPPED`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SpawnError {
    /// The OS refused to launch the program (missing executable, permissions, ...).
    #[error("failed to spawn worker `{program}`: {source}")]
    Launch {
        /// Program that was being launched.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The process started but exited before its identifier could be read.
    #[error("worker `{program}` exited before its pid was known")]
    MissingPid {
        /// Program that was launched.
        program: String,
    },
}

impl SpawnError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use procvisor::SpawnError;
    ///
    /// let err = SpawnError::MissingPid { program: "./worker".into() };
    /// assert_eq!(err.as_label(), "spawn_missing_pid");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SpawnError::Launch { .. } => "spawn_launch_failed",
            SpawnError::MissingPid { .. } => "spawn_missing_pid",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced by a [`SupervisorHandle`](crate::SupervisorHandle).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorError {
    /// The supervisor actor has exited; no further commands can be served.
    #[error("supervisor closed")]
    Closed,
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::Closed => "supervisor_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SupervisorError::Closed => "supervisor actor is no longer running".to_string(),
        }
    }
}

/// # Admission failures.
///
/// Terminal for the offending connection: it receives one `ERROR Unauthorized`
/// event and is closed before it is ever registered with the broadcaster.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    /// No secret was presented while one is configured.
    #[error("Unauthorized")]
    MissingSecret,

    /// The presented secret does not match the configured one.
    #[error("Unauthorized")]
    SecretMismatch,
}

impl AdmissionError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use procvisor::AdmissionError;
    ///
    /// assert_eq!(AdmissionError::SecretMismatch.as_label(), "admission_secret_mismatch");
    /// assert_eq!(AdmissionError::SecretMismatch.to_string(), "Unauthorized");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AdmissionError::MissingSecret => "admission_missing_secret",
            AdmissionError::SecretMismatch => "admission_secret_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            AdmissionError::MissingSecret => "no secret presented".to_string(),
            AdmissionError::SecretMismatch => "secret mismatch".to_string(),
        }
    }
}

/// # Configuration errors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The worker command string has no program.
    #[error("worker command is empty")]
    EmptyCommand,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::EmptyCommand => "config_empty_command",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConfigError::EmptyCommand => "worker command has no program".to_string(),
        }
    }
}
