//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`] (runtime settings) and [`WorkerCommand`]
//! (the program and argument vector of the managed worker).
//!
//! ## Sentinel values
//! - `command_capacity = 0` and `queue_capacity = 0` are clamped to 1
//! - `drain = 0s` publishes `STATUS stopped` without waiting for buffered output

use std::{fmt, str::FromStr, time::Duration};

use crate::error::ConfigError;

/// Program and argument vector of the worker.
///
/// Parsed from a single string by splitting on whitespace; quoting is not supported.
///
/// # Example
/// ```
/// use procvisor::WorkerCommand;
///
/// let cmd: WorkerCommand = "./worker -i eth0".parse().unwrap();
/// assert_eq!(cmd.program(), "./worker");
/// assert_eq!(cmd.args(), ["-i", "eth0"]);
/// assert!("   ".parse::<WorkerCommand>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerCommand {
    program: String,
    args: Vec<String>,
}

impl WorkerCommand {
    /// Creates a command from an explicit program and arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Executable path or name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument vector (without the program).
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl FromStr for WorkerCommand {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let program = parts.next().ok_or(ConfigError::EmptyCommand)?;
        Ok(Self::new(program, parts))
    }
}

impl fmt::Display for WorkerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runtime configuration for the worker supervisor.
///
/// ## Field semantics
/// - `command`: worker program and arguments
/// - `grace`: delay between SIGTERM and SIGKILL escalation on `stop`
/// - `drain`: how long to keep reading output after a self-exit before `STATUS stopped`
/// - `command_capacity`: bounded queue between handles and the actor (min 1)
/// - `queue_capacity`: per-connection delivery queue (min 1); a full queue drops the connection
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Worker program and arguments.
    pub command: WorkerCommand,
    /// Grace window before the forced-termination escalation.
    pub grace: Duration,
    /// Output drain window after the worker exits on its own.
    pub drain: Duration,
    /// Capacity of the command queue feeding the supervisor actor.
    pub command_capacity: usize,
    /// Capacity of each connection's delivery queue.
    pub queue_capacity: usize,
}

impl SupervisorConfig {
    /// Creates a config for `command` with default timings and capacities.
    pub fn new(command: WorkerCommand) -> Self {
        Self {
            command,
            grace: Duration::from_millis(250),
            drain: Duration::from_millis(100),
            command_capacity: 64,
            queue_capacity: 1024,
        }
    }

    /// Overrides the escalation grace window.
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Overrides the per-connection delivery queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Returns the command queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }

    /// Returns the per-connection queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_any_whitespace() {
        let cmd: WorkerCommand = "  ./worker   -i\teth0 ".parse().unwrap();
        assert_eq!(cmd, WorkerCommand::new("./worker", ["-i", "eth0"]));
        assert_eq!(cmd.to_string(), "./worker -i eth0");
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = "".parse::<WorkerCommand>().unwrap_err();
        assert_eq!(err, ConfigError::EmptyCommand);
        assert_eq!(err.as_label(), "config_empty_command");
        assert!(!err.as_message().is_empty());
    }

    #[test]
    fn defaults_and_clamping() {
        let mut cfg = SupervisorConfig::new(WorkerCommand::new("true", Vec::<String>::new()));
        assert_eq!(cfg.grace, Duration::from_millis(250));

        assert_eq!(cfg.queue_capacity_clamped(), 1024);

        cfg.command_capacity = 0;
        cfg = cfg.with_queue_capacity(0);
        assert_eq!(cfg.command_capacity_clamped(), 1);
        assert_eq!(cfg.queue_capacity_clamped(), 1);
    }
}
