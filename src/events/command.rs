//! # Inbound control commands.
//!
//! Each inbound text message is matched exactly (case-sensitive) against the
//! command vocabulary:
//!
//! | message          | command             |
//! |------------------|---------------------|
//! | `start`          | [`Command::Start`]  |
//! | `stop` / `kill`  | [`Command::Stop`]   |
//! | `status`         | [`Command::Status`] |
//!
//! Anything else fails to parse and is ignored by the gateway.

use std::str::FromStr;

use thiserror::Error;

/// Stateless control command produced per inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Start the worker (no-op if already started).
    Start,
    /// Stop the worker (no-op if already stopped).
    Stop,
    /// Report the worker state.
    Status,
}

/// Returned when an inbound message is not part of the command vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown command {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Command::Start),
            "stop" | "kill" => Ok(Command::Stop),
            "status" => Ok(Command::Status),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary() {
        assert_eq!("start".parse(), Ok(Command::Start));
        assert_eq!("stop".parse(), Ok(Command::Stop));
        assert_eq!("kill".parse(), Ok(Command::Stop));
        assert_eq!("status".parse(), Ok(Command::Status));
    }

    #[test]
    fn exact_match_only() {
        for raw in ["Start", "STOP", " start", "status\n", "restart", ""] {
            assert!(raw.parse::<Command>().is_err(), "{raw:?} should not parse");
        }
    }
}
