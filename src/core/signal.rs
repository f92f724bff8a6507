//! # Process-group signalling and forced-termination escalation.
//!
//! Workers run in their own process group (pgid == worker pid), so every signal
//! here targets the whole group: the worker **and** any children it launched.
//!
//! ## Escalation
//! ```text
//! stop() ──► SIGTERM(pgid) ──► Escalation::schedule(pgid, grace, exited)
//!                                   │
//!                   ┌───────────────┴──────────────────┐
//!                   ▼                                  ▼
//!         exited.cancelled()                    deadline (grace) reached
//!         (leader reaped)                       ├─► group empty → Exited
//!         poll group_exists(pgid)               └─► SIGKILL(pgid) → Killed
//!         ├─► empty → EscalationOutcome::Exited
//!         └─► members left → keep waiting for the deadline
//! ```
//!
//! ## Rules
//! - The timer is keyed to the pgid captured at `stop()` time, never to the
//!   supervisor's current handle, so a worker started during the grace window is untouched.
//! - Reaping the leader does not disarm the timer: members that ignored SIGTERM
//!   keep the pgid reserved and are killed at the deadline.
//! - Signal delivery to a group that no longer exists is an expected outcome
//!   ([`SignalOutcome::AlreadyGone`]), not an error.

use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Result of delivering a signal to a process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The signal was delivered.
    Delivered,
    /// The process group no longer exists.
    AlreadyGone,
    /// Delivery failed for another reason (e.g. permissions).
    Failed(Errno),
}

/// Sends `signal` to the process group `pgid`.
pub fn signal_group(pgid: u32, signal: Signal) -> SignalOutcome {
    deliver(pgid, Some(signal))
}

/// True while at least one member of the process group `pgid` exists.
pub fn group_exists(pgid: u32) -> bool {
    matches!(
        deliver(pgid, None),
        SignalOutcome::Delivered | SignalOutcome::Failed(Errno::EPERM)
    )
}

fn deliver(pgid: u32, signal: Option<Signal>) -> SignalOutcome {
    let Ok(raw) = i32::try_from(pgid) else {
        return SignalOutcome::Failed(Errno::EINVAL);
    };
    // pgid 0 or 1 would target our own group or init.
    if raw <= 1 {
        return SignalOutcome::Failed(Errno::EINVAL);
    }

    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) => SignalOutcome::Delivered,
        Err(Errno::ESRCH) => SignalOutcome::AlreadyGone,
        Err(errno) => SignalOutcome::Failed(errno),
    }
}

/// How a scheduled escalation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// The whole process group was gone before the deadline (or the timer was cancelled).
    Exited,
    /// The grace window elapsed and SIGKILL was sent to the group.
    Killed(SignalOutcome),
}

/// Polling interval for group liveness once the leader has been reaped.
const GROUP_POLL: Duration = Duration::from_millis(25);

/// Scheduled forced termination of one process group.
pub struct Escalation {
    pgid: u32,
    cancel: CancellationToken,
    join: JoinHandle<EscalationOutcome>,
}

impl Escalation {
    /// Schedules SIGKILL for `pgid` after `grace`, unless the group is gone by then.
    ///
    /// `exited` is cancelled once the group leader has been reaped. Until then the
    /// pgid stays reserved; afterwards the group is probed until it is empty or the
    /// deadline passes, so members that ignored SIGTERM are still killed.
    pub fn schedule(pgid: u32, grace: Duration, exited: CancellationToken) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let deadline = Instant::now() + grace;

        let join = tokio::spawn(async move {
            loop {
                if exited.is_cancelled() && !group_exists(pgid) {
                    return EscalationOutcome::Exited;
                }
                tokio::select! {
                    _ = token.cancelled() => return EscalationOutcome::Exited,
                    _ = tokio::time::sleep_until(deadline) => break,
                    _ = exited.cancelled(), if !exited.is_cancelled() => {}
                    _ = tokio::time::sleep(GROUP_POLL), if exited.is_cancelled() => {}
                }
            }

            if exited.is_cancelled() && !group_exists(pgid) {
                return EscalationOutcome::Exited;
            }
            match signal_group(pgid, Signal::SIGKILL) {
                SignalOutcome::AlreadyGone => EscalationOutcome::Exited,
                outcome => {
                    tracing::warn!(
                        pgid,
                        ?grace,
                        ?outcome,
                        "process group outlived SIGTERM; sent SIGKILL"
                    );
                    EscalationOutcome::Killed(outcome)
                }
            }
        });

        Self { pgid, cancel, join }
    }

    /// Process group targeted by this escalation.
    pub fn pgid(&self) -> u32 {
        self.pgid
    }

    /// Cancels the pending SIGKILL (no-op if it already fired).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the escalation has resolved either way.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the escalation to resolve.
    pub async fn wait(self) -> EscalationOutcome {
        self.join.await.unwrap_or(EscalationOutcome::Exited)
    }
}
