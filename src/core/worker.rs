//! # Worker process runtime.
//!
//! Spawns the worker in its own process group and turns its activity into three
//! notification kinds:
//! - **output line** (stdout) → `LOG` published directly to the [`Broadcaster`]
//! - **error line** (stderr) → `ERROR` published directly to the [`Broadcaster`]
//! - **exit** → [`WorkerExit`] sent back to the supervisor actor
//!
//! ## Lifecycle
//! ```text
//! spawn() ──► SpawnedWorker { child, pid }
//!                 │   (actor publishes STATUS started here)
//!                 ▼
//!             observe() ──► WorkerHandle { generation, pid, streams, exited }
//!                 ├─► stdout pump ──► publish LOG     (until EOF or streams.cancel())
//!                 ├─► stderr pump ──► publish ERROR   (until EOF or streams.cancel())
//!                 └─► exit watcher:
//!                       child.wait()
//!                       ├─► drain pumps (bounded by `drain`), then streams.cancel()
//!                       ├─► exited.cancel()           (lets a pending escalation probe the group)
//!                       └─► send WorkerExit { generation, status }
//! ```
//!
//! ## Rules
//! - Pumps only publish; they never touch supervisor state.
//! - The exit watcher owns the child and always reaps it, even after `stop()`
//!   has already dropped the handle.
//! - Lines are split on `\n`, decoded lossily and trimmed; blank lines are skipped.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::config::WorkerCommand;
use crate::error::SpawnError;
use crate::events::Event;
use crate::subscribers::Broadcaster;

/// Exit notification for one worker generation.
#[derive(Debug)]
pub(crate) struct WorkerExit {
    /// Generation of the handle that exited.
    pub generation: u64,
    /// Result of waiting on the child.
    pub status: std::io::Result<ExitStatus>,
}

/// A launched process whose streams are not observed yet.
pub(crate) struct SpawnedWorker {
    child: Child,
    pid: u32,
}

/// The single live worker, owned by the supervisor actor.
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    /// Monotonic lifecycle generation (stale exits are ignored).
    pub generation: u64,
    /// Process id, also the process group id.
    pub pid: u32,
    /// Cancelling unregisters the stream pumps.
    pub streams: CancellationToken,
    /// Cancelled by the exit watcher once the child has been reaped.
    pub exited: CancellationToken,
}

/// Launches `command` in a fresh process group with piped stdout/stderr.
pub(crate) fn spawn(command: &WorkerCommand) -> Result<SpawnedWorker, SpawnError> {
    let mut child = Command::new(command.program())
        .args(command.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(false)
        .spawn()
        .map_err(|source| SpawnError::Launch {
            program: command.program().to_string(),
            source,
        })?;

    match child.id() {
        Some(pid) => Ok(SpawnedWorker { child, pid }),
        None => {
            // Already reaped: nothing left to observe or signal.
            let _ = child.start_kill();
            Err(SpawnError::MissingPid {
                program: command.program().to_string(),
            })
        }
    }
}

impl SpawnedWorker {
    /// Process id of the launched worker.
    pub(crate) fn pid(&self) -> u32 {
        self.pid
    }

    /// Registers the stream and exit observers and returns the live handle.
    pub(crate) fn observe(
        mut self,
        generation: u64,
        drain: Duration,
        broadcaster: Arc<Broadcaster>,
        exits: mpsc::UnboundedSender<WorkerExit>,
    ) -> WorkerHandle {
        let streams = CancellationToken::new();
        let exited = CancellationToken::new();

        let stdout = self.child.stdout.take().map(|out| {
            spawn_pump(out, |line: &str| Event::log(line), streams.clone(), Arc::clone(&broadcaster))
        });
        let stderr = self.child.stderr.take().map(|err| {
            spawn_pump(err, |line: &str| Event::error(line), streams.clone(), Arc::clone(&broadcaster))
        });

        let pid = self.pid;
        let watcher_streams = streams.clone();
        let watcher_exited = exited.clone();
        let mut child = self.child;
        tokio::spawn(async move {
            let status = child.wait().await;

            let pumps = async {
                if let Some(h) = stdout {
                    let _ = h.await;
                }
                if let Some(h) = stderr {
                    let _ = h.await;
                }
            };
            if tokio::time::timeout(drain, pumps).await.is_err() {
                tracing::debug!(pid, "output still open after worker exit; detaching pumps");
            }
            watcher_streams.cancel();
            watcher_exited.cancel();

            let _ = exits.send(WorkerExit { generation, status });
        });

        WorkerHandle {
            generation,
            pid,
            streams,
            exited,
        }
    }
}

/// Reads `reader` line by line and publishes each non-blank line via `make`.
fn spawn_pump<R>(
    reader: R,
    make: fn(&str) -> Event,
    streams: CancellationToken,
    broadcaster: Arc<Broadcaster>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::with_capacity(256);

        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = streams.cancelled() => break,
                read = reader.read_until(b'\n', &mut buf) => read,
            };

            match read {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    if !line.trim().is_empty() {
                        broadcaster.publish(make(&line));
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "worker stream read failed");
                    break;
                }
            }
        }
    })
}
