//! # Broadcaster: non-blocking fan-out over the connection set.
//!
//! [`Broadcaster`] owns the set of admitted observer channels and republishes
//! every [`Event`] to all of them **without awaiting** delivery.
//!
//! ## Architecture
//! ```text
//! publish(event)
//!     │                        (Arc-clone per member)
//!     ├──► [queue C1] ──► websocket writer C1
//!     ├──► [queue C2] ──► websocket writer C2
//!     └──► [queue SN] ──► worker SN ──► subscriber.on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `publish()` returns immediately (uses `try_send`)
//! - **Per-member FIFO**: each member sees events in publish order
//! - **Isolation**: a closed or full member is removed; the others still receive the event
//! - **No errors to the caller**: delivery failures are logged, never returned
//! - **Seeding**: a member registered with a seed event receives it before anything else

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Identifier of one member of the connection set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-member channel metadata.
struct Member {
    name: Arc<str>,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for admitted connections and in-process subscribers.
pub struct Broadcaster {
    members: Mutex<HashMap<ConnectionId, Member>>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

impl Broadcaster {
    /// Creates an empty broadcaster whose members get queues of `queue_capacity` (min 1).
    #[must_use]
    pub fn new(queue_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            members: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            queue_capacity: queue_capacity.max(1),
        })
    }

    /// Adds a member to the connection set and returns its receiving side.
    ///
    /// If `seed` is given it is queued in the same critical section as the
    /// insertion, so it precedes every later `publish`.
    pub fn register(self: &Arc<Self>, name: impl Into<Arc<str>>, seed: Option<Event>) -> Subscription {
        self.register_with_capacity(name.into(), seed, self.queue_capacity)
    }

    fn register_with_capacity(
        self: &Arc<Self>,
        name: Arc<str>,
        seed: Option<Event>,
        capacity: usize,
    ) -> Subscription {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, rx) = mpsc::channel::<Arc<Event>>(capacity.max(1));

        let mut members = self.lock();
        if let Some(ev) = seed {
            // Fresh channel with capacity >= 1: cannot be full.
            let _ = sender.try_send(Arc::new(ev));
        }
        members.insert(
            id,
            Member {
                name: Arc::clone(&name),
                sender,
            },
        );
        drop(members);

        tracing::debug!(connection = %id, name = %name, "member registered");
        Subscription {
            id,
            rx,
            owner: Arc::downgrade(self),
        }
    }

    /// Removes a member. Returns `false` if it was not present (idempotent).
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.lock().remove(&id);
        if let Some(member) = &removed {
            tracing::debug!(connection = %id, name = %member.name, "member unregistered");
        }
        removed.is_some()
    }

    /// Fan-out one event to all members (non-blocking).
    ///
    /// A member whose queue is **full** or **closed** is removed from the set;
    /// the failure is logged and never reported to the caller.
    pub fn publish(&self, event: Event) {
        let ev = Arc::new(event);
        self.lock().retain(|id, member| {
            match member.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection = %id,
                        name = %member.name,
                        capacity = member.sender.max_capacity(),
                        "dropping member: delivery queue full"
                    );
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(
                        connection = %id,
                        name = %member.name,
                        "dropping member: channel closed"
                    );
                    false
                }
            }
        });
    }

    /// Attaches an in-process subscriber with its own queue and worker task.
    ///
    /// Panics inside the subscriber are caught and logged; the worker keeps going.
    /// The worker ends when the subscriber is unregistered or dropped for overflow.
    pub fn attach(self: &Arc<Self>, sub: Arc<dyn Subscribe>) -> JoinHandle<()> {
        let mut subscription =
            self.register_with_capacity(Arc::from(sub.name()), None, sub.queue_capacity());

        tokio::spawn(async move {
            while let Some(ev) = subscription.recv().await {
                let fut = sub.on_event(ev.as_ref());
                if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                    tracing::error!(
                        subscriber = sub.name(),
                        "subscriber panicked: {:?}",
                        panic_err
                    );
                }
            }
        })
    }

    /// True if `id` is currently a member.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Member>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Receiving side of one member. Dropping it unregisters the member.
pub struct Subscription {
    id: ConnectionId,
    rx: mpsc::Receiver<Arc<Event>>,
    owner: Weak<Broadcaster>,
}

impl Subscription {
    /// Identifier of this member.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Waits for the next event. Returns `None` once the member has been removed
    /// and its queue is drained.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.unregister(self.id);
        }
    }
}
