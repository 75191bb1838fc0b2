//! Process-wide activity signal bus.
//!
//! Device-input components and virtual-input components announce "the user
//! did something" here so the inactivity supervisor can observe activity
//! without holding a direct reference to any of them. Signals carry no
//! payload and no ordering guarantee across listeners.
//!
//! # Examples
//!
//! ```
//! use poolpass_core::ActivityBus;
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = ActivityBus::new();
//!     let mut listener = bus.subscribe();
//!
//!     bus.signal();
//!     assert!(listener.next().await);
//! }
//! ```

use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Capacity of the underlying broadcast channel.
///
/// Signals are payload-free and coalescible, so a lagged listener loses
/// nothing: a burst of missed signals still reads as "activity happened".
const BUS_CAPACITY: usize = 64;

/// Fire-and-forget broadcast bus for user-activity signals.
///
/// Cloning the bus yields another sender onto the same channel, so device
/// components can each hold their own handle. Dropping all clones closes the
/// channel, which listeners observe as the bus going away.
#[derive(Debug, Clone)]
pub struct ActivityBus {
    tx: broadcast::Sender<()>,
}

impl ActivityBus {
    /// Create a new bus with no listeners.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Announce user activity to every current listener.
    ///
    /// Fire-and-forget: a bus with no listeners swallows the signal. Safe to
    /// call from within a listener's own handling (reentrancy only enqueues
    /// another signal).
    pub fn signal(&self) {
        trace!(listeners = self.tx.receiver_count(), "activity signal");
        // send only errors when there are no receivers, which is fine
        let _ = self.tx.send(());
    }

    /// Subscribe to activity signals.
    ///
    /// Dropping the returned listener unsubscribes it. Each listener only
    /// observes signals sent after it subscribed, which is exactly what the
    /// inactivity supervisor wants when it re-arms with a fresh listener.
    pub fn subscribe(&self) -> ActivityListener {
        debug!(listeners = self.tx.receiver_count() + 1, "activity listener subscribed");
        ActivityListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of currently subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ActivityBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the activity bus.
#[derive(Debug)]
pub struct ActivityListener {
    rx: broadcast::Receiver<()>,
}

impl ActivityListener {
    /// Wait for the next activity signal.
    ///
    /// Returns `true` when activity occurred and `false` when every bus
    /// handle has been dropped. A lagged listener (more than the channel
    /// capacity of unread signals) still returns `true`: coalesced signals
    /// mean activity all the same.
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Ok(()) => true,
            Err(broadcast::error::RecvError::Lagged(_)) => true,
            Err(broadcast::error::RecvError::Closed) => false,
        }
    }
}
