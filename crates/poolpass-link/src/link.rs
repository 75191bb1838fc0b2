//! Remote-scan link state machine and background task.
//!
//! Lifecycle: `disconnected → connecting → connected → disconnected → …`,
//! repeating at a fixed reconnect delay (no backoff, no retry cap) for as
//! long as the link is alive. Every failure path resolves into a scheduled
//! retry; nothing here is fatal.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use poolpass_core::ScanUid;
use poolpass_core::constants::RECONNECT_DELAY;

use crate::envelope::ScanEnvelope;

/// Callback invoked for each card scan pushed by the peripheral.
pub type ScanHandler = Arc<dyn Fn(ScanUid) + Send + Sync>;

/// Errors surfaced by the link handle.
///
/// Connection-level failures never appear here: they are retried internally.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The background task panicked or was aborted externally.
    #[error("Link task terminated abnormally: {0}")]
    TaskFailed(String),
}

/// Connection state of the link, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No socket open and no connect in flight.
    Disconnected,

    /// Connect attempt in flight.
    Connecting,

    /// Socket open, envelopes flowing.
    Connected,
}

/// Configuration for the remote-scan link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Endpoint of the scanning peripheral service (host:port).
    pub endpoint: String,

    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay: Duration,
}

impl LinkConfig {
    /// Configuration with the standard reconnect delay.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

/// Handle to the persistent scan-peripheral connection.
///
/// Creating the link spawns one background task that owns the socket and all
/// reconnect timing. The handle can observe state, swap the scan handler
/// without disturbing the connection, and shut the whole thing down exactly
/// once.
///
/// # Examples
///
/// ```no_run
/// use poolpass_link::{LinkConfig, RemoteScanLink};
///
/// # async fn example() {
/// let link = RemoteScanLink::spawn(LinkConfig::new("127.0.0.1:9400"));
/// link.set_handler(|uid| println!("scan: {uid}"));
///
/// // ... kiosk runs ...
///
/// link.shutdown().await.ok();
/// # }
/// ```
pub struct RemoteScanLink {
    state_rx: watch::Receiver<LinkState>,
    handler: Arc<RwLock<Option<ScanHandler>>>,
    cancel: CancellationToken,
    /// Taken by `shutdown`; present for the link's whole useful life.
    task: Option<JoinHandle<()>>,
}

impl RemoteScanLink {
    /// Spawn the link task and begin connecting immediately.
    pub fn spawn(config: LinkConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(LinkState::Disconnected);
        let handler: Arc<RwLock<Option<ScanHandler>>> = Arc::new(RwLock::new(None));
        let cancel = CancellationToken::new();

        debug!(endpoint = %config.endpoint, "spawning remote-scan link");
        let task = tokio::spawn(run_link(
            config,
            state_tx,
            Arc::clone(&handler),
            cancel.clone(),
        ));

        Self {
            state_rx,
            handler,
            cancel,
            task: Some(task),
        }
    }

    /// Install the current scan handler.
    ///
    /// The handler slot is read at dispatch time, so swapping it never
    /// requires tearing down or reopening the socket.
    pub fn set_handler(&self, handler: impl Fn(ScanUid) + Send + Sync + 'static) {
        if let Ok(mut slot) = self.handler.write() {
            *slot = Some(Arc::new(handler));
        }
    }

    /// Remove the current scan handler; scans are dropped until a new one
    /// is installed.
    pub fn clear_handler(&self) {
        if let Ok(mut slot) = self.handler.write() {
            *slot = None;
        }
    }

    /// Current connection state.
    pub fn state(&self) -> LinkState {
        *self.state_rx.borrow()
    }

    /// Whether the socket is currently open.
    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    /// Watch connection state changes.
    pub fn watch_state(&self) -> watch::Receiver<LinkState> {
        self.state_rx.clone()
    }

    /// Shut the link down: cancel any pending reconnect and close the socket.
    ///
    /// Idempotent from the caller's perspective; the socket is closed exactly
    /// once by the task as it exits.
    ///
    /// # Errors
    ///
    /// Returns `LinkError::TaskFailed` if the background task panicked. The
    /// link is torn down either way.
    pub async fn shutdown(mut self) -> Result<(), LinkError> {
        info!("shutting down remote-scan link");
        self.cancel.cancel();
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|err| LinkError::TaskFailed(err.to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for RemoteScanLink {
    fn drop(&mut self) {
        // A dropped handle must not leak the reconnect loop.
        self.cancel.cancel();
    }
}

/// Connection supervision loop. Owns the socket and all reconnect timing.
async fn run_link(
    config: LinkConfig,
    state_tx: watch::Sender<LinkState>,
    handler: Arc<RwLock<Option<ScanHandler>>>,
    cancel: CancellationToken,
) {
    loop {
        state_tx.send_replace(LinkState::Connecting);

        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = TcpStream::connect(&config.endpoint) => result,
        };

        match connected {
            Ok(stream) => {
                info!(endpoint = %config.endpoint, "scan peripheral connected");
                state_tx.send_replace(LinkState::Connected);

                read_envelopes(stream, &handler, &cancel).await;
                if cancel.is_cancelled() {
                    break;
                }
            }
            Err(err) => {
                warn!(endpoint = %config.endpoint, %err, "scan peripheral connect failed");
            }
        }

        state_tx.send_replace(LinkState::Disconnected);

        debug!(
            delay_ms = config.reconnect_delay.as_millis() as u64,
            "scheduling reconnect"
        );
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }

    state_tx.send_replace(LinkState::Disconnected);
    debug!("remote-scan link task exited");
}

/// Read envelopes until the connection drops or the link is cancelled.
///
/// Read errors are treated identically to a peer close: the connection is
/// abandoned and the caller schedules a reconnect.
async fn read_envelopes(
    stream: TcpStream,
    handler: &Arc<RwLock<Option<ScanHandler>>>,
    cancel: &CancellationToken,
) {
    let mut framed = Framed::new(stream, LinesCodec::new());

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => return,
            line = framed.next() => line,
        };

        match line {
            Some(Ok(line)) => dispatch_line(&line, handler),
            Some(Err(err)) => {
                warn!(%err, "read error on scan link, treating as close");
                return;
            }
            None => {
                warn!("scan peripheral closed the connection");
                return;
            }
        }
    }
    // Dropping `framed` here closes the socket; reconnects open a new one.
}

/// Parse one line and forward card scans to the current handler.
///
/// Malformed lines are logged and dropped; they never take the link down.
fn dispatch_line(line: &str, handler: &Arc<RwLock<Option<ScanHandler>>>) {
    let envelope: ScanEnvelope = match serde_json::from_str(line) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(%err, "malformed envelope from scan peripheral, dropping");
            return;
        }
    };

    let Some(uid) = envelope.card_scan_uid() else {
        trace!(event = %envelope.event, "ignoring non-scan envelope");
        return;
    };

    // Read the slot at dispatch time: a freshly swapped handler sees the
    // very next scan.
    let current = handler.read().ok().and_then(|slot| slot.clone());
    match current {
        Some(callback) => {
            debug!(%uid, "forwarding card scan");
            callback(uid);
        }
        None => trace!(%uid, "no scan handler installed, dropping scan"),
    }
}
