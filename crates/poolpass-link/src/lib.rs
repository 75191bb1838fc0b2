//! Persistent link to the remote scanning peripheral.
//!
//! The kiosk's contactless reader lives behind a small network service that
//! pushes scan notifications over a single persistent socket. This crate
//! keeps that socket alive: it connects, parses newline-delimited JSON
//! envelopes, forwards card-scan UIDs to the current handler, and reconnects
//! on any drop after a fixed delay, indefinitely, until shut down.
//!
//! # Architecture
//!
//! ```text
//! RemoteScanLink (handle)
//!     │  set_handler / watch_state / shutdown
//!     ▼
//! link task ──(TCP + LinesCodec)──> scan peripheral service
//!     │
//!     └─> handler slot (read at dispatch time, swappable live)
//! ```
//!
//! The handler slot is deliberate indirection: updating the scan callback
//! never touches the connection, so reconfiguring the kiosk mid-session
//! cannot drop an open socket.

pub mod envelope;
pub mod link;

pub use envelope::ScanEnvelope;
pub use link::{LinkConfig, LinkError, LinkState, RemoteScanLink, ScanHandler};
