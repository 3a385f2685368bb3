//! Transport layer for the swarmbench harness.
//!
//! This crate contains the transport-facing collaborators the harness core
//! drives, split the same way regardless of backend:
//!
//! - [`traits`]: the `Transport`/`Connection`/`Inbound` interface boundary
//! - [`wire`]: the minimal benchmark message codec
//! - [`diagnostics`]: injected monotonic message/frame counters
//! - [`datagram`]: primary-datagram backend (the `kcp` transport kind)
//! - [`websocket`]: browser-socket backend (the `websocket` transport kind)
//! - [`memory`]: in-process channel backend for tests and single-process runs
//!
//! Backends report every delivered message into the shared [`Diagnostics`]
//! handle they were constructed with; nothing in this crate keeps global
//! state.

pub mod datagram;
pub mod diagnostics;
pub mod memory;
pub mod traits;
pub mod websocket;
pub mod wire;

pub use datagram::DatagramTransport;
pub use diagnostics::{CounterSnapshot, Diagnostics};
pub use memory::{ConnectWindow, MemoryTransport};
pub use traits::{
    Connection, Inbound, PeerId, ServerEvent, Transport, TransportError, TransportKind,
    DEFAULT_PORT,
};
pub use websocket::WebSocketTransport;
pub use wire::{Message, WireError};
