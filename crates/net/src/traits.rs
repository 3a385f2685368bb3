//! Transport interface boundary.
//!
//! The harness core only ever talks to these traits; concrete backends live
//! in [`crate::datagram`], [`crate::websocket`], and [`crate::memory`].
//! Exactly one transport instance is built per process and shared by the
//! server role and every client session.

use crate::wire::{Message, WireError};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Default listen/connect port when no `-port` override is given.
pub const DEFAULT_PORT: u16 = 7777;

/// Server-side identity of a connected peer.
pub type PeerId = u64;

/// Selectable transport kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Primary-datagram transport.
    Kcp,
    /// Browser-socket transport.
    Websocket,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kcp => f.write_str("kcp"),
            Self::Websocket => f.write_str("websocket"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = UnknownTransportKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "kcp" => Ok(Self::Kcp),
            "websocket" => Ok(Self::Websocket),
            other => Err(UnknownTransportKind(other.to_string())),
        }
    }
}

/// Error for an unrecognized transport kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport kind `{0}`")]
pub struct UnknownTransportKind(pub String);

/// Errors surfaced by transport backends.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("could not resolve address `{0}`")]
    Resolve(String),
    #[error("peer unreachable: {0}")]
    PeerUnreachable(String),
    #[error("connection closed")]
    Closed,
}

/// Events delivered to the server role by a listening transport.
#[derive(Debug)]
pub enum ServerEvent {
    /// A peer completed its introduction.
    Joined(PeerId),
    /// A message arrived from an introduced peer.
    Message(PeerId, Message),
    /// An introduced peer went away.
    Left(PeerId),
}

/// An established client-side connection.
#[async_trait]
pub trait Connection: Send {
    /// Send one message to the server.
    async fn send(&mut self, message: Message) -> Result<(), TransportError>;
}

/// Server-side stream of connection events.
#[async_trait]
pub trait Inbound: Send {
    /// Next event, or `None` once the listener has shut down.
    async fn next_event(&mut self) -> Option<ServerEvent>;
}

/// A pluggable transport.
///
/// `set_port` is applied by the transport selector before the instance is
/// shared; after that the transport is immutable.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Which kind this backend implements.
    fn kind(&self) -> TransportKind;

    /// Override the listen/connect port.
    fn set_port(&mut self, port: u16);

    /// Establish a client connection to `address`.
    async fn connect(&self, address: &str) -> Result<Box<dyn Connection>, TransportError>;

    /// Start listening and return the server's event stream.
    async fn listen(&self) -> Result<Box<dyn Inbound>, TransportError>;
}
