//! Primary-datagram transport backend (the `kcp` kind).
//!
//! One message per datagram. The listening socket tracks peers by source
//! address; a peer exists from the moment its introduction datagram arrives.
//! Plain datagrams carry no departure signal, so this backend never emits
//! [`ServerEvent::Left`].

use crate::diagnostics::Diagnostics;
use crate::traits::{
    Connection, Inbound, PeerId, ServerEvent, Transport, TransportError, TransportKind,
    DEFAULT_PORT,
};
use crate::wire::Message;
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::mpsc;
use tracing::{trace, warn};

const MAX_DATAGRAM: usize = 2048;

/// Datagram transport over UDP sockets.
pub struct DatagramTransport {
    port: u16,
    diagnostics: Arc<Diagnostics>,
}

impl DatagramTransport {
    pub fn new(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            port: DEFAULT_PORT,
            diagnostics,
        }
    }
}

#[async_trait]
impl Transport for DatagramTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Kcp
    }

    fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn Connection>, TransportError> {
        let target = format!("{}:{}", address, self.port);
        let resolved = lookup_host(target.as_str())
            .await?
            .next()
            .ok_or_else(|| TransportError::Resolve(target.clone()))?;

        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(resolved).await?;

        Ok(Box::new(DatagramConnection {
            socket,
            diagnostics: self.diagnostics.clone(),
        }))
    }

    async fn listen(&self) -> Result<Box<dyn Inbound>, TransportError> {
        let socket = UdpSocket::bind(("0.0.0.0", self.port)).await?;
        let (events, inbound) = mpsc::unbounded_channel();
        let diagnostics = self.diagnostics.clone();

        tokio::spawn(async move {
            let mut peers: HashMap<SocketAddr, PeerId> = HashMap::new();
            let mut next_peer: PeerId = 1;
            let mut buf = [0u8; MAX_DATAGRAM];

            loop {
                let (len, src) = match socket.recv_from(&mut buf).await {
                    Ok(received) => received,
                    Err(error) => {
                        warn!(%error, "datagram receive failed, stopping listener");
                        break;
                    }
                };

                let message = match Message::decode(&buf[..len]) {
                    Ok(message) => message,
                    Err(error) => {
                        trace!(%src, %error, "dropping undecodable datagram");
                        continue;
                    }
                };
                diagnostics.record_inbound();

                let event = match message {
                    Message::Join => {
                        if peers.contains_key(&src) {
                            continue;
                        }
                        let peer = next_peer;
                        next_peer += 1;
                        peers.insert(src, peer);
                        ServerEvent::Joined(peer)
                    }
                    Message::Action => match peers.get(&src) {
                        Some(&peer) => ServerEvent::Message(peer, message),
                        None => {
                            trace!(%src, "dropping datagram from unintroduced peer");
                            continue;
                        }
                    },
                };

                if events.send(event).is_err() {
                    break;
                }
            }
        });

        Ok(Box::new(DatagramInbound { events: inbound }))
    }
}

struct DatagramConnection {
    socket: UdpSocket,
    diagnostics: Arc<Diagnostics>,
}

#[async_trait]
impl Connection for DatagramConnection {
    async fn send(&mut self, message: Message) -> Result<(), TransportError> {
        self.socket.send(&message.encode()).await?;
        self.diagnostics.record_outbound();
        Ok(())
    }
}

struct DatagramInbound {
    events: mpsc::UnboundedReceiver<ServerEvent>,
}

#[async_trait]
impl Inbound for DatagramInbound {
    async fn next_event(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_then_action_reach_listener() {
        let diagnostics = Arc::new(Diagnostics::default());
        let mut transport = DatagramTransport::new(diagnostics.clone());
        transport.set_port(47317);

        let mut inbound = transport.listen().await.unwrap();
        let mut conn = transport.connect("127.0.0.1").await.unwrap();

        conn.send(Message::Join).await.unwrap();
        let joined = inbound.next_event().await.unwrap();
        let peer = match joined {
            ServerEvent::Joined(peer) => peer,
            other => panic!("expected join, got {other:?}"),
        };

        conn.send(Message::Action).await.unwrap();
        match inbound.next_event().await.unwrap() {
            ServerEvent::Message(from, Message::Action) => assert_eq!(from, peer),
            other => panic!("expected action, got {other:?}"),
        }

        let counters = diagnostics.snapshot();
        assert_eq!(counters.outbound, 2);
        assert_eq!(counters.inbound, 2);
    }
}
