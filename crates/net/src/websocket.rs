//! Browser-socket transport backend (the `websocket` kind).
//!
//! Messages ride in binary websocket frames, one message per frame. The
//! listener accepts TCP connections, performs the websocket handshake, and
//! reads each connection on its own task; a peer that closes its stream (or
//! errors) is reported as [`ServerEvent::Left`] once it had introduced
//! itself.

use crate::diagnostics::Diagnostics;
use crate::traits::{
    Connection, Inbound, PeerId, ServerEvent, Transport, TransportError, TransportKind,
    DEFAULT_PORT,
};
use crate::wire::Message;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{accept_async, connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

/// Websocket transport over TCP.
pub struct WebSocketTransport {
    port: u16,
    diagnostics: Arc<Diagnostics>,
}

impl WebSocketTransport {
    pub fn new(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            port: DEFAULT_PORT,
            diagnostics,
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Websocket
    }

    fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn Connection>, TransportError> {
        let url = format!("ws://{}:{}", address, self.port);
        let (stream, _response) = connect_async(url.as_str()).await?;

        Ok(Box::new(WebSocketConnection {
            stream,
            diagnostics: self.diagnostics.clone(),
        }))
    }

    async fn listen(&self) -> Result<Box<dyn Inbound>, TransportError> {
        let listener = TcpListener::bind(("0.0.0.0", self.port)).await?;
        let (events, inbound) = mpsc::unbounded_channel();
        let diagnostics = self.diagnostics.clone();

        tokio::spawn(async move {
            let mut next_peer: PeerId = 1;

            loop {
                let (tcp, remote) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(error) => {
                        warn!(%error, "websocket accept failed, stopping listener");
                        break;
                    }
                };

                let peer = next_peer;
                next_peer += 1;
                let events = events.clone();
                let diagnostics = diagnostics.clone();

                tokio::spawn(async move {
                    let stream = match accept_async(tcp).await {
                        Ok(stream) => stream,
                        Err(error) => {
                            debug!(%remote, %error, "websocket handshake failed");
                            return;
                        }
                    };
                    serve_peer(peer, stream, events, diagnostics).await;
                });
            }
        });

        Ok(Box::new(WebSocketInbound { events: inbound }))
    }
}

/// Read one peer's frames until the stream ends.
async fn serve_peer(
    peer: PeerId,
    mut stream: WebSocketStream<TcpStream>,
    events: mpsc::UnboundedSender<ServerEvent>,
    diagnostics: Arc<Diagnostics>,
) {
    let mut introduced = false;

    while let Some(frame) = stream.next().await {
        let data = match frame {
            Ok(WsMessage::Binary(data)) => data,
            Ok(WsMessage::Close(_)) => break,
            // Pings are answered by the protocol layer while reading.
            Ok(_) => continue,
            Err(error) => {
                debug!(peer, %error, "websocket read failed");
                break;
            }
        };

        let message = match Message::decode(&data) {
            Ok(message) => message,
            Err(error) => {
                trace!(peer, %error, "dropping undecodable frame");
                continue;
            }
        };
        diagnostics.record_inbound();

        let event = match message {
            Message::Join if introduced => continue,
            Message::Join => {
                introduced = true;
                ServerEvent::Joined(peer)
            }
            Message::Action if introduced => ServerEvent::Message(peer, message),
            Message::Action => {
                trace!(peer, "dropping action from unintroduced peer");
                continue;
            }
        };

        if events.send(event).is_err() {
            return;
        }
    }

    if introduced {
        let _ = events.send(ServerEvent::Left(peer));
    }
}

struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    diagnostics: Arc<Diagnostics>,
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn send(&mut self, message: Message) -> Result<(), TransportError> {
        self.stream.send(WsMessage::Binary(message.encode())).await?;
        self.diagnostics.record_outbound();
        Ok(())
    }
}

struct WebSocketInbound {
    events: mpsc::UnboundedReceiver<ServerEvent>,
}

#[async_trait]
impl Inbound for WebSocketInbound {
    async fn next_event(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }
}
