//! In-process transport backend.
//!
//! Connects clients and server through unbounded channels inside one
//! process. Used by the integration tests as the instrumented collaborator
//! (every connect attempt is recorded with its start/finish instants) and
//! usable for single-process smoke runs. Optional per-attempt failure
//! injection and artificial connect latency are configured before the
//! transport is shared.

use crate::diagnostics::Diagnostics;
use crate::traits::{
    Connection, Inbound, PeerId, ServerEvent, Transport, TransportError, TransportKind,
};
use crate::wire::Message;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// One recorded connect attempt.
#[derive(Debug, Clone, Copy)]
pub struct ConnectWindow {
    /// Attempt ordinal, in call order.
    pub index: usize,
    pub started: Instant,
    pub finished: Instant,
    pub ok: bool,
}

/// Channel-backed transport for tests and single-process runs.
pub struct MemoryTransport {
    diagnostics: Arc<Diagnostics>,
    connect_latency: Duration,
    failing: HashSet<usize>,
    listener: Mutex<Option<mpsc::UnboundedSender<ServerEvent>>>,
    next_peer: AtomicU64,
    attempts: AtomicUsize,
    connect_log: Mutex<Vec<ConnectWindow>>,
}

impl MemoryTransport {
    pub fn new(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            diagnostics,
            connect_latency: Duration::ZERO,
            failing: HashSet::new(),
            listener: Mutex::new(None),
            next_peer: AtomicU64::new(1),
            attempts: AtomicUsize::new(0),
            connect_log: Mutex::new(Vec::new()),
        }
    }

    /// Add artificial latency to every connect attempt.
    pub fn with_connect_latency(mut self, latency: Duration) -> Self {
        self.connect_latency = latency;
        self
    }

    /// Make the given connect attempt ordinals fail.
    pub fn with_failing_attempts(mut self, attempts: impl IntoIterator<Item = usize>) -> Self {
        self.failing = attempts.into_iter().collect();
        self
    }

    /// All connect attempts recorded so far.
    pub fn connect_log(&self) -> Vec<ConnectWindow> {
        self.connect_log.lock().expect("connect log poisoned").clone()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Kcp
    }

    // Ports are meaningless inside one process.
    fn set_port(&mut self, _port: u16) {}

    async fn connect(&self, _address: &str) -> Result<Box<dyn Connection>, TransportError> {
        let index = self.attempts.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        if !self.connect_latency.is_zero() {
            tokio::time::sleep(self.connect_latency).await;
        }

        let result = if self.failing.contains(&index) {
            Err(TransportError::PeerUnreachable(format!(
                "injected failure for attempt {index}"
            )))
        } else {
            match self.listener.lock().expect("listener slot poisoned").clone() {
                Some(events) => Ok(Box::new(MemoryConnection {
                    peer: self.next_peer.fetch_add(1, Ordering::Relaxed),
                    events,
                    introduced: false,
                    diagnostics: self.diagnostics.clone(),
                }) as Box<dyn Connection>),
                None => Err(TransportError::PeerUnreachable(
                    "no listener registered".to_string(),
                )),
            }
        };

        self.connect_log
            .lock()
            .expect("connect log poisoned")
            .push(ConnectWindow {
                index,
                started,
                finished: Instant::now(),
                ok: result.is_ok(),
            });

        result
    }

    async fn listen(&self) -> Result<Box<dyn Inbound>, TransportError> {
        let (events, inbound) = mpsc::unbounded_channel();
        *self.listener.lock().expect("listener slot poisoned") = Some(events);
        Ok(Box::new(MemoryInbound { events: inbound }))
    }
}

struct MemoryConnection {
    peer: PeerId,
    events: mpsc::UnboundedSender<ServerEvent>,
    introduced: bool,
    diagnostics: Arc<Diagnostics>,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn send(&mut self, message: Message) -> Result<(), TransportError> {
        self.diagnostics.record_outbound();
        self.diagnostics.record_inbound();

        let event = match message {
            Message::Join if self.introduced => return Ok(()),
            Message::Join => {
                self.introduced = true;
                ServerEvent::Joined(self.peer)
            }
            Message::Action if self.introduced => ServerEvent::Message(self.peer, message),
            Message::Action => return Ok(()),
        };

        self.events.send(event).map_err(|_| TransportError::Closed)
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        if self.introduced {
            let _ = self.events.send(ServerEvent::Left(self.peer));
        }
    }
}

struct MemoryInbound {
    events: mpsc::UnboundedReceiver<ServerEvent>,
}

#[async_trait]
impl Inbound for MemoryInbound {
    async fn next_event(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_action_and_departure_are_delivered() {
        let diagnostics = Arc::new(Diagnostics::default());
        let transport = MemoryTransport::new(diagnostics.clone());

        let mut inbound = transport.listen().await.unwrap();
        let mut conn = transport.connect("localhost").await.unwrap();

        conn.send(Message::Join).await.unwrap();
        let peer = match inbound.next_event().await.unwrap() {
            ServerEvent::Joined(peer) => peer,
            other => panic!("expected join, got {other:?}"),
        };

        conn.send(Message::Action).await.unwrap();
        assert!(matches!(
            inbound.next_event().await.unwrap(),
            ServerEvent::Message(from, Message::Action) if from == peer
        ));

        drop(conn);
        assert!(matches!(
            inbound.next_event().await.unwrap(),
            ServerEvent::Left(from) if from == peer
        ));

        let counters = diagnostics.snapshot();
        assert_eq!(counters.outbound, 2);
        assert_eq!(counters.inbound, 2);
    }

    #[tokio::test]
    async fn connect_without_listener_fails() {
        let transport = MemoryTransport::new(Arc::new(Diagnostics::default()));
        let err = transport.connect("localhost").await.err().unwrap();
        assert!(matches!(err, TransportError::PeerUnreachable(_)));

        let log = transport.connect_log();
        assert_eq!(log.len(), 1);
        assert!(!log[0].ok);
    }

    #[tokio::test]
    async fn injected_failures_hit_the_right_attempts() {
        let transport = MemoryTransport::new(Arc::new(Diagnostics::default()))
            .with_failing_attempts([1]);
        let _inbound = transport.listen().await.unwrap();

        assert!(transport.connect("localhost").await.is_ok());
        assert!(transport.connect("localhost").await.is_err());
        assert!(transport.connect("localhost").await.is_ok());
    }
}
