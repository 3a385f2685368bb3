//! Client swarm launcher.
//!
//! Sessions are launched in strict index order, at most `ramp` connection
//! attempts in flight at once. The default ramp of 1 serializes the whole
//! launch: session *i+1* does not begin connecting until session *i* has
//! resolved, which trades ramp-up speed for not storming the server under
//! test. A failed session is logged and skipped; its siblings proceed.

use crate::config::HarnessConfig;
use crate::load::LoadGenerator;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use swarmbench_net::{Connection, Message, Transport, TransportError};
use swarmbench_world::{ActionError, ActionSink, Entity, EntityId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How a session's one connection attempt resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Connected,
    Failed,
}

/// One simulated client.
#[derive(Debug)]
pub struct ClientSession {
    pub index: u32,
    pub outcome: SessionOutcome,
}

/// The launched swarm; holds every session's entity and generator task.
#[derive(Default)]
pub struct ClientSwarm {
    pub sessions: Vec<ClientSession>,
    entities: Vec<Arc<Entity>>,
    tasks: Vec<JoinHandle<()>>,
}

impl ClientSwarm {
    pub fn connected(&self) -> usize {
        self.sessions
            .iter()
            .filter(|session| session.outcome == SessionOutcome::Connected)
            .count()
    }

    /// Destroy every client entity, stopping the load generators.
    pub fn stop(&self) {
        for entity in &self.entities {
            entity.destroy();
        }
    }

    /// Wait for all generator tasks to finish. Only meaningful after
    /// [`stop`](Self::stop).
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Launch the configured number of client sessions.
pub async fn launch(config: &HarnessConfig, transport: Arc<dyn Transport>) -> ClientSwarm {
    let mut swarm = ClientSwarm::default();
    if config.clients == 0 {
        return swarm;
    }

    info!(
        clients = config.clients,
        address = %config.address,
        ramp = config.ramp,
        "starting client swarm"
    );

    let indices: Vec<u32> = (0..config.clients).collect();
    for window in indices.chunks(config.ramp) {
        let attempts = window
            .iter()
            .map(|&index| start_session(index, config, transport.clone()));

        for (session, spawned) in join_all(attempts).await {
            if let Some((entity, task)) = spawned {
                swarm.entities.push(entity);
                swarm.tasks.push(task);
            }
            swarm.sessions.push(session);
        }
    }

    info!(connected = swarm.connected(), "client swarm launched");
    swarm
}

#[allow(clippy::type_complexity)]
async fn start_session(
    index: u32,
    config: &HarnessConfig,
    transport: Arc<dyn Transport>,
) -> (ClientSession, Option<(Arc<Entity>, JoinHandle<()>)>) {
    match connect_and_join(config, transport).await {
        Ok(connection) => {
            let entity = Arc::new(Entity::standalone(EntityId(index), format!("Client {index}")));
            let sink = Arc::new(ConnectionSink {
                connection: Mutex::new(connection),
            });
            let task = LoadGenerator::new(sink).spawn(&entity);
            // The connected player entity holds authority from here on.
            entity.grant_authority();

            info!(clients = index + 1, "clients started");
            let session = ClientSession {
                index,
                outcome: SessionOutcome::Connected,
            };
            (session, Some((entity, task)))
        }
        Err(error) => {
            warn!(client = index, %error, "connection attempt failed");
            let session = ClientSession {
                index,
                outcome: SessionOutcome::Failed,
            };
            (session, None)
        }
    }
}

async fn connect_and_join(
    config: &HarnessConfig,
    transport: Arc<dyn Transport>,
) -> Result<Box<dyn Connection>, TransportError> {
    let mut connection = transport.connect(&config.address).await?;
    connection.send(Message::Join).await?;
    Ok(connection)
}

/// Sends the no-op action over the session's connection.
struct ConnectionSink {
    connection: Mutex<Box<dyn Connection>>,
}

#[async_trait]
impl ActionSink for ConnectionSink {
    async fn invoke(&self) -> Result<(), ActionError> {
        self.connection
            .lock()
            .await
            .send(Message::Action)
            .await
            .map_err(ActionError::from)
    }
}
