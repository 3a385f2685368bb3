//! Server session controller.
//!
//! Starts the listening transport, and on activation: logs readiness,
//! starts the world tick loop and the metrics sampler, spawns the
//! configured number of synthetic entities, then drives the inbound event
//! loop that keeps the player count current.

use crate::config::HarnessConfig;
use crate::load::LoadGenerator;
use crate::sampler::Sampler;
use std::sync::Arc;
use swarmbench_net::{Diagnostics, ServerEvent, Transport, TransportError};
use swarmbench_world::{Entity, LocalSink, World};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// The live server role; exists once per process when `-server` is set.
pub struct ServerSession {
    pub world: Arc<World>,
    entities: Vec<Arc<Entity>>,
    #[allow(dead_code)]
    tasks: Vec<JoinHandle<()>>,
}

impl ServerSession {
    pub fn player_count(&self) -> usize {
        self.world.player_count()
    }

    pub fn spawned_count(&self) -> usize {
        self.entities.len()
    }

    /// Destroy the synthetic entities, stopping their load generators.
    pub fn stop(&self) {
        for entity in &self.entities {
            entity.destroy();
        }
    }
}

/// Begin listening and bring up the server-side machinery.
pub async fn start(
    config: &HarnessConfig,
    transport: Arc<dyn Transport>,
    diagnostics: Arc<Diagnostics>,
    shutdown: CancellationToken,
) -> Result<ServerSession, TransportError> {
    let mut inbound = transport.listen().await?;
    info!("server started");

    let world = World::new();
    let mut tasks = Vec::new();
    tasks.push(world.run_ticks(diagnostics.clone(), shutdown.child_token()));
    tasks.push(Sampler::new(diagnostics, world.clone()).spawn(shutdown.child_token()));

    let mut entities = Vec::with_capacity(config.monsters as usize);
    for ordinal in 0..config.monsters {
        let entity = world.spawn(format!("Monster {ordinal}"));
        let sink = Arc::new(LocalSink::new(world.clone()));
        tasks.push(LoadGenerator::new(sink).spawn(&entity));
        entity.grant_authority();
        entities.push(entity);
    }
    if config.monsters > 0 {
        info!(monsters = config.monsters, "spawned synthetic entities");
    }

    let peers = world.clone();
    let cancel = shutdown.child_token();
    tasks.push(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = inbound.next_event() => match event {
                    Some(ServerEvent::Joined(peer)) => {
                        peers.player_joined();
                        debug!(peer, players = peers.player_count(), "player joined");
                    }
                    Some(ServerEvent::Left(peer)) => {
                        peers.player_left();
                        debug!(peer, players = peers.player_count(), "player left");
                    }
                    Some(ServerEvent::Message(peer, message)) => {
                        trace!(peer, ?message, "inbound message");
                    }
                    None => break,
                }
            }
        }
    }));

    Ok(ServerSession {
        world,
        entities,
        tasks,
    })
}
