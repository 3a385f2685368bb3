//! World runtime boundary.
//!
//! The harness core drives the live world through this crate: spawning
//! synthetic entities, watching their authority transitions, counting
//! connected players, and advancing the frame counter with the tick loop.
//! The entity model is deliberately skeletal; the entities exist to carry
//! load generators, not gameplay.

mod actions;
mod entity;

pub use actions::{ActionError, ActionSink, LocalSink};
pub use entity::{Entity, EntityId};

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swarmbench_net::Diagnostics;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Interval between scheduler frames.
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// The live world on the server side.
///
/// Tracks spawned entities and the connected player count. The player count
/// is written by the server's inbound event loop and read by the metrics
/// sampler, so it is a plain atomic.
#[derive(Default)]
pub struct World {
    entities: Mutex<Vec<Arc<Entity>>>,
    next_entity: AtomicU32,
    players: AtomicUsize,
    local_actions: AtomicU64,
}

impl World {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Instantiate a named entity into the live world.
    pub fn spawn(&self, name: impl Into<String>) -> Arc<Entity> {
        let id = EntityId(self.next_entity.fetch_add(1, Ordering::Relaxed));
        let entity = Arc::new(Entity::new(id, name));
        self.entities
            .lock()
            .expect("entity list poisoned")
            .push(entity.clone());
        debug!(id = id.0, name = %entity.name(), "spawned entity");
        entity
    }

    pub fn spawned_count(&self) -> usize {
        self.entities.lock().expect("entity list poisoned").len()
    }

    pub fn spawned_names(&self) -> Vec<String> {
        self.entities
            .lock()
            .expect("entity list poisoned")
            .iter()
            .map(|entity| entity.name().to_string())
            .collect()
    }

    pub fn player_joined(&self) {
        self.players.fetch_add(1, Ordering::Relaxed);
    }

    pub fn player_left(&self) {
        self.players.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn player_count(&self) -> usize {
        self.players.load(Ordering::Relaxed)
    }

    /// Record one locally dispatched no-op action.
    pub fn record_local_action(&self) {
        self.local_actions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn local_action_count(&self) -> u64 {
        self.local_actions.load(Ordering::Relaxed)
    }

    /// Run the frame loop until cancelled, advancing the shared frame
    /// counter once per tick.
    pub fn run_ticks(
        self: &Arc<Self>,
        diagnostics: Arc<Diagnostics>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => diagnostics.record_frame(),
                }
            }
        })
    }
}
