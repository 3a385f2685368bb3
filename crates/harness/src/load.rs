//! Synthetic load generator.
//!
//! One generator task per entity. The task sits idle until the entity's
//! authority transition fires, then issues the zero-argument no-op action
//! at randomized intervals until the entity is destroyed or loses
//! authority. Many generators interleave on the runtime with no ordering
//! guarantee between them; that is the point.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use swarmbench_world::{ActionSink, Entity};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Default upper bound for the pause between actions.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(5);

/// Per-entity background chatter generator.
pub struct LoadGenerator {
    sink: Arc<dyn ActionSink>,
    max_interval: Duration,
    seed: u64,
}

impl LoadGenerator {
    pub fn new(sink: Arc<dyn ActionSink>) -> Self {
        let seed = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64;
        Self {
            sink,
            max_interval: DEFAULT_MAX_INTERVAL,
            seed,
        }
    }

    /// Override the pause upper bound. Tests use tight bounds.
    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    /// Fix the interval RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Attach to an entity and start the generator task.
    pub fn spawn(self, entity: &Entity) -> JoinHandle<()> {
        let authority = entity.authority();
        let lifetime = entity.lifetime();
        tokio::spawn(run(
            authority,
            lifetime,
            self.sink,
            self.max_interval,
            self.seed,
        ))
    }
}

async fn run(
    mut authority: watch::Receiver<bool>,
    lifetime: CancellationToken,
    sink: Arc<dyn ActionSink>,
    max_interval: Duration,
    seed: u64,
) {
    // No action may fire before the one-shot authority grant.
    tokio::select! {
        _ = lifetime.cancelled() => return,
        granted = authority.wait_for(|&has| has) => {
            if granted.is_err() {
                return;
            }
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    loop {
        if let Err(error) = sink.invoke().await {
            warn!(%error, "no-op action failed");
        }

        let pause = max_interval.mul_f64(rng.gen::<f64>());
        tokio::select! {
            _ = lifetime.cancelled() => break,
            // Stops on authority loss as well as entity destruction; a
            // dropped entity reads as an error here and also stops us.
            _ = authority.wait_for(|&has| !has) => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }
}
