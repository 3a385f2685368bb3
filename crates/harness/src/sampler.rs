//! Metrics sampler.
//!
//! Once per second, read the shared counters, difference them against the
//! previous sample, and print one line to stdout. The counters are owned
//! elsewhere and only ever read here; baselines advance to the current
//! totals after each line. There is no drift correction: a stalled tick
//! simply produces a larger delta on the next line.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use swarmbench_net::{CounterSnapshot, Diagnostics};
use swarmbench_world::World;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wall-clock pause between samples.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// One reported sample: counter deltas plus the live player count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frame_delta: u64,
    pub inbound_delta: u64,
    pub outbound_delta: u64,
    pub players: usize,
}

impl MetricsSnapshot {
    /// Difference two counter reads. Counters are monotonic, so the
    /// saturation never triggers in practice; it just pins the invariant
    /// that deltas cannot go negative.
    pub fn between(previous: CounterSnapshot, current: CounterSnapshot, players: usize) -> Self {
        Self {
            frame_delta: current.frames.saturating_sub(previous.frames),
            inbound_delta: current.inbound.saturating_sub(previous.inbound),
            outbound_delta: current.outbound.saturating_sub(previous.outbound),
            players,
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} FPS {} inbound messages {} outbound messages {} clients",
            self.frame_delta, self.inbound_delta, self.outbound_delta, self.players
        )
    }
}

/// The 1 Hz reporting loop.
pub struct Sampler {
    diagnostics: Arc<Diagnostics>,
    world: Arc<World>,
}

impl Sampler {
    pub fn new(diagnostics: Arc<Diagnostics>, world: Arc<World>) -> Self {
        Self { diagnostics, world }
    }

    /// Start the loop; it runs until cancelled.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut previous = self.diagnostics.snapshot();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(SAMPLE_INTERVAL) => {}
                }

                let current = self.diagnostics.snapshot();
                let sample =
                    MetricsSnapshot::between(previous, current, self.world.player_count());
                println!("{sample}");
                previous = current;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_between_consecutive_readings() {
        let first = CounterSnapshot {
            frames: 10,
            inbound: 100,
            outbound: 50,
        };
        let second = CounterSnapshot {
            frames: 16,
            inbound: 180,
            outbound: 90,
        };

        let sample = MetricsSnapshot::between(first, second, 3);
        assert_eq!(sample.frame_delta, 6);
        assert_eq!(sample.inbound_delta, 80);
        assert_eq!(sample.outbound_delta, 40);
        assert_eq!(sample.players, 3);
    }

    #[test]
    fn report_line_format() {
        let sample = MetricsSnapshot {
            frame_delta: 60,
            inbound_delta: 1200,
            outbound_delta: 800,
            players: 16,
        };
        assert_eq!(
            sample.to_string(),
            "60 FPS 1200 inbound messages 800 outbound messages 16 clients"
        );
    }

    #[test]
    fn identical_readings_yield_zero_deltas() {
        let reading = CounterSnapshot {
            frames: 5,
            inbound: 7,
            outbound: 9,
        };
        let sample = MetricsSnapshot::between(reading, reading, 0);
        assert_eq!(sample.frame_delta, 0);
        assert_eq!(sample.inbound_delta, 0);
        assert_eq!(sample.outbound_delta, 0);
    }
}
