//! Integration tests driving the harness against the in-memory transport,
//! which records every connect attempt's start/finish window and supports
//! per-attempt failure injection.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use swarmbench_harness::{server, swarm, ArgStore, HarnessConfig, SessionOutcome};
use swarmbench_net::{Diagnostics, MemoryTransport, Transport};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

fn config(line: &str) -> HarnessConfig {
    HarnessConfig::resolve(&ArgStore::from_line(line)).unwrap()
}

/// Session *i+1* must not begin connecting until session *i* has resolved.
#[tokio::test]
async fn sequential_launch_attempts_do_not_overlap() {
    let diagnostics = Arc::new(Diagnostics::default());
    let transport = Arc::new(
        MemoryTransport::new(diagnostics).with_connect_latency(Duration::from_millis(15)),
    );
    let _inbound = transport.listen().await.unwrap();

    let shared: Arc<dyn Transport> = transport.clone();
    let launched = swarm::launch(&config("-client 5"), shared).await;

    assert_eq!(launched.sessions.len(), 5);
    assert_eq!(launched.connected(), 5);

    let log = transport.connect_log();
    assert_eq!(log.len(), 5);
    for pair in log.windows(2) {
        assert!(
            pair[1].started >= pair[0].finished,
            "attempt {} began before attempt {} resolved",
            pair[1].index,
            pair[0].index
        );
    }

    launched.stop();
    launched.join().await;
}

/// A ramp wider than one allows overlapping windows but still attempts
/// every session exactly once.
#[tokio::test]
async fn wide_ramp_attempts_every_session() {
    let diagnostics = Arc::new(Diagnostics::default());
    let transport = Arc::new(
        MemoryTransport::new(diagnostics).with_connect_latency(Duration::from_millis(10)),
    );
    let _inbound = transport.listen().await.unwrap();

    let shared: Arc<dyn Transport> = transport.clone();
    let launched = swarm::launch(&config("-client 6 -ramp 3"), shared).await;

    assert_eq!(launched.sessions.len(), 6);
    assert_eq!(transport.connect_log().len(), 6);

    launched.stop();
    launched.join().await;
}

/// One failing session is logged and skipped; its siblings still connect.
#[tokio::test]
#[traced_test]
async fn failed_sessions_do_not_abort_the_rest() {
    let diagnostics = Arc::new(Diagnostics::default());
    let transport = Arc::new(MemoryTransport::new(diagnostics).with_failing_attempts([1]));
    let _inbound = transport.listen().await.unwrap();

    let shared: Arc<dyn Transport> = transport.clone();
    let launched = swarm::launch(&config("-client 4"), shared).await;

    let outcomes: Vec<SessionOutcome> =
        launched.sessions.iter().map(|session| session.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            SessionOutcome::Connected,
            SessionOutcome::Failed,
            SessionOutcome::Connected,
            SessionOutcome::Connected,
        ]
    );
    assert_eq!(launched.connected(), 3);
    assert!(logs_contain("connection attempt failed"));

    launched.stop();
    launched.join().await;
}

/// `-client 0` and an absent `-client` both launch nothing.
#[tokio::test]
async fn zero_clients_launch_no_sessions() {
    let diagnostics = Arc::new(Diagnostics::default());
    let transport = Arc::new(MemoryTransport::new(diagnostics));
    let _inbound = transport.listen().await.unwrap();

    for line in ["", "-client 0"] {
        let shared: Arc<dyn Transport> = transport.clone();
        let launched = swarm::launch(&config(line), shared).await;
        assert!(launched.sessions.is_empty());
    }
    assert!(transport.connect_log().is_empty());
}

/// Exactly M entities, each with a distinct ordinal-derived name.
#[tokio::test]
async fn server_spawns_uniquely_named_entities() {
    let diagnostics = Arc::new(Diagnostics::default());
    let transport: Arc<dyn Transport> = Arc::new(MemoryTransport::new(diagnostics.clone()));
    let shutdown = CancellationToken::new();

    let session = server::start(&config("-server -monster 4"), transport, diagnostics, shutdown.clone())
        .await
        .unwrap();

    assert_eq!(session.spawned_count(), 4);
    let names = session.world.spawned_names();
    assert_eq!(names, vec!["Monster 0", "Monster 1", "Monster 2", "Monster 3"]);
    let distinct: HashSet<_> = names.iter().collect();
    assert_eq!(distinct.len(), 4);

    session.stop();
    shutdown.cancel();
}

/// A server without `-monster` spawns nothing.
#[tokio::test]
async fn server_without_monsters_spawns_nothing() {
    let diagnostics = Arc::new(Diagnostics::default());
    let transport: Arc<dyn Transport> = Arc::new(MemoryTransport::new(diagnostics.clone()));
    let shutdown = CancellationToken::new();

    let session = server::start(&config("-server"), transport, diagnostics, shutdown.clone())
        .await
        .unwrap();
    assert_eq!(session.spawned_count(), 0);

    shutdown.cancel();
}

/// Every successfully joined client shows up in the live player count.
#[tokio::test]
async fn joined_clients_are_counted_as_players() {
    let diagnostics = Arc::new(Diagnostics::default());
    let transport = Arc::new(MemoryTransport::new(diagnostics.clone()));
    let shutdown = CancellationToken::new();

    let shared: Arc<dyn Transport> = transport.clone();
    let session = server::start(&config("-server"), shared, diagnostics, shutdown.clone())
        .await
        .unwrap();

    let shared: Arc<dyn Transport> = transport.clone();
    let launched = swarm::launch(&config("-client 3"), shared).await;
    assert_eq!(launched.connected(), 3);

    // Give the inbound event loop a moment to drain the join events.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.player_count(), 3);

    launched.stop();
    session.stop();
    shutdown.cancel();
}
