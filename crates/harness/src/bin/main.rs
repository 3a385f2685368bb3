//! swarmbench
//!
//! Headless load-generation harness. Runs a server instance, a swarm of
//! simulated clients, or both, and prints one throughput line per second.
//!
//! # Usage
//!
//! ```bash
//! # Server with 100 synthetic entities
//! swarmbench -server -monster 100
//!
//! # 64 clients against a remote server over websockets
//! swarmbench -client 64 -address bench.local -transport websocket
//!
//! # Both roles in one process on a custom port
//! swarmbench -server -client 16 -port 9000
//! ```

use std::sync::Arc;
use swarmbench_harness::config::USAGE;
use swarmbench_harness::{select_transport, server, swarm, ArgStore, HarnessConfig};
use swarmbench_net::Diagnostics;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ArgStore::from_env();
    if args.has_flag("-help") {
        println!("{USAGE}");
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match HarnessConfig::resolve(&args) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid arguments, see -help");
            std::process::exit(1);
        }
    };

    let diagnostics = Arc::new(Diagnostics::default());
    let transport = select_transport(&config, diagnostics.clone());

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let server_session = if config.server {
        info!("starting server mode");
        let session = server::start(
            &config,
            transport.clone(),
            diagnostics.clone(),
            shutdown.clone(),
        )
        .await?;
        Some(session)
    } else {
        None
    };

    let client_swarm = swarm::launch(&config, transport).await;

    if server_session.is_none() && client_swarm.sessions.is_empty() {
        info!("no role selected; pass -server and/or -client (see -help)");
    }

    // Long-lived daemon: run until externally stopped.
    shutdown.cancelled().await;
    info!("shutting down");

    client_swarm.stop();
    if let Some(session) = &server_session {
        session.stop();
    }
    client_swarm.join().await;

    Ok(())
}

/// Cancel the root token on Ctrl-C or SIGTERM.
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received Ctrl+C"),
            _ = terminate => info!("received SIGTERM"),
        }

        shutdown.cancel();
    });
}
