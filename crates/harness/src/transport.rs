//! Transport selection.
//!
//! Maps the configured kind to a backend, applies the port override while
//! the instance is still exclusively owned, and hands back the shared
//! handle used by both the server role and every client session.

use crate::config::HarnessConfig;
use std::sync::Arc;
use swarmbench_net::{DatagramTransport, Diagnostics, Transport, TransportKind, WebSocketTransport};
use tracing::info;

/// Build and configure the process-wide transport.
pub fn select_transport(
    config: &HarnessConfig,
    diagnostics: Arc<Diagnostics>,
) -> Arc<dyn Transport> {
    let mut transport: Box<dyn Transport> = match config.transport {
        TransportKind::Kcp => Box::new(DatagramTransport::new(diagnostics)),
        TransportKind::Websocket => Box::new(WebSocketTransport::new(diagnostics)),
    };

    if let Some(port) = config.port {
        transport.set_port(port);
    }

    info!(kind = %config.transport, port = ?config.port, "installed transport");
    Arc::from(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ArgStore;

    #[test]
    fn kind_follows_configuration() {
        let diagnostics = Arc::new(Diagnostics::default());
        let config =
            HarnessConfig::resolve(&ArgStore::from_line("-transport websocket")).unwrap();
        let transport = select_transport(&config, diagnostics);
        assert_eq!(transport.kind(), TransportKind::Websocket);
    }

    #[test]
    fn default_kind_is_datagram() {
        let diagnostics = Arc::new(Diagnostics::default());
        let config = HarnessConfig::resolve(&ArgStore::from_line("")).unwrap();
        let transport = select_transport(&config, diagnostics);
        assert_eq!(transport.kind(), TransportKind::Kcp);
    }
}
