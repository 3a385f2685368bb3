//! Remote no-op action dispatch.

use crate::World;
use async_trait::async_trait;
use std::sync::Arc;
use swarmbench_net::TransportError;
use thiserror::Error;

/// Errors from dispatching a no-op action.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Destination for the zero-argument no-op action.
///
/// Client sessions send it over their connection; server-authority entities
/// dispatch it locally.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn invoke(&self) -> Result<(), ActionError>;
}

/// Local dispatch for entities whose authority lives on the server.
pub struct LocalSink {
    world: Arc<World>,
}

impl LocalSink {
    pub fn new(world: Arc<World>) -> Self {
        Self { world }
    }
}

#[async_trait]
impl ActionSink for LocalSink {
    async fn invoke(&self) -> Result<(), ActionError> {
        self.world.record_local_action();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_sink_counts_invocations() {
        let world = World::new();
        let sink = LocalSink::new(world.clone());

        sink.invoke().await.unwrap();
        sink.invoke().await.unwrap();

        assert_eq!(world.local_action_count(), 2);
    }
}
