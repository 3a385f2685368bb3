//! Entities and their authority state.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Ordinal identity of a spawned entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

/// A synthetic load-bearing entity.
///
/// Authority is a one-way, edge-triggered transition surfaced as a watch
/// channel: `NoAuthority -> HasAuthority` when granted, back when revoked.
/// Destroying the entity cancels its lifetime token, which tears down any
/// task keyed to it.
pub struct Entity {
    id: EntityId,
    name: String,
    authority_tx: watch::Sender<bool>,
    lifetime: CancellationToken,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: impl Into<String>) -> Self {
        let (authority_tx, _) = watch::channel(false);
        Self {
            id,
            name: name.into(),
            authority_tx,
            lifetime: CancellationToken::new(),
        }
    }

    /// Create an entity that is not registered in any world. Client sessions
    /// use this for their connection-local player entity.
    pub fn standalone(id: EntityId, name: impl Into<String>) -> Self {
        Self::new(id, name)
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grant this entity local authority.
    pub fn grant_authority(&self) {
        self.authority_tx.send_replace(true);
    }

    /// Revoke local authority.
    pub fn revoke_authority(&self) {
        self.authority_tx.send_replace(false);
    }

    pub fn has_authority(&self) -> bool {
        *self.authority_tx.borrow()
    }

    /// Subscribe to authority transitions.
    pub fn authority(&self) -> watch::Receiver<bool> {
        self.authority_tx.subscribe()
    }

    /// Token cancelled when the entity is destroyed.
    pub fn lifetime(&self) -> CancellationToken {
        self.lifetime.clone()
    }

    /// Remove the entity from play; cancels every task keyed to it.
    pub fn destroy(&self) {
        self.lifetime.cancel();
    }
}
