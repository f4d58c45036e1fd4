use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identity of one live connection. A player that reconnects gets a fresh
/// id, so its old and new channels are never confused with each other.
pub type ConnectionId = Uuid;

/// The set of outbound channels for currently connected players.
///
/// All three operations may be called concurrently from independent
/// connection handlers; implementations must serialize structural mutation
/// against broadcast iteration so a broadcast never observes a torn set.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    async fn register(&self, id: ConnectionId, sender: mpsc::UnboundedSender<String>);

    /// Removes the channel if present. Calling this for an id that is
    /// already gone is a no-op, so cleanup paths may race with each other.
    async fn unregister(&self, id: ConnectionId);

    /// Delivers `payload` to every currently registered channel. A dead
    /// channel never aborts delivery to the rest; it is pruned after the
    /// delivery pass completes.
    async fn broadcast(&self, payload: &str);

    async fn connection_count(&self) -> usize;
}

pub struct InMemoryConnectionRegistry {
    // id -> outbound sender
    connections: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, id: ConnectionId, sender: mpsc::UnboundedSender<String>) {
        let mut connections = self.connections.write().await;
        connections.insert(id, sender);
    }

    async fn unregister(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if connections.remove(&id).is_some() {
            debug!(%id, "connection unregistered");
        }
    }

    async fn broadcast(&self, payload: &str) {
        let mut dead = Vec::new();
        {
            let connections = self.connections.read().await;
            for (id, sender) in connections.iter() {
                // Send only fails when the receiving handler has dropped its
                // end; remember the id and prune once iteration is done.
                if sender.send(payload.to_string()).is_err() {
                    warn!(id = %id, "failed to deliver to player, scheduling removal");
                    dead.push(*id);
                }
            }
        }

        if !dead.is_empty() {
            let mut connections = self.connections.write().await;
            for id in dead {
                connections.remove(&id);
            }
        }
    }

    async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
