use std::sync::Arc;
use thiserror::Error;

use crate::server::{BroadcastCoordinator, ConnectionRegistry, InMemoryConnectionRegistry};

/// Shared application state handed to every connection handler.
///
/// The registry and coordinator are the only shared mutable resources in
/// the process. Handlers receive them by explicit parameter passing, which
/// keeps lifetimes and test setup explicit.
#[derive(Clone)]
pub struct DealerState {
    pub registry: Arc<dyn ConnectionRegistry>,
    pub coordinator: Arc<BroadcastCoordinator>,
}

impl DealerState {
    pub fn new() -> Self {
        let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());
        let coordinator = Arc::new(BroadcastCoordinator::new(registry.clone()));
        Self {
            registry,
            coordinator,
        }
    }
}

impl Default for DealerState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Error, Debug)]
pub enum DealerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
