// Public API
pub use connection::{ClientStream, Connection, LineStream};
pub use coordinator::BroadcastCoordinator;
pub use listener::DealerServer;
pub use messages::Command;
pub use registry::{ConnectionId, ConnectionRegistry, InMemoryConnectionRegistry};

// Internal modules
mod connection;
mod coordinator;
mod listener;
mod messages;
mod registry;
