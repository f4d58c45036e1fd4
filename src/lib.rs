// Library crate for the dealer server
// This file exposes the public API for integration tests

pub mod deck;
pub mod server;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use deck::{Card, Deck, DeckSnapshot, Rank, Suit};
pub use server::{
    BroadcastCoordinator, Command, ConnectionRegistry, DealerServer, InMemoryConnectionRegistry,
};
pub use shared::{DealerError, DealerState};
