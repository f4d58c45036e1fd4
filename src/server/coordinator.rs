use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::deck::Deck;
use crate::server::registry::ConnectionRegistry;
use crate::shared::DealerError;

/// Owns the single shared deck and fans new deck states out to every
/// registered connection.
pub struct BroadcastCoordinator {
    deck: Mutex<Deck>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl BroadcastCoordinator {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            deck: Mutex::new(Deck::new()),
            registry,
        }
    }

    /// Shuffles the deck once and pushes the new order to every currently
    /// registered connection, the requester included.
    ///
    /// The deck lock covers only the shuffle and the snapshot copy; it is
    /// released before any broadcast I/O, so concurrent reshuffle requests
    /// serialize on the mutation while their broadcasts may interleave. If
    /// the snapshot cannot be encoded, the operation aborts with the deck
    /// state intact and nothing is sent.
    pub async fn reshuffle_and_broadcast(&self) -> Result<(), DealerError> {
        let snapshot = {
            let mut deck = self.deck.lock().await;
            deck.shuffle();
            deck.snapshot()
        };

        let line = snapshot.to_line()?;
        let recipients = self.registry.connection_count().await;
        info!(recipients, "shuffled the deck, broadcasting new order");
        self.registry.broadcast(&line).await;
        Ok(())
    }

    /// Encodes the current deck order without shuffling. Used for the
    /// initial push to a newly connected player.
    pub async fn current_snapshot_line(&self) -> Result<String, DealerError> {
        let snapshot = self.deck.lock().await.snapshot();
        debug!("encoded current deck snapshot");
        Ok(snapshot.to_line()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{Card, DeckSnapshot};
    use crate::server::registry::InMemoryConnectionRegistry;
    use std::collections::HashSet;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn full_card_set() -> HashSet<Card> {
        Card::all_cards().into_iter().collect()
    }

    fn assert_valid_deck_line(line: &str) -> DeckSnapshot {
        let snapshot = DeckSnapshot::from_line(line).expect("broadcast line should parse");
        assert_eq!(snapshot.cards.len(), 52);
        assert_eq!(
            snapshot.cards.iter().copied().collect::<HashSet<_>>(),
            full_card_set()
        );
        snapshot
    }

    #[tokio::test]
    async fn reshuffle_broadcasts_identical_snapshot_to_all_connections() {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let coordinator = BroadcastCoordinator::new(registry.clone());

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        registry.register(Uuid::new_v4(), tx_a).await;
        registry.register(Uuid::new_v4(), tx_b).await;

        coordinator.reshuffle_and_broadcast().await.unwrap();

        let line_a = rx_a.recv().await.unwrap();
        let line_b = rx_b.recv().await.unwrap();
        assert_eq!(line_a, line_b);
        assert_valid_deck_line(&line_a);
    }

    #[tokio::test]
    async fn current_snapshot_line_does_not_shuffle() {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let coordinator = BroadcastCoordinator::new(registry);

        let first = coordinator.current_snapshot_line().await.unwrap();
        let second = coordinator.current_snapshot_line().await.unwrap();
        assert_eq!(first, second);
        assert_valid_deck_line(&first);
    }

    #[tokio::test]
    async fn concurrent_reshuffles_produce_one_broadcast_each() {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let coordinator = Arc::new(BroadcastCoordinator::new(registry.clone()));

        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(Uuid::new_v4(), tx).await;

        let shuffles: Vec<_> = (0..10)
            .map(|_| {
                let coordinator = coordinator.clone();
                tokio::spawn(async move { coordinator.reshuffle_and_broadcast().await })
            })
            .collect();
        for handle in shuffles {
            handle.await.unwrap().unwrap();
        }

        // Exactly ten broadcast events, each a full permutation — a torn
        // deck state would fail the card-set check.
        for _ in 0..10 {
            let line = rx.recv().await.unwrap();
            assert_valid_deck_line(&line);
        }
        assert!(rx.try_recv().is_err());
    }
}
