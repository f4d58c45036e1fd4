use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use dealer::{Card, DealerServer, DeckSnapshot};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Test Server Infrastructure
// ============================================================================

/// A dealer server bound to an ephemeral loopback port, running until the
/// test asks it to shut down.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let server = DealerServer::new(listener);
        let addr = server.local_addr().expect("listener has no local addr");

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .run_until(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        self.handle.await.expect("server task should finish cleanly");
    }
}

// ============================================================================
// Test Player Client
// ============================================================================

pub struct TestPlayer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestPlayer {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr)
            .await
            .expect("failed to connect to dealer");
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    pub async fn send_line(&mut self, line: &str) {
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("failed to send line");
        self.writer
            .write_all(b"\n")
            .await
            .expect("failed to send delimiter");
        self.writer.flush().await.expect("failed to flush");
    }

    /// Next line from the dealer, or `None` on a closed connection. Panics
    /// if nothing arrives within the read timeout.
    pub async fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let bytes = timeout(READ_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a line from the dealer")
            .expect("failed to read from dealer");
        if bytes == 0 {
            return None;
        }
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Reads one line and checks it is a full 52-card deck snapshot.
    pub async fn read_snapshot(&mut self) -> DeckSnapshot {
        let line = self.read_line().await.expect("expected a deck line");
        parse_snapshot(&line)
    }

    pub async fn expect_closed(&mut self) {
        assert_eq!(self.read_line().await, None, "expected the dealer to close");
    }

    /// Asserts the dealer sends nothing more within a short window.
    pub async fn expect_no_pending_line(&mut self) {
        let mut line = String::new();
        let result = timeout(Duration::from_millis(300), self.reader.read_line(&mut line)).await;
        assert!(result.is_err(), "unexpected data from dealer: {:?}", line);
    }
}

// ============================================================================
// Snapshot Assertions
// ============================================================================

pub fn parse_snapshot(line: &str) -> DeckSnapshot {
    let snapshot = DeckSnapshot::from_line(line).expect("deck line should parse");
    assert_full_deck(&snapshot);
    snapshot
}

pub fn assert_full_deck(snapshot: &DeckSnapshot) {
    assert_eq!(snapshot.cards.len(), 52, "snapshot must carry 52 cards");
    let distinct: HashSet<Card> = snapshot.cards.iter().copied().collect();
    assert_eq!(
        distinct,
        Card::all_cards().into_iter().collect(),
        "snapshot must be a permutation of the canonical card set"
    );
}
