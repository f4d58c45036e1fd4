use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::server::coordinator::BroadcastCoordinator;
use crate::server::messages::Command;
use crate::server::registry::{ConnectionId, ConnectionRegistry};
use crate::shared::DealerError;

/// Line transport abstraction - all the handler cares about is sending and
/// receiving whole lines of text.
#[async_trait]
pub trait ClientStream: Send + Sync {
    /// Send one line to the client, appending the delimiter.
    async fn send_line(&mut self, line: &str) -> std::io::Result<()>;

    /// Next line from the client without its terminator, or `None` once the
    /// peer has closed the stream.
    async fn receive_line(&mut self) -> std::io::Result<Option<String>>;

    /// Close the connection.
    async fn close(&mut self) -> std::io::Result<()>;
}

/// Newline-delimited UTF-8 framing over any async byte stream. Production
/// code wraps the two halves of a `TcpStream`; tests wrap in-memory pipes.
pub struct LineStream<R, W> {
    reader: BufReader<R>,
    writer: W,
    line: String,
}

impl<R, W> LineStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            line: String::new(),
        }
    }
}

#[async_trait]
impl<R, W> ClientStream for LineStream<R, W>
where
    R: AsyncRead + Unpin + Send + Sync,
    W: AsyncWrite + Unpin + Send + Sync,
{
    async fn send_line(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    async fn receive_line(&mut self) -> std::io::Result<Option<String>> {
        self.line.clear();
        let bytes = self.reader.read_line(&mut self.line).await?;
        if bytes == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim_end_matches(['\r', '\n']).to_string()))
    }

    async fn close(&mut self) -> std::io::Result<()> {
        self.writer.shutdown().await
    }
}

/// One player session. Forwards broadcast payloads from the registry
/// channel to the client and processes the client's command lines until the
/// session ends.
pub struct Connection {
    id: ConnectionId,
    stream: Box<dyn ClientStream>,
    outbound_receiver: mpsc::UnboundedReceiver<String>,
    registry: Arc<dyn ConnectionRegistry>,
    coordinator: Arc<BroadcastCoordinator>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        stream: Box<dyn ClientStream>,
        outbound_receiver: mpsc::UnboundedReceiver<String>,
        registry: Arc<dyn ConnectionRegistry>,
        coordinator: Arc<BroadcastCoordinator>,
    ) -> Self {
        Self {
            id,
            stream,
            outbound_receiver,
            registry,
            coordinator,
        }
    }

    /// Drives the session until the client disconnects, then cleans up. An
    /// error on this connection never reaches any other connection: it ends
    /// the loop here and flows into the same cleanup as a normal exit.
    pub async fn run(mut self) {
        match self.serve().await {
            Ok(()) => info!(id = %self.id, "connection closed"),
            Err(error) => warn!(id = %self.id, %error, "connection closed with error"),
        }

        // Unregister first so an in-flight broadcast stops targeting this
        // channel, then tear the stream down. Both steps run on every exit
        // path and neither failing blocks the other.
        self.registry.unregister(self.id).await;
        if let Err(error) = self.stream.close().await {
            debug!(id = %self.id, %error, "stream teardown failed");
        }
    }

    async fn serve(&mut self) -> Result<(), DealerError> {
        loop {
            tokio::select! {
                // Deck pushes from the coordinator, via the registry channel
                outbound = self.outbound_receiver.recv() => {
                    match outbound {
                        Some(payload) => self.stream.send_line(&payload).await?,
                        None => break, // channel closed, disconnect
                    }
                }

                // Command lines from the client
                inbound = self.stream.receive_line() => {
                    match inbound? {
                        Some(line) => {
                            if !self.handle_line(&line).await {
                                break;
                            }
                        }
                        None => break, // client closed the stream
                    }
                }
            }
        }

        Ok(())
    }

    /// Processes one command line. Returns false once the session should
    /// move to teardown.
    async fn handle_line(&self, line: &str) -> bool {
        match Command::parse(line) {
            Some(Command::Shuffle) => {
                info!(id = %self.id, "shuffle requested");
                if let Err(error) = self.coordinator.reshuffle_and_broadcast().await {
                    // The failed reshuffle aborts on its own; this session
                    // stays up and the deck state is untouched.
                    warn!(id = %self.id, %error, "reshuffle failed, nothing broadcast");
                }
                true
            }
            Some(Command::Disconnect) => {
                info!(id = %self.id, "disconnect requested");
                false
            }
            None => {
                debug!(id = %self.id, line, "ignoring unrecognized line");
                true
            }
        }
    }
}
