use std::future::Future;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::server::connection::{Connection, LineStream};
use crate::server::registry::ConnectionRegistry;
use crate::shared::DealerState;

/// The dealer server: accepts player connections on a TCP listener and
/// spawns one handler task per connection. All handlers share one deck and
/// one connection registry through [`DealerState`].
pub struct DealerServer {
    listener: TcpListener,
    state: DealerState,
}

impl DealerServer {
    pub fn new(listener: TcpListener) -> Self {
        Self {
            listener,
            state: DealerState::new(),
        }
    }

    /// The bound address. Tests bind port 0 and read the real port here.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `shutdown` resolves. An error from one
    /// accept is logged and the loop keeps going; dropping the listener on
    /// shutdown is what unblocks a pending accept.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let DealerServer { listener, state } = self;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("dealer server shutting down");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => spawn_player_handler(stream, peer, &state),
                        Err(error) => warn!(%error, "failed to accept connection"),
                    }
                }
            }
        }
    }

    pub async fn run_until_ctrl_c(self) {
        self.run_until(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!(%error, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

/// Registers the new player, queues the current deck as its first outbound
/// payload, and hands the socket to a spawned connection handler.
fn spawn_player_handler(stream: TcpStream, peer: SocketAddr, state: &DealerState) {
    let state = state.clone();
    tokio::spawn(async move {
        let id = Uuid::new_v4();
        info!(%id, %peer, "player connected");

        let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
        state.registry.register(id, outbound_sender.clone()).await;

        // The newly connected player sees the current deck right away; this
        // is a plain snapshot push, not a reshuffle.
        match state.coordinator.current_snapshot_line().await {
            Ok(line) => {
                let _ = outbound_sender.send(line);
            }
            Err(error) => warn!(%id, %error, "failed to encode initial deck snapshot"),
        }

        let (read_half, write_half) = stream.into_split();
        let connection = Connection::new(
            id,
            Box::new(LineStream::new(read_half, write_half)),
            outbound_receiver,
            state.registry.clone(),
            state.coordinator.clone(),
        );
        connection.run().await;

        debug!(%id, %peer, "player handler finished");
    });
}
