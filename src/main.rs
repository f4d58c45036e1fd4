use dealer::server::DealerServer;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Port taken over from the original dealer deployment.
const DEFAULT_ADDR: &str = "0.0.0.0:60451";

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dealer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("DEALER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

    let listener = TcpListener::bind(addr.as_str())
        .await
        .unwrap_or_else(|error| panic!("failed to bind {}: {}", addr, error));
    info!(%addr, "dealer server is now running");

    DealerServer::new(listener).run_until_ctrl_c().await;
}
