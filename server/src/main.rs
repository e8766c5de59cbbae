//! Chatroom server binary.
//!
//! Entry point for the WebSocket room broadcast server.

use chatroom_server::{AppState, Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chatroom_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env()?;
    let state = AppState::new(&config);

    tracing::info!(
        "Starting chat server on {}:{} (room names: {:?}, allowed hosts: {:?})",
        config.host,
        config.port,
        config.room_name_policy,
        config.allowed_hosts
    );

    let server = Server::new(config, state);
    server.run().await?;

    tracing::info!("Chat server stopped");
    Ok(())
}
