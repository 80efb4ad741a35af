//! Broadside Server
//!
//! Authoritative WebSocket server for two-player battleship sessions.

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use broadside::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = ServerConfig::default();
    if let Ok(port) = std::env::var("PORT") {
        config.bind_addr.set_port(port.parse()?);
    }

    info!("Broadside Server v{}", VERSION);
    info!("Binding to {}", config.bind_addr);

    let server = GameServer::new(config);

    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            server.shutdown();
        }
    }

    info!("Server stopped");
    Ok(())
}
