//! mbtiles-server binary.
//!
//! Starts the tile server from command-line flags, relays lifecycle
//! events to the log, and shuts down gracefully on Ctrl+C.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mbtiles_server::{Event, Server, ServerOptions};

#[derive(Parser, Debug)]
#[command(name = "mbtiles-server", version, about = "HTTP tile server for MBTiles files")]
struct Args {
    /// Listen port (default: 5000)
    #[arg(short, long)]
    port: Option<u16>,

    /// URL domain (default: localhost)
    #[arg(short, long)]
    domain: Option<String>,

    /// Cache directory holding .mbtiles files (default: ~/mbtiles)
    #[arg(short, long)]
    cache: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mbtiles_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let options = ServerOptions {
        port: args.port,
        domain: args.domain,
        cache: args.cache,
    };

    let server = Server::new(options.clone());

    let mut events = server.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(Event::Start(settings)) => tracing::info!(
                    port = settings.port,
                    cache = %settings.cache.display(),
                    "lifecycle: start"
                ),
                Ok(Event::End) => tracing::info!("lifecycle: end"),
                Ok(Event::Log(log)) => tracing::info!(
                    method = %log.method,
                    url = %log.url,
                    ip = %log.ip,
                    "request"
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let settings = server.start(options).await?;
    tracing::info!(
        url = %format!("{}://{}:{}", settings.protocol, settings.domain, settings.port),
        "mbtiles-server ready"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    server.close().await;
    Ok(())
}
