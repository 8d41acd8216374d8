use std::sync::Arc;

use anyhow::Context;
use city_builder::{
    api::websocket,
    city::Resources,
    config::Config,
    instrumentation,
    persistence::{BuildingStore, HttpBuildingStore, MemoryBuildingStore},
    session::auth::MemoryAuthenticator,
};
use clap::Parser;
use tokio::task::JoinSet;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    instrumentation::init_tracing(config.log_format)?;
    tracing::info!("Starting the city builder...");

    let starting = config.starting_resources();
    match config.api_url.as_deref() {
        Some(url) => {
            let store = HttpBuildingStore::new(url, config.request_timeout())
                .with_context(|| format!("invalid buildings backend url {url}"))?;
            tracing::info!("Persisting buildings to {}", url);
            run(&config.listen, Arc::new(store), starting).await
        }
        None => {
            tracing::warn!("No buildings backend configured, keeping buildings in memory");
            run(&config.listen, Arc::new(MemoryBuildingStore::new()), starting).await
        }
    }
}

async fn run<S: BuildingStore>(addr: &str, store: Arc<S>, starting: Resources) -> anyhow::Result<()> {
    let auth = Arc::new(MemoryAuthenticator::new());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to address {addr}"))?;
    tracing::info!("Listening for TCP connections on {}", addr);

    let mut handles = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::info!("New connection from {}", peer);
                    handles.spawn(websocket::accept_connection(
                        stream,
                        store.clone(),
                        auth.clone(),
                        starting,
                    ));
                }
                Err(e) => tracing::warn!("Failed to accept connection: {}", e),
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, closing connections...");
                break;
            }
        }
    }

    handles.abort_all();
    while let Some(result) = handles.join_next().await {
        match result {
            Err(e) if !e.is_cancelled() => tracing::warn!("Connection task failed: {}", e),
            _ => {}
        }
    }

    tracing::info!("All connections have been closed.");
    Ok(())
}
