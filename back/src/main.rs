use std::{sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use back::{config::Config, store::memory::MemoryStore};
use clap::Parser;
use tokio::time;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse();

    let store = Arc::new(MemoryStore::load(&config.data_file)?);
    info!(
        path = %config.data_file.display(),
        "loaded todo snapshot"
    );

    tokio::spawn(snapshot_loop(store.clone(), config.clone()));

    let app = back::app(store.clone());
    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    let addr = config.addr();
    match config.tls() {
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(cert, key).await?;
            info!(%addr, "listening with tls");
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!(%addr, "listening");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    store.save(&config.data_file).await?;
    info!("saved todo snapshot");

    Ok(())
}

async fn snapshot_loop(store: Arc<MemoryStore>, config: Config) {
    let mut saved = store.generation();

    loop {
        time::sleep(config.snapshot_interval()).await;

        if store.generation() == saved {
            continue;
        }

        match store.save(&config.data_file).await {
            Ok(generation) => saved = generation,
            Err(err) => error!("Failed to store data: {:?}", err),
        }
    }
}

async fn shutdown_on_ctrl_c(handle: Handle) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {:?}", err);
        return;
    }

    info!("shutting down");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
