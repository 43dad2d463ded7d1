//! Dance Registry Server
//!
//! Serves the registration engine over HTTP.
//!
//! # Usage
//!
//! ```bash
//! EVENT_CATALOG_PATH=config/catalog.example.json cargo run --bin server
//! ```

use anyhow::Context;
use dance_registry_web::{build_router, AppState, Config};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,dance_registry_core=debug,dance_registry_web=debug,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        bind = %config.server.bind_address(),
        catalog = ?config.catalog_path,
        "Configuration loaded"
    );

    let catalog = config.load_catalog()?;
    tracing::info!(
        categories = catalog.categories().len(),
        events = catalog.event_count(),
        "Event catalog loaded"
    );
    if catalog.categories().is_empty() {
        tracing::warn!("Category ladder is empty; every participant will be unclassified");
    }

    let app = build_router(AppState::new(catalog));
    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    tracing::info!(%address, "Dance registry server listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result.context("server task panicked")??;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    tracing::info!("Shutting down gracefully...");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(config.server.shutdown_timeout(), server).await {
        Ok(result) => {
            result.context("server task panicked")??;
            tracing::info!("Graceful shutdown complete");
        }
        Err(_) => tracing::warn!(
            timeout_secs = config.server.shutdown_timeout,
            "Shutdown timed out; dropping open connections"
        ),
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }
}
