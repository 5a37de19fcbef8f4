//! Marketplace HTTP server.

use bazaar_runtime::StoreConfig;
use bazaar_runtime::metrics::MetricsRecorder;
use marketplace::{
    Config, MarketEnvironment, Marketplace,
    handlers::AppState,
    router::build_router,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketplace=info,bazaar_runtime=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Marketplace HTTP Server");

    // Load configuration
    let config = Config::from_env();
    info!(
        address = %config.bind_address(),
        metrics_enabled = config.server.metrics_enabled,
        token_format = ?config.tokens.format,
        "Configuration loaded"
    );

    // Metrics
    let mut metrics = MetricsRecorder::new();
    if config.server.metrics_enabled {
        if let Err(e) = metrics.install() {
            warn!(error = %e, "Failed to install metrics recorder, continuing without /metrics");
        }
    }

    // Store
    let env = MarketEnvironment::production(config.tokens.bytes, config.tokens.format);
    let store_config = StoreConfig::default()
        .with_broadcast_capacity(config.store.broadcast_capacity)
        .with_shutdown_timeout(config.shutdown_timeout());
    let market = Marketplace::with_config(env, store_config, config.request_timeout());
    info!("Marketplace store initialized");

    let app = build_router(AppState::new(market.clone(), metrics));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, draining store");
    if let Err(e) = market.shutdown(market.store().default_shutdown_timeout()).await {
        error!(error = %e, "Store did not drain before the shutdown timeout");
    }

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// A signal handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
