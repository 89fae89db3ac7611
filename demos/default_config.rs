// demos/default_config.rs
use axum::{middleware, routing::get, Router};
use route_metrics::{
    handlers::health::{health_check, metrics_endpoint},
    middleware::request_logger,
    HttpMetrics, MetricsConfig, Registry,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = Registry::new();
    let metrics = HttpMetrics::new(MetricsConfig::default(), &registry)?;
    tracing::info!(config = ?metrics.config(), "⚙️ Metrics registered");

    let app = Router::new()
        .route("/", get(|| async { "Hello, World!" }))
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics_endpoint).with_state(registry));

    let app = metrics.wrap(app).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(request_logger)),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], 1323));
    tracing::info!(%addr, "🌐 Server running");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "Failed to install terminate signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    tracing::info!("⚡ Shutdown signal received");
}
