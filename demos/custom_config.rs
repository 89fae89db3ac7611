// demos/custom_config.rs
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
    // Load environment variables
    dotenv::dotenv().ok();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MetricsConfig::from_env()?
        .with_namespace("namespace")
        .with_normalize_http_status(false)
        .with_buckets([
            0.0005, // 0.5ms
            0.001,  // 1ms
            0.005,  // 5ms
            0.01,   // 10ms
            0.05,   // 50ms
            0.1,    // 100ms
            0.5,    // 500ms
            1.0,    // 1s
            2.0,    // 2s
        ]);
    tracing::info!(?config, "⚙️ Loaded configuration");

    let registry = Registry::new();
    let metrics = HttpMetrics::new(config, &registry)?;

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
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(%err, "Failed to install Ctrl+C handler");
            }
            tracing::info!("⚡ Shutdown signal received");
        })
        .await?;

    Ok(())
}
