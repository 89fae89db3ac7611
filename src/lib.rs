//! HTTP request metrics for axum routers.
//!
//! [`HttpMetrics`] registers a request counter and a duration histogram in a
//! [`Registry`] and records both for every request that reaches the router,
//! labeled by method and matched route pattern.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use route_metrics::{handlers::health::metrics_endpoint, HttpMetrics, MetricsConfig, Registry};
//!
//! # fn build() -> route_metrics::Result<Router> {
//! let registry = Registry::new();
//! let metrics = HttpMetrics::new(MetricsConfig::default(), &registry)?;
//!
//! let app = Router::new()
//!     .route("/", get(|| async { "Hello, World!" }))
//!     .route("/metrics", get(metrics_endpoint).with_state(registry));
//! Ok(metrics.wrap(app))
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod registry;

pub use config::MetricsConfig;
pub use error::{MetricsError, Result};
pub use middleware::{status_label, track_metrics, HttpMetrics, RouteMatch};
pub use registry::Registry;
