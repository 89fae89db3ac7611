//! Request count and duration middleware.
//!
//! Records two families per request:
//! - `{namespace}_{subsystem}_requests_total{status, method, handler}`
//! - `{namespace}_{subsystem}_request_duration_seconds{method, handler}`
//!
//! `handler` is the matched route pattern, never the literal request path.

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::sync::Arc;
use tracing::trace;

use crate::config::MetricsConfig;
use crate::error::Result;
use crate::middleware::labels::{status_label, RouteMatch};
use crate::registry::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};

pub const REQUESTS_TOTAL: &str = "requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "request_duration_seconds";

/// Instruments shared by every request passing through the middleware.
#[derive(Clone)]
pub struct HttpMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    config: MetricsConfig,
    requests: CounterVec,
    duration: HistogramVec,
}

impl HttpMetrics {
    /// Registers the request counter and duration histogram in `registry`.
    ///
    /// Fails if either name is already registered there, or if the registry
    /// rejects the configured buckets. A failed call leaves `registry` as it
    /// found it.
    pub fn new(config: MetricsConfig, registry: &Registry) -> Result<Self> {
        // histogram first, so rejected buckets leave nothing registered
        let duration = registry.register_histogram(HistogramOpts::new(
            Opts::new(REQUEST_DURATION_SECONDS, "Spend time by processing a route")
                .namespace(config.namespace.as_str())
                .subsystem(config.subsystem.as_str())
                .label_names(&["method", "handler"]),
            config.buckets.clone(),
        ))?;

        let requests = registry
            .register_counter(
                Opts::new(REQUESTS_TOTAL, "Number of HTTP operations")
                    .namespace(config.namespace.as_str())
                    .subsystem(config.subsystem.as_str())
                    .label_names(&["status", "method", "handler"]),
            )
            .map_err(|err| {
                registry.unregister(duration.name());
                err
            })?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                requests,
                duration,
            }),
        })
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.inner.config
    }

    /// Installs the middleware on every route and on the fallback of `router`.
    pub fn wrap<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self.clone(), track_metrics))
    }
}

/// Metrics middleware to record request count and duration
pub async fn track_metrics(
    State(metrics): State<HttpMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    // to avoid high cardinality from unmatched paths
    let route = RouteMatch::from_request(&req).label().to_string();

    let timer = metrics.inner.duration.start_timer(&[method.as_str(), route.as_str()]);
    let response = next.run(req).await;
    let elapsed = timer.observe_duration();

    let status = status_label(
        response.status().as_u16(),
        metrics.inner.config.normalize_http_status,
    );
    metrics
        .inner
        .requests
        .with_label_values(&[&*status, method.as_str(), route.as_str()])
        .increment(1);

    trace!(%method, %route, %status, ?elapsed, "request observed");

    response
}
