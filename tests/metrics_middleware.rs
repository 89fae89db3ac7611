use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use route_metrics::{
    handlers::health::{health_check, metrics_endpoint},
    middleware::{logging::REQUEST_ID_HEADER, request_logger},
    HttpMetrics, MetricsConfig, Registry,
};
use std::collections::BTreeSet;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

struct AppError;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "something broke").into_response()
    }
}

async fn failing() -> Result<&'static str, AppError> {
    Err(AppError)
}

fn app(config: MetricsConfig) -> (Router, Registry) {
    let registry = Registry::new();
    let metrics = HttpMetrics::new(config, &registry).unwrap();

    let router = Router::new()
        .route("/", get(|| async { "Hello, World!" }))
        .route("/users/:id", get(|| async { "user" }))
        .route("/fail", get(failing))
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics_endpoint).with_state(registry.clone()));

    (metrics.wrap(router), registry)
}

async fn send(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn handler_labels(output: &str) -> BTreeSet<String> {
    output
        .split("handler=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_default_config_records_matched_route() {
    let (app, _registry) = app(MetricsConfig::default());

    let (status, body) = send(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello, World!");

    let (status, output) = send(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(output.contains("echo"));
    assert!(output.contains("http"));
    assert!(output.contains("# HELP echo_http_requests_total Number of HTTP operations"));
    assert!(output.contains("echo_http_requests_total{status=\"2xx\",method=\"GET\",handler=\"/\"} 1"));
    assert!(output.contains("echo_http_request_duration_seconds_bucket{method=\"GET\",handler=\"/\",le=\"+Inf\"} 1"));
    assert!(output.contains("echo_http_request_duration_seconds_count{method=\"GET\",handler=\"/\"} 1"));
}

#[tokio::test]
async fn test_custom_config_uses_raw_status() {
    let config = MetricsConfig::default()
        .with_namespace("namespace")
        .with_subsystem("test_subsystem")
        .with_normalize_http_status(false)
        .with_buckets([1.0, 2.0]);
    let (app, _registry) = app(config);

    send(&app, "/").await;
    let (status, output) = send(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(output.contains("namespace"));
    assert!(output.contains("test_subsystem"));
    assert!(output.contains(
        "namespace_test_subsystem_requests_total{status=\"200\",method=\"GET\",handler=\"/\"} 1"
    ));
    assert!(!output.contains("status=\"2xx\""));
    assert!(output.contains(
        "namespace_test_subsystem_request_duration_seconds_bucket{method=\"GET\",handler=\"/\",le=\"+Inf\"} 1"
    ));
}

#[tokio::test]
async fn test_route_pattern_is_the_label() {
    let (app, registry) = app(MetricsConfig::default());

    for id in 1..=3 {
        let (status, _) = send(&app, &format!("/users/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let output = registry.render();
    assert!(output.contains("echo_http_requests_total{status=\"2xx\",method=\"GET\",handler=\"/users/:id\"} 3"));
    assert!(output.contains("echo_http_request_duration_seconds_count{method=\"GET\",handler=\"/users/:id\"} 3"));
    assert!(!output.contains("/users/1"));
}

#[tokio::test]
async fn test_unmatched_paths_share_one_label() {
    let (app, registry) = app(MetricsConfig::default());

    for path in ["/a", "/b", "/c", "/d", "/e", "/f", "/g", "/h", "/i", "/j"] {
        let (status, _) = send(&app, path).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let output = registry.render();
    let expected: BTreeSet<String> = ["/not-found".to_string()].into_iter().collect();
    assert_eq!(handler_labels(&output), expected);
    assert!(output.contains("echo_http_requests_total{status=\"4xx\",method=\"GET\",handler=\"/not-found\"} 10"));
    assert!(output.contains("echo_http_request_duration_seconds_count{method=\"GET\",handler=\"/not-found\"} 10"));
}

#[tokio::test]
async fn test_failed_handler_is_passed_through_and_observed() {
    let (app, registry) = app(MetricsConfig::default());

    let (status, body) = send(&app, "/fail").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "something broke");

    let output = registry.render();
    assert!(output.contains("echo_http_requests_total{status=\"5xx\",method=\"GET\",handler=\"/fail\"} 1"));
    assert!(output.contains("echo_http_request_duration_seconds_count{method=\"GET\",handler=\"/fail\"} 1"));
}

#[tokio::test]
async fn test_independent_registries_do_not_share_samples() {
    let (first, first_registry) = app(MetricsConfig::default());
    let (_second, second_registry) = app(MetricsConfig::default());

    send(&first, "/").await;

    assert!(first_registry.render().contains("handler=\"/\"} 1"));
    assert!(!second_registry.render().contains("handler=\"/\""));
}

#[tokio::test]
async fn test_health_check_and_request_logger() {
    let (app, registry) = app(MetricsConfig::default());
    let app = app.layer(middleware::from_fn(request_logger));

    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert!(Uuid::parse_str(request_id).is_ok());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], br#"{"status":"ok"}"#);

    assert!(registry
        .render()
        .contains("echo_http_requests_total{status=\"2xx\",method=\"GET\",handler=\"/healthz\"} 1"));
}

#[tokio::test]
async fn test_duration_covers_downstream_handler() {
    let registry = Registry::new();
    let metrics = HttpMetrics::new(MetricsConfig::default().with_buckets([0.01, 1.0]), &registry).unwrap();
    let app = metrics.wrap(Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            "done"
        }),
    ));

    let (status, _) = send(&app, "/slow").await;
    assert_eq!(status, StatusCode::OK);

    let output = registry.render();
    assert!(output.contains("echo_http_request_duration_seconds_bucket{method=\"GET\",handler=\"/slow\",le=\"0.01\"} 0"));
    assert!(output.contains("echo_http_request_duration_seconds_bucket{method=\"GET\",handler=\"/slow\",le=\"1\"} 1"));

    let sum: f64 = output
        .lines()
        .find_map(|line| line.strip_prefix("echo_http_request_duration_seconds_sum{method=\"GET\",handler=\"/slow\"} "))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(sum >= 0.05, "sum was {}", sum);
}
