// src/middleware/logging.rs
use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::middleware::labels::RouteMatch;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request logging middleware with correlation ID.
///
/// Runs the rest of the chain inside a `request` span carrying the id, the
/// method and the same route label the metrics use, and echoes the id back
/// in `x-request-id`.
pub async fn request_logger(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let route = RouteMatch::from_request(&req).label();
    let span = info_span!("request", %request_id, method = %req.method(), %route);

    async move {
        info!(uri = %req.uri(), "➡️ started");
        let start = Instant::now();

        let mut response = next.run(req).await;

        info!(status = %response.status(), elapsed = ?start.elapsed(), "⬅️ finished");
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}
