pub mod labels;
pub mod logging;
pub mod metrics;

pub use labels::{status_label, RouteMatch, NOT_FOUND_ROUTE};
pub use logging::request_logger;
pub use metrics::{track_metrics, HttpMetrics};
