// src/middleware/labels.rs
use axum::{extract::MatchedPath, http::Request};
use std::borrow::Cow;

/// Route label used for every request served by the router fallback.
pub const NOT_FOUND_ROUTE: &str = "/not-found";

/// Outcome of routing a request.
///
/// The router only attaches a [`MatchedPath`] when one of its routes matched,
/// so a request without one is being served by the fallback handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch<'a> {
    Matched(&'a str),
    Fallback,
}

impl<'a> RouteMatch<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        match req.extensions().get::<MatchedPath>() {
            Some(path) => RouteMatch::Matched(path.as_str()),
            None => RouteMatch::Fallback,
        }
    }

    /// The route pattern, or [`NOT_FOUND_ROUTE`] so that unmatched paths
    /// never become label values.
    pub fn label(&self) -> &'a str {
        match *self {
            RouteMatch::Matched(pattern) => pattern,
            RouteMatch::Fallback => NOT_FOUND_ROUTE,
        }
    }
}

/// Status label for a response code: the status class when `normalize` is
/// set, the decimal code otherwise.
pub fn status_label(code: u16, normalize: bool) -> Cow<'static, str> {
    if !normalize {
        return Cow::Owned(code.to_string());
    }

    let class = if code < 200 {
        "1xx"
    } else if code < 300 {
        "2xx"
    } else if code < 400 {
        "3xx"
    } else if code < 500 {
        "4xx"
    } else {
        "5xx"
    };
    Cow::Borrowed(class)
}
