//! Per-client request ceiling for the identity routes.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};
use governor::{clock::QuantaInstant, middleware::NoOpMiddleware};
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
};

use crate::response::ApiResponse;

pub type RateLimiterLayer = GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, Body>;

/// Roughly 100 requests per 15 minutes per client IP: a burst of 100, then
/// one request every 9 seconds. The client IP is read from proxy headers
/// first and the peer address otherwise.
pub fn identity_rate_limiter() -> Option<RateLimiterLayer> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_millisecond(9_000)
        .burst_size(100)
        .finish()?;
    Some(GovernorLayer::new(Arc::new(config)).error_handler(throttled_response))
}

/// Render limiter rejections in the usual `{success, message}` envelope,
/// keeping the retry headers the limiter attaches.
fn throttled_response(err: GovernorError) -> Response<Body> {
    let (status, message, headers) = match err {
        GovernorError::TooManyRequests { wait_time, headers } => {
            tracing::debug!(wait_time, "identity request throttled");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later.".to_string(),
                headers,
            )
        }
        GovernorError::UnableToExtractKey => {
            tracing::warn!("rate limiter could not determine the client address");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            )
        }
        GovernorError::Other { code, msg, headers } => (
            code,
            msg.unwrap_or_else(|| "Request rejected".to_string()),
            headers,
        ),
    };

    let mut response = (status, Json(ApiResponse::failure(message))).into_response();
    if let Some(headers) = headers {
        response.headers_mut().extend(headers);
    }
    response
}
