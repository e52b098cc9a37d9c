//! HTTP request/response tracing middleware.

use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Creates a tracing middleware for HTTP requests.
///
/// Redirects are the hot path, so the request span is kept at `DEBUG` and
/// only the response line (status and latency in microseconds) is emitted at
/// `INFO`.
///
/// # Example Logs
///
/// ```text
/// INFO request{method=GET uri=/abc123 version=HTTP/1.1}: finished processing request latency=84 μs status=307
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Micros),
        )
}
