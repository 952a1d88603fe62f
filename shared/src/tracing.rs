use opentelemetry::{propagation::TextMapPropagator, sdk::propagation::TraceContextPropagator};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub async fn record_error<
    T,
    E: std::fmt::Display,
    F: FnOnce() -> R,
    R: std::future::Future<Output = Result<T, E>>,
>(
    level: tracing::Level,
    func: F,
) -> Result<T, E> {
    let result = func().await;
    if let Err(ref e) = result {
        insert_error_fields(level, e);
    }
    result
}

pub fn insert_error_fields(level: tracing::Level, error: impl std::fmt::Display) {
    Span::current().record("error", &tracing::field::display("true"));
    Span::current().record("error.level", &tracing::field::display(level));
    Span::current().record("error.message", &tracing::field::display(error));
}

/// Sets the parent of the current span from W3C trace-context headers.
pub fn extract_tracing_from_headers(headers: &http::HeaderMap) {
    let propagator = TraceContextPropagator::new();
    let parent_cx = propagator.extract(&opentelemetry_http::HeaderExtractor(headers));
    Span::current().set_parent(parent_cx)
}
