use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::AppState;

/// Requests slower than this are logged at warn level.
const SLOW_REQUEST_MS: u64 = 1_000;

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

fn outcome(status: u16) -> &'static str {
    match status {
        500.. => "error",
        400..=499 => "client_error",
        _ => "success",
    }
}

/// Metric scrapes and health checks would otherwise dominate the request metrics.
fn is_housekeeping_route(route: &str) -> bool {
    matches!(route, "/api/metrics" | "/api/health")
}

/// Wraps each request in a span, records request metrics and emits one
/// summary event per request. The span's `user_id` is filled in by the auth
/// middleware.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| path.clone(), |mp| mp.as_str().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        route = %route,
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let elapsed = start.elapsed();
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let status = response.status().as_u16();
        let outcome = outcome(status);

        if !is_housekeeping_route(&route) {
            let labels = [
                ("method", method),
                ("route", route),
                ("status", status.to_string()),
            ];
            metrics::counter!("http_requests_total", &labels).increment(1);
            metrics::histogram!("http_request_duration_seconds", &labels)
                .record(elapsed.as_secs_f64());
        }

        if duration_ms >= SLOW_REQUEST_MS {
            warn!(duration_ms, status_code = status, outcome, "Slow request");
        } else {
            info!(
                event = "http_request_finished",
                duration_ms,
                status_code = status,
                outcome,
                "Request finished"
            );
        }

        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_buckets() {
        assert_eq!(outcome(200), "success");
        assert_eq!(outcome(304), "success");
        assert_eq!(outcome(409), "client_error");
        assert_eq!(outcome(502), "error");
    }

    #[test]
    fn test_health_and_metrics_routes_are_not_counted() {
        assert!(is_housekeeping_route("/api/health"));
        assert!(!is_housekeeping_route("/api/movies/{tmdb_id}"));
    }
}
