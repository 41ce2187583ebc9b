use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use super::AppState;
use super::types::HealthResponse;

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_ok = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed to reach the database");
            false
        }
    };

    let body = HealthResponse {
        status: if db_ok { "ok" } else { "degraded" },
        database: if db_ok { "connected" } else { "unreachable" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body))
}
