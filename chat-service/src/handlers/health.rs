use crate::config::SERVICE_NAME;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::middleware::render_metrics;

fn up_down(ok: bool) -> &'static str {
    if ok {
        "up"
    } else {
        "down"
    }
}

/// Always 200; reports each backend and `degraded` if any is down.
pub async fn api_health(State(state): State<AppState>) -> impl IntoResponse {
    let (mongo_ok, redis_ok) = tokio::join!(
        state.sessions.archive_health(),
        state.sessions.store_health()
    );

    let status = if mongo_ok && redis_ok {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "services": {
            "api": "up",
            "mongodb": up_down(mongo_ok),
            "redis": up_down(redis_ok),
        }
    }))
}

/// Liveness check.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness check: 503 until both Redis and MongoDB answer.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let (mongo_ok, redis_ok) = tokio::join!(
        state.sessions.archive_health(),
        state.sessions.store_health()
    );

    if mongo_ok && redis_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn metrics() -> impl IntoResponse {
    render_metrics()
}
