use crate::startup::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Chat Microservice API",
        "version": state.config.version,
        "docs": "/docs",
        "debug_mode": state.config.debug,
        "auth_endpoints": state.config.debug,
    }))
}

pub async fn ping() -> Json<Value> {
    Json(json!({ "ping": "pong" }))
}
