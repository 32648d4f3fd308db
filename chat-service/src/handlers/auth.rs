use crate::dtos::TokenResponse;
use crate::startup::AppState;
use axum::{extract::State, Json};
use chrono::Duration;
use service_core::error::AppError;

pub const TEST_TOKEN_SUBJECT: &str = "test_user";
pub const TEST_TOKEN_USER_ID: &str = "test_123";

/// Development-only token issuer. The route is mounted only in debug mode.
pub async fn generate_test_token(
    State(state): State<AppState>,
) -> Result<Json<TokenResponse>, AppError> {
    let access_token = state.jwt.issue_token(
        TEST_TOKEN_SUBJECT,
        Some(TEST_TOKEN_USER_ID),
        Some(Duration::hours(24)),
    )?;

    tracing::info!("Issued development test token");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
