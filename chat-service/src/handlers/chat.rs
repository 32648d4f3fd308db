use crate::dtos::{
    EndSessionRequest, EndSessionResponse, MessageRequest, MessageResponse, SessionsQuery,
    SessionsResponse,
};
use crate::middleware::AuthUser;
use crate::models::MessageRole;
use crate::startup::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use service_core::error::AppError;
use validator::Validate;

/// Logs backend failures and hides their detail from the caller.
fn unexpected(context: &'static str) -> impl Fn(AppError) -> AppError {
    move |e| {
        tracing::error!(error = %e, "{}", context);
        AppError::InternalError(anyhow::anyhow!("{}: {}", context, e))
    }
}

#[tracing::instrument(skip_all, fields(user = %auth.0.sub))]
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<MessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let sessions = &state.sessions;

    let session_id = match &req.session_id {
        Some(session_id) => {
            let session = sessions
                .get_session(session_id)
                .await
                .map_err(unexpected("Failed to load session"))?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;

            if session.is_ended() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Session has already ended"
                )));
            }

            if let Some(user_id) = req.user_id.as_deref().filter(|u| !u.is_empty()) {
                if session.user_id != user_id {
                    return Err(AppError::Forbidden(anyhow::anyhow!(
                        "Session does not belong to this user"
                    )));
                }
            }

            session_id.clone()
        }
        None => {
            let user_id = req
                .user_id
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!(
                        "user_id is required when creating a new session"
                    ))
                })?;

            sessions
                .create_session(user_id, req.user.clone())
                .await
                .map_err(unexpected("Failed to create session"))?
        }
    };

    sessions
        .add_message(&session_id, MessageRole::User, &req.message, req.user.clone())
        .await
        .map_err(unexpected("Failed to store user message"))?;

    let mut history = sessions
        .get_conversation_history(&session_id)
        .await
        .map_err(unexpected("Failed to load conversation history"))?;
    // The turn just stored is sent as the prompt's final line instead.
    history.pop();

    let reply = state
        .assistant
        .generate_response(&req.message, &history, req.user.as_ref())
        .await;

    sessions
        .add_message(&session_id, MessageRole::Assistant, &reply, None)
        .await
        .map_err(unexpected("Failed to store assistant reply"))?;

    Ok(Json(MessageResponse { reply, session_id }))
}

#[tracing::instrument(skip_all)]
pub async fn end_session(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<EndSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let session = state
        .sessions
        .get_session(&req.session_id)
        .await
        .map_err(unexpected("Failed to load session"))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;

    // Ended sessions are removed from Redis, so this only guards stale writers.
    if session.is_ended() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Session has already ended"
        )));
    }

    let ended = state
        .sessions
        .end_session(&req.session_id)
        .await
        .map_err(unexpected("Failed to end session"))?;

    if !ended {
        return Err(AppError::InternalError(anyhow::anyhow!(
            "Failed to end session"
        )));
    }

    Ok(Json(EndSessionResponse {
        status: "ended".to_string(),
    }))
}

pub async fn get_user_sessions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
    Query(query): Query<SessionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state
        .sessions
        .get_user_sessions(&user_id, query.status_filter())
        .await
        .map_err(unexpected("Failed to fetch sessions"))?;

    Ok(Json(SessionsResponse {
        count: sessions.len(),
        sessions,
    }))
}
