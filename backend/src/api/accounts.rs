//! Account API endpoints (authenticated variant only).

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use super::ApiResult;
use crate::errors::AppError;
use crate::models::{CredentialsRequest, MessageResponse, TokenResponse};
use crate::AppState;

/// POST /register - Create an account.
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let Json(request) = body?;
    let (username, password) = request.fields().ok_or_else(missing_credentials)?;

    state.credentials.register(username, password).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// POST /login - Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(request) = body?;
    let (username, password) = request.fields().ok_or_else(missing_credentials)?;

    let sessions = state
        .sessions
        .as_ref()
        .ok_or_else(|| AppError::Internal("login route mounted without an issuer".to_string()))?;

    state.credentials.verify(username, password).await?;
    let access_token = sessions.issue(username)?;

    tracing::info!(username, "User logged in");
    Ok(Json(TokenResponse { access_token }))
}

fn missing_credentials() -> AppError {
    AppError::Validation("Username and password are required".to_string())
}
