//! Username/password accounts and bearer-token authentication.
//!
//! Passwords are stored as Argon2id hashes; sessions are stateless HMAC-signed
//! tokens checked by a middleware that runs before any post handler.

mod credentials;
mod token;

pub use credentials::CredentialStore;
pub use token::SessionIssuer;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, Extensions},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;

/// Username asserted by a verified token, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    /// Username attached by the auth layer, if the request went through it.
    pub fn from_extensions(extensions: &Extensions) -> Option<&str> {
        extensions.get::<AuthenticatedUser>().map(|u| u.0.as_str())
    }
}

/// Bearer authentication layer function that takes the token issuer as a parameter.
pub async fn bearer_auth_layer(
    sessions: Arc<SessionIssuer>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        tracing::debug!("Missing or malformed authorization header");
        return unauthorized_response();
    };

    match sessions.verify(token) {
        Ok(claims) => {
            tracing::debug!(username = %claims.sub, "Authenticated request");
            request
                .extensions_mut()
                .insert(AuthenticatedUser(claims.sub));
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            e.into_response()
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Create an unauthorized response.
fn unauthorized_response() -> Response {
    AppError::Unauthorized("Missing or invalid token".to_string()).into_response()
}
