//! Authentication middleware for protecting routes
//!
//! Takes the access token from the `Authorization: Bearer` header, falling
//! back to the `access_token` cookie. On success the token's identity is added
//! to request extensions as [`AuthenticatedUser`].

use super::cookies::{bearer_token, read_cookie, ACCESS_TOKEN_COOKIE};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use regauth_core::{Claims, TokenClass, TokenError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Identity extracted from a validated access token
///
/// Extract it in handlers with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_name: String,
    pub email: String,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_name: claims.username,
            email: claims.email,
        }
    }
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing access token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("UNAUTHORIZED", "Missing access token"),
            ),
            AuthError::InvalidToken(TokenError::Expired) => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("TOKEN_EXPIRED", "Access token expired"),
            ),
            AuthError::InvalidToken(TokenError::Config) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal_error(),
            ),
            AuthError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("UNAUTHORIZED", "Invalid access token"),
            ),
        };

        (status, Json(error)).into_response()
    }
}

/// Authentication middleware that requires a valid access token
///
/// ```ignore
/// let protected = Router::new()
///     .route("/profile", get(profile_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let headers = request.headers();

    let token = match bearer_token(headers)
        .map(str::to_string)
        .or_else(|| read_cookie(headers, ACCESS_TOKEN_COOKIE))
    {
        Some(token) => token,
        None => {
            audit_log(&AuditEvent::InvalidToken {
                reason: AuthError::MissingToken.to_string(),
                ip_address: extract_ip_address(headers),
                user_agent: extract_user_agent(headers),
            });
            return Err(AuthError::MissingToken);
        }
    };

    let claims = match state.tokens.validate(&token, TokenClass::Access) {
        Ok(claims) => claims,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
                ip_address: extract_ip_address(headers),
                user_agent: extract_user_agent(headers),
            });
            return Err(AuthError::InvalidToken(e));
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(claims));

    Ok(next.run(request).await)
}
