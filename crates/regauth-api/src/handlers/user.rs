//! User account handlers
//!
//! Registration, login, token refresh and the protected profile endpoint.
//! Every success body is wrapped in the `{data, message}` envelope.

use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::auth::cookies::{read_cookie, token_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::auth::{AuthenticatedUser, LoginRequest, RefreshRequest, RegisterRequest};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use chrono::Duration;
use std::sync::Arc;

fn cookie_header(name: &str, token: &str, max_age: Duration) -> Result<HeaderValue, AppError> {
    token_cookie(name, token, max_age)
        .map_err(|e| AppError::Internal(format!("Failed to build {name} cookie: {e}")))
}

/// Register a new user account
///
/// # Request Body
///
/// * `userName` - At least 3 characters, unique
/// * `email` - Valid email address, unique
/// * `password` - 8+ characters with uppercase, lowercase and a digit
/// * `fullName` - Display name
///
/// # Responses
///
/// * `201 Created` - Profile of the new user
/// * `400 Bad Request` - Missing or invalid fields, or the user already exists
#[utoipa::path(
    post,
    path = "/api/user/register",
    tag = "user",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = regauth_core::UserProfile),
        (status = 400, description = "Invalid input or duplicate user", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = body?;
    let user_name = request.user_name.clone();
    let email = request.email.clone();

    match state.accounts().register(request).await {
        Ok(profile) => {
            audit_log(&AuditEvent::RegistrationSuccess {
                user_name: profile.user_name.clone(),
                email: profile.email.clone(),
                ip_address: extract_ip_address(&headers),
                user_agent: extract_user_agent(&headers),
            });
            Ok(ApiResponse::created(profile, "User registered successfully"))
        }
        Err(e) => {
            audit_log(&AuditEvent::RegistrationFailure {
                user_name,
                email,
                reason: e.to_string(),
                ip_address: extract_ip_address(&headers),
                user_agent: extract_user_agent(&headers),
            });
            Err(e)
        }
    }
}

/// Login with username or email and password
///
/// Returns both tokens in the body and also sets them as `HttpOnly` cookies.
///
/// # Responses
///
/// * `200 OK` - Tokens and identity
/// * `400 Bad Request` - Missing fields
/// * `401 Unauthorized` - Wrong password
/// * `404 Not Found` - No such user
#[utoipa::path(
    post,
    path = "/api/user/login",
    tag = "user",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = crate::auth::LoginResponse),
        (status = 400, description = "Missing fields", body = crate::error::ApiError),
        (status = 401, description = "Invalid password", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = body?;
    let identity = if request.user_name.trim().is_empty() {
        request.email.trim().to_string()
    } else {
        request.user_name.trim().to_string()
    };

    let response = match state.accounts().login(request).await {
        Ok(response) => response,
        Err(e) => {
            audit_log(&AuditEvent::LoginFailure {
                identity,
                reason: e.to_string(),
                ip_address: extract_ip_address(&headers),
                user_agent: extract_user_agent(&headers),
            });
            return Err(e);
        }
    };

    audit_log(&AuditEvent::LoginSuccess {
        user_name: response.user_name.clone(),
        email: response.email.clone(),
        ip_address: extract_ip_address(&headers),
        user_agent: extract_user_agent(&headers),
    });

    let cookies = [
        (
            header::SET_COOKIE,
            cookie_header(ACCESS_TOKEN_COOKIE, &response.access_token, state.tokens.access_ttl())?,
        ),
        (
            header::SET_COOKIE,
            cookie_header(REFRESH_TOKEN_COOKIE, &response.refresh_token, state.tokens.refresh_ttl())?,
        ),
    ];

    Ok((AppendHeaders(cookies), ApiResponse::ok(response, "Login successful")))
}

/// Exchange a refresh token for a new access token
///
/// The token comes from the `refresh_token` body field, or from the
/// `refresh_token` cookie when the body carries none.
///
/// # Responses
///
/// * `200 OK` - New access token
/// * `400 Bad Request` - No refresh token supplied
/// * `401 Unauthorized` - Invalid, expired or wrong-class token
#[utoipa::path(
    post,
    path = "/api/user/refresh-token",
    tag = "user",
    request_body(content = RefreshRequest, description = "Refresh token (optional when the cookie is set)"),
    responses(
        (status = 200, description = "Access token refreshed successfully", body = crate::auth::RefreshResponse),
        (status = 400, description = "Refresh token is required", body = crate::error::ApiError),
        (status = 401, description = "Invalid or expired refresh token", body = crate::error::ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let refresh_token = body
        .map(|Json(request)| request.refresh_token.trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| read_cookie(&headers, REFRESH_TOKEN_COOKIE))
        .ok_or_else(|| AppError::BadRequest("Refresh token is required".to_string()))?;

    let (response, identity) = match state.accounts().refresh(&refresh_token).await {
        Ok(refreshed) => refreshed,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
                ip_address: extract_ip_address(&headers),
                user_agent: extract_user_agent(&headers),
            });
            return Err(e);
        }
    };

    audit_log(&AuditEvent::TokenRefresh {
        user_name: identity.user_name,
        email: identity.email,
        ip_address: extract_ip_address(&headers),
    });

    let cookie = cookie_header(ACCESS_TOKEN_COOKIE, &response.access_token, state.tokens.access_ttl())?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        ApiResponse::ok(response, "Access token refreshed successfully"),
    ))
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/user/profile",
    tag = "user",
    responses(
        (status = 200, description = "User profile fetched successfully", body = regauth_core::UserProfile),
        (status = 401, description = "Missing, invalid or expired access token", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.accounts().profile(&user).await?;
    Ok(ApiResponse::ok(profile, "User profile fetched successfully"))
}
