//! Account service layer
//!
//! Business logic for registration, login, token refresh and profile lookup.
//! Combines the injected user store with the credential verifier and the
//! token manager; Argon2 work runs on the blocking pool.

use super::middleware::AuthenticatedUser;
use crate::blocking::run_blocking;
use crate::error::AppError;
use regauth_core::{
    hash_password, validate_password_strength, verify_password, AccountError, TokenClass,
    TokenError, TokenManager, User, UserProfile, UserStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// User registration request
#[derive(Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

/// Login request; either `userName` or `email` identifies the account
#[derive(Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Token refresh request
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Tokens and identity returned by a successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
}

/// New access token returned by a refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Account service
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    tokens: TokenManager,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenManager) -> Self {
        Self { store, tokens }
    }

    /// Register a new user
    ///
    /// # Returns
    ///
    /// * `Ok(UserProfile)` - Newly created user, without credential material
    /// * `Err(AppError)` - Missing fields, invalid input or an existing
    ///   username/email (400), hashing or store failure (500)
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, AppError> {
        let user_name = request.user_name.trim().to_string();
        let email = request.email.trim().to_string();
        let full_name = request.full_name.trim().to_string();

        if user_name.is_empty() || email.is_empty() || request.password.is_empty() || full_name.is_empty()
        {
            return Err(AppError::BadRequest("All fields are required".to_string()));
        }

        validate_email(&email)?;

        if user_name.chars().count() < 3 {
            return Err(AppError::BadRequest(
                "Username must be at least 3 characters".to_string(),
            ));
        }

        validate_password_strength(&request.password).map_err(AppError::BadRequest)?;

        if self
            .store
            .find_by_username_or_email(&user_name, &email)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(
                "User with this email or username already exists".to_string(),
            ));
        }

        let password = request.password;
        let password_hash = run_blocking(move || hash_password(&password)).await??;

        let user = self
            .store
            .insert(User::new(user_name, email, password_hash, full_name))
            .await?;

        Ok(user.to_profile())
    }

    /// Login with username or email and password
    ///
    /// # Returns
    ///
    /// * `Ok(LoginResponse)` - Access token, refresh token and identity
    /// * `Err(AppError)` - Missing fields (400), unknown user (404), wrong
    ///   password (401)
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        let user_name = request.user_name.trim();
        let email = request.email.trim();

        if (user_name.is_empty() && email.is_empty()) || request.password.is_empty() {
            return Err(AppError::BadRequest("All fields are required".to_string()));
        }

        let user = self
            .store
            .find_by_username_or_email(user_name, email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let password = request.password;
        let password_hash = user.password_hash.clone();
        let verified = run_blocking(move || verify_password(&password, &password_hash)).await?;

        // A malformed stored hash and a mismatch are both a denial
        if !matches!(verified, Ok(true)) {
            return Err(AccountError::AuthenticationDenied.into());
        }

        let access_token = self.tokens.issue_access(&user.user_name, &user.email)?;
        let refresh_token = self.tokens.issue_refresh(&user.user_name, &user.email)?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.access_ttl().num_seconds(),
            user_name: user.user_name,
            email: user.email,
            full_name: user.full_name,
        })
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The refresh token itself is not rotated; it stays usable until it expires.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(RefreshResponse, AuthenticatedUser), AppError> {
        let claims = self
            .tokens
            .validate(refresh_token, TokenClass::Refresh)
            .map_err(|e| match e {
                TokenError::Expired => AppError::TokenExpired("Refresh token expired".to_string()),
                TokenError::Malformed(_) | TokenError::WrongClass { .. } => {
                    AppError::Unauthorized("Invalid refresh token".to_string())
                }
                other => other.into(),
            })?;

        let access_token = self.tokens.issue_access(&claims.username, &claims.email)?;

        Ok((
            RefreshResponse {
                access_token,
                token_type: "Bearer".to_string(),
                expires_in: self.tokens.access_ttl().num_seconds(),
            },
            AuthenticatedUser::from(claims),
        ))
    }

    /// Profile of the authenticated user
    pub async fn profile(&self, identity: &AuthenticatedUser) -> Result<UserProfile, AppError> {
        let user = self
            .store
            .find_by_username_or_email(&identity.user_name, &identity.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user.to_profile())
    }
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::BadRequest("Invalid email format".to_string());

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regauth_core::MemoryUserStore;

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(MemoryUserStore::new()),
            TokenManager::new("service-test-secret"),
        )
    }

    fn register_request(user_name: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            user_name: user_name.to_string(),
            email: email.to_string(),
            password: "SecureP4ssword".to_string(),
            full_name: "John Doe".to_string(),
        }
    }

    fn login_request(user_name: &str, email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            user_name: user_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jdoe@example.com").is_ok());
        assert!(validate_email("j.doe+tag@mail.example.org").is_ok());

        for bad in ["jdoe", "@example.com", "jdoe@", "jdoe@example", "j doe@example.com", "a@b@c.com"] {
            assert!(validate_email(bad).is_err(), "accepted {bad}");
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let service = service();

        let profile = service
            .register(register_request("jdoe", "jdoe@example.com"))
            .await
            .unwrap();
        assert_eq!(profile.user_name, "jdoe");
        assert!(profile.id.is_some());

        let response = service
            .login(login_request("", "jdoe@example.com", "SecureP4ssword"))
            .await
            .unwrap();
        assert_eq!(response.user_name, "jdoe");
        assert_eq!(response.full_name, "John Doe");
        assert_eq!(response.expires_in, 3600);
        assert_ne!(response.access_token, response.refresh_token);
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let service = service();
        let mut request = register_request("jdoe", "jdoe@example.com");
        request.full_name = "   ".to_string();

        let result = service.register(request).await;
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg == "All fields are required"));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let service = service();
        let mut request = register_request("jdoe", "jdoe@example.com");
        request.password = "weak".to_string();

        assert!(matches!(
            service.register(request).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let service = service();
        service
            .register(register_request("jdoe", "jdoe@example.com"))
            .await
            .unwrap();

        let result = service
            .register(register_request("jdoe", "someone@example.com"))
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg.contains("already exists")));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = service();
        service
            .register(register_request("jdoe", "jdoe@example.com"))
            .await
            .unwrap();

        let result = service
            .login(login_request("jdoe", "", "WrongP4ssword"))
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let result = service()
            .login(login_request("ghost", "", "SecureP4ssword"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_login_with_corrupt_stored_hash_is_denied() {
        let store = Arc::new(MemoryUserStore::new());
        store
            .insert(User::new(
                "jdoe".to_string(),
                "jdoe@example.com".to_string(),
                "not-a-phc-string".to_string(),
                "John Doe".to_string(),
            ))
            .await
            .unwrap();
        let service = AccountService::new(store, TokenManager::new("service-test-secret"));

        let result = service
            .login(login_request("jdoe", "", "SecureP4ssword"))
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_refresh_issues_access_token() {
        let service = service();
        service
            .register(register_request("jdoe", "jdoe@example.com"))
            .await
            .unwrap();
        let login = service
            .login(login_request("jdoe", "", "SecureP4ssword"))
            .await
            .unwrap();

        let (refreshed, identity) = service.refresh(&login.refresh_token).await.unwrap();
        assert_eq!(identity.user_name, "jdoe");

        let profile = service.profile(&identity).await.unwrap();
        assert_eq!(profile.email, "jdoe@example.com");
        assert!(!refreshed.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let service = service();
        let tokens = TokenManager::new("service-test-secret");
        let access = tokens.issue_access("jdoe", "jdoe@example.com").unwrap();

        let result = service.refresh(&access).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
