//! regauth Core - credentials, tokens and the account domain model
//!
//! This crate holds everything the HTTP layer builds on:
//! - Credential Verifier (Argon2id password hashing)
//! - Token Manager (HS256 access/refresh tokens with expiry enforcement)
//! - User documents and the `UserStore` collaborator trait
//! - Configuration management
//! - Common error types

pub mod config;
pub mod credential;
pub mod store;
pub mod token;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig, StoreBackend,
};
pub use credential::{hash_password, validate_password_strength, verify_password, CredentialError};
pub use store::{MemoryUserStore, UserStore};
pub use token::{
    Claims, Clock, ManualClock, SystemClock, TokenClass, TokenError, TokenManager, TOKEN_ISSUER,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for account operations
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication denied")]
    AuthenticationDenied,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub type Result<T> = std::result::Result<T, AccountError>;

// ============================================================================
// User documents
// ============================================================================

/// A user account as persisted in the `users` collection.
///
/// `password_hash` is stored under the `password` key and only ever holds
/// the hashed form. Use [`User::to_profile`] for anything returned to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_name: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new, not yet persisted, user from an already hashed password
    pub fn new(user_name: String, email: String, password_hash: String, full_name: String) -> Self {
        Self {
            id: None,
            user_name,
            email,
            password_hash,
            full_name,
            created_at: Utc::now(),
        }
    }

    /// Public view of this account
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            user_name: self.user_name.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            created_at: self.created_at,
        }
    }
}

/// User representation safe for API responses (no credential material)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_name: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}
