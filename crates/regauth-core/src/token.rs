//! Access and refresh token issuance and validation
//!
//! Tokens are standard HS256 JWTs (base64url `header.payload.signature`), so
//! any conforming library holding the same secret can read them. Two classes
//! exist: access tokens live for one hour, refresh tokens for seven days.
//!
//! A token moves from Issued to Valid to Expired purely by wall-clock
//! comparison against its `exp` claim; the server keeps no token state.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Issuer written into every token
pub const TOKEN_ISSUER: &str = "Register";

/// Access token lifetime in seconds (1 hour)
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Refresh token lifetime in seconds (7 days)
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Token class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }

    /// Fixed lifetime for this class
    pub fn ttl(&self) -> Duration {
        match self {
            TokenClass::Access => Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            TokenClass::Refresh => Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity claims embedded in a token
///
/// `iat` and `token_type` are optional on input so tokens minted by other
/// issuers sharing the secret (which only carry `userName`, `email`, `iss`
/// and `exp`) still decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userName")]
    pub username: String,
    pub email: String,
    pub iss: String,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,
    /// Issued at timestamp (Unix epoch seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenClass>,
}

impl Claims {
    /// Expiry as a UTC instant
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Token issuance and validation errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Signing secret is not configured")]
    Config,

    #[error("Failed to encode token: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token has expired")]
    Expired,

    #[error("Expected {expected} token, got {actual} token")]
    WrongClass {
        expected: TokenClass,
        actual: TokenClass,
    },
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Handy for exercising expiry without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.millis
            .store(instant.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

struct SigningKeys {
    configured: bool,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and validates signed, time-bounded tokens
///
/// Cheap to clone; the signing keys are built once and shared read-only.
#[derive(Clone)]
pub struct TokenManager {
    keys: Arc<SigningKeys>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("configured", &self.keys.configured)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a token manager using the system clock
    ///
    /// An empty secret is accepted here and reported by every issue call;
    /// use [`TokenManager::try_new`] at startup to refuse it up front.
    pub fn new(secret: &str) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    /// Create a token manager with an explicit time source
    pub fn with_clock(secret: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys: Arc::new(SigningKeys {
                configured: !secret.is_empty(),
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            clock,
        }
    }

    /// Startup validation: fails with [`TokenError::Config`] on an empty secret
    pub fn try_new(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Config);
        }
        Ok(Self::new(secret))
    }

    pub fn is_configured(&self) -> bool {
        self.keys.configured
    }

    pub fn access_ttl(&self) -> Duration {
        TokenClass::Access.ttl()
    }

    pub fn refresh_ttl(&self) -> Duration {
        TokenClass::Refresh.ttl()
    }

    /// Issue a one-hour access token
    pub fn issue_access(&self, username: &str, email: &str) -> Result<String, TokenError> {
        self.issue(TokenClass::Access, username, email)
    }

    /// Issue a seven-day refresh token
    pub fn issue_refresh(&self, username: &str, email: &str) -> Result<String, TokenError> {
        self.issue(TokenClass::Refresh, username, email)
    }

    /// Issue a token of the given class
    pub fn issue(
        &self,
        class: TokenClass,
        username: &str,
        email: &str,
    ) -> Result<String, TokenError> {
        if !self.keys.configured {
            return Err(TokenError::Config);
        }

        let now = self.clock.now();
        let claims = Claims {
            username: username.to_string(),
            email: email.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            exp: (now + class.ttl()).timestamp(),
            iat: Some(now.timestamp()),
            token_type: Some(class),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)?;
        Ok(token)
    }

    /// Validate a token and extract its claims
    ///
    /// Checks run in order: signature and structure, then expiry
    /// (`exp <= now` is expired), then the class tag when one is present.
    pub fn validate(&self, token: &str, expected: TokenClass) -> Result<Claims, TokenError> {
        if !self.keys.configured {
            return Err(TokenError::Config);
        }

        // Expiry is checked below against the injected clock, with no leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[TOKEN_ISSUER]);

        let claims = decode::<Claims>(token, &self.keys.decoding, &validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?
            .claims;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }

        match claims.token_type {
            Some(actual) if actual != expected => Err(TokenError::WrongClass { expected, actual }),
            _ => Ok(claims),
        }
    }
}
