//! Authentication module
//!
//! - Account service: registration, login, token refresh, profile lookup
//! - Middleware for request authentication
//! - Token cookie helpers

pub mod cookies;
pub mod middleware;
pub mod service;

pub use middleware::{auth_middleware, AuthError, AuthenticatedUser};
pub use service::{
    AccountService, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
};
