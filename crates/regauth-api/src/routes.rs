//! API route definitions

use crate::auth::auth_middleware;
use crate::handlers::user;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Routes nested under `/api/user`
pub fn user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/register", post(user::register_handler))
        .route("/login", post(user::login_handler))
        .route("/refresh-token", post(user::refresh_handler));

    // Protected routes (valid access token required)
    let protected_routes = Router::new()
        .route("/profile", get(user::profile_handler))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
