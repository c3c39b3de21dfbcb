//! Authentication routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /profile` - Current session user (id, email, role)
pub fn auth_routes() -> Router {
    Router::new().route("/profile", get(handlers::session_user_handler))
}
