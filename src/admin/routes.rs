// src/admin/routes.rs

use axum::{
    routing::{delete, post},
    Router,
};

use super::handlers;

pub fn admin_routes() -> Router {
    Router::new()
        .route("/admin", post(handlers::welcome))
        // Role management
        .route("/admin/make", post(handlers::make_admin))
        .route("/admin/remove", delete(handlers::remove_admin))
}
