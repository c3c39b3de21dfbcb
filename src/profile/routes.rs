// src/profile/routes.rs

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::handlers;

pub fn profile_routes() -> Router {
    Router::new()
        .route("/profile/create", post(handlers::create_profile))
        .route("/profile/update", put(handlers::update_profile))
        .route("/profile/delete/:id", delete(handlers::delete_profile))
        .route("/profile/:id", get(handlers::get_profile))
        // Admin listing
        .route("/admin/profiles", get(handlers::list_profiles))
}
