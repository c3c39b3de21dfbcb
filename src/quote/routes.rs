// src/quote/routes.rs

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::handlers;

pub fn quote_routes() -> Router {
    Router::new()
        .route("/quote", get(handlers::list_quotes))
        .route("/quote/create", post(handlers::create_quote))
        .route("/quote/update", put(handlers::update_quote))
        .route("/quote/delete/:id", delete(handlers::delete_quote))
        .route("/quote/:profile_id", get(handlers::list_user_quotes))
        // Moderation
        .route("/admin/quote/approve/:id", post(handlers::approve_quote))
        .route(
            "/admin/quote/unapproved",
            get(handlers::list_unapproved_quotes),
        )
}
