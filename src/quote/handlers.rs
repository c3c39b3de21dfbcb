// src/quote/handlers.rs

use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{CreateQuoteRequest, UpdateQuoteRequest};
use super::store::QuoteStore;
use super::validators::QuoteValidator;
use crate::auth::{ensure_owner_or_admin, AdminUser, AuthedUser};
use crate::common::{ApiError, AppState, StoreError, Validator};

async fn quote_store(state_lock: &Arc<RwLock<AppState>>) -> QuoteStore {
    QuoteStore::new(state_lock.read().await.db.clone())
}

fn log_store_error(e: StoreError, action: &str, user_id: &str) -> ApiError {
    match &e {
        StoreError::NotFound(_) => warn!(user_id = %user_id, "{}: quote not found", action),
        StoreError::AlreadyExists(_) | StoreError::Database(_) => {
            error!(error = %e, user_id = %user_id, "{}: storage failure", action)
        }
    }
    e.into()
}

// ============================================================================
// User Endpoints
// ============================================================================

/// POST /quote/create - Submit a quote; it stays hidden until approved
pub async fn create_quote(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    payload: Result<Json<CreateQuoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(request) = payload?;
    QuoteValidator.validate(&request).into_result()?;

    let quote = quote_store(&state_lock)
        .await
        .create(&authed.id, request.quote.trim())
        .await
        .map_err(|e| log_store_error(e, "create_quote", &authed.id))?;

    info!(user_id = %authed.id, quote_id = %quote.id, "Quote created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Quote created successfully",
            "quote": quote,
        })),
    ))
}

/// PUT /quote/update - Edit a quote (owner or admin); approval is reset
pub async fn update_quote(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    payload: Result<Json<UpdateQuoteRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    QuoteValidator.validate(&request).into_result()?;

    let store = quote_store(&state_lock).await;
    let existing = store
        .get(&request.id)
        .await
        .map_err(|e| log_store_error(e, "update_quote", &authed.id))?;

    ensure_owner_or_admin(&authed, &existing.user_id)?;

    let quote = store
        .update_text(&existing.id, request.quote.trim())
        .await
        .map_err(|e| log_store_error(e, "update_quote", &authed.id))?;

    info!(user_id = %authed.id, quote_id = %quote.id, "Quote updated, awaiting approval");

    Ok(Json(json!({
        "message": "Quote updated successfully",
        "quote": quote,
    })))
}

/// DELETE /quote/delete/:id - Delete a quote (owner or admin)
pub async fn delete_quote(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let store = quote_store(&state_lock).await;
    let existing = store
        .get(&id)
        .await
        .map_err(|e| log_store_error(e, "delete_quote", &authed.id))?;

    ensure_owner_or_admin(&authed, &existing.user_id)?;

    store
        .delete(&existing.id)
        .await
        .map_err(|e| log_store_error(e, "delete_quote", &authed.id))?;

    info!(user_id = %authed.id, quote_id = %id, "Quote deleted");

    Ok(Json(json!({ "message": "Quote deleted successfully" })))
}

/// GET /quote - Admins see every quote, everyone else approved quotes only
pub async fn list_quotes(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    let store = quote_store(&state_lock).await;
    let result = if authed.is_admin() {
        store.list_all().await
    } else {
        store.list_approved().await
    };
    let quotes = result.map_err(|e| log_store_error(e, "list_quotes", &authed.id))?;

    Ok(Json(json!({ "quotes": quotes })))
}

/// GET /quote/:profile_id - Quotes of one user
///
/// The owner and admins see all of that user's quotes, others only the
/// approved ones.
pub async fn list_user_quotes(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(profile_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let approved_only = !(authed.is_admin() || authed.id == profile_id);

    let quotes = quote_store(&state_lock)
        .await
        .list_by_user(&profile_id, approved_only)
        .await
        .map_err(|e| log_store_error(e, "list_user_quotes", &authed.id))?;

    Ok(Json(json!({ "quotes": quotes })))
}

// ============================================================================
// Admin Endpoints
// ============================================================================

/// POST /admin/quote/approve/:id
pub async fn approve_quote(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    quote_store(&state_lock)
        .await
        .approve(&id)
        .await
        .map_err(|e| log_store_error(e, "approve_quote", &admin.id))?;

    info!(admin_id = %admin.id, quote_id = %id, "Quote approved");

    Ok(Json(json!({ "message": "Quote approved successfully" })))
}

/// GET /admin/quote/unapproved - Moderation queue
pub async fn list_unapproved_quotes(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let quotes = quote_store(&state_lock)
        .await
        .list_unapproved()
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => {
                ApiError::NotFound("No unapproved quotes found".to_string())
            }
            other => log_store_error(other, "list_unapproved_quotes", &admin.id),
        })?;

    Ok(Json(json!({ "quotes": quotes })))
}
