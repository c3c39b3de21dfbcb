// src/profile/handlers.rs

use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::UpdateProfileRequest;
use super::store::ProfileStore;
use super::validators::ProfileUpdateValidator;
use crate::auth::{ensure_owner_or_admin, AdminUser, AuthedUser};
use crate::common::helpers::generate_username;
use crate::common::{safe_email_log, ApiError, AppState, StoreError, Validator};

/// POST /profile/create - Create the caller's profile
pub async fn create_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let state = state_lock.read().await.clone();
    let store = ProfileStore::new(state.db);

    if store.find_by_user_id(&authed.id).await?.is_some() {
        warn!(user_id = %authed.id, "Profile already exists");
        return Err(ApiError::AlreadyExists("Profile already exists".to_string()));
    }

    let username = generate_username(&authed.email);
    let profile = store
        .create(&authed.id, &authed.email, &username)
        .await
        .map_err(|e| match e {
            StoreError::AlreadyExists(_) => {
                warn!(user_id = %authed.id, "Profile created concurrently");
                ApiError::AlreadyExists("Profile already exists".to_string())
            }
            other => {
                error!(error = %other, user_id = %authed.id, "Failed to create profile");
                other.into()
            }
        })?;

    info!(
        user_id = %authed.id,
        email = %safe_email_log(&authed.email),
        "Profile created successfully"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Profile created successfully",
            "profile": profile,
        })),
    ))
}

/// PUT /profile/update - Update bio and/or username of the caller's profile
pub async fn update_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    ProfileUpdateValidator.validate(&request).into_result()?;

    let state = state_lock.read().await.clone();
    let store = ProfileStore::new(state.db);

    let profile = store
        .update(&authed.id, request.username.as_deref(), request.bio.as_deref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %authed.id, "Failed to update profile");
            ApiError::from(e)
        })?;

    info!(user_id = %authed.id, "Profile updated successfully");

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "profile": profile,
    })))
}

/// DELETE /profile/delete/:id - Delete a profile (owner or admin)
pub async fn delete_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ensure_owner_or_admin(&authed, &user_id)?;

    let state = state_lock.read().await.clone();
    ProfileStore::new(state.db)
        .delete_by_user_id(&user_id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "Failed to delete profile");
            ApiError::from(e)
        })?;

    info!(user_id = %user_id, deleted_by = %authed.id, "Profile deleted successfully");

    Ok(Json(json!({ "message": "Profile deleted successfully" })))
}

/// GET /profile/:id - Fetch a profile by its owner's user id
pub async fn get_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _authed: AuthedUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let profile = ProfileStore::new(state.db)
        .get_by_user_id(&user_id)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user_id, "Failed to retrieve profile");
            ApiError::from(e)
        })?;

    Ok(Json(json!({ "profile": profile })))
}

/// GET /admin/profiles - List every profile
pub async fn list_profiles(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let profiles = ProfileStore::new(state.db)
        .list_all()
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => ApiError::NotFound("No profiles found".to_string()),
            other => {
                error!(error = %other, "Failed to retrieve profiles");
                other.into()
            }
        })?;

    Ok(Json(json!({ "profiles": profiles })))
}
