// src/admin/handlers.rs

use axum::extract::{rejection::JsonRejection, Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::EmailRequest;
use super::validators::EmailRequestValidator;
use crate::auth::{AdminUser, IdentityError, Role};
use crate::common::{safe_email_log, ApiError, AppState, Validator};

/// POST /admin - Admin access probe
pub async fn welcome(_admin: AdminUser) -> Json<Value> {
    Json(json!({ "message": "welcome admin" }))
}

/// POST /admin/make - Grant the admin role to the account registered for `email`
pub async fn make_admin(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let email = assign_role(&state_lock, &admin, request, Role::Admin).await?;

    Ok(Json(json!({
        "message": format!("User {} is now an admin", email),
    })))
}

/// DELETE /admin/remove - Reset the account registered for `email` to the user role
pub async fn remove_admin(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let email = assign_role(&state_lock, &admin, request, Role::User).await?;

    Ok(Json(json!({
        "message": format!("User {} admin rights have been revoked", email),
    })))
}

/// Look up the account by email and write `role` to its custom claims.
///
/// Takes effect on the next ID token the account obtains.
async fn assign_role(
    state_lock: &Arc<RwLock<AppState>>,
    admin: &AdminUser,
    request: EmailRequest,
    role: Role,
) -> Result<String, ApiError> {
    EmailRequestValidator.validate(&request).into_result()?;
    let email = request.email.trim().to_string();

    let identity = state_lock.read().await.identity.clone();

    let account = identity.get_user_by_email(&email).await.map_err(|e| match e {
        IdentityError::UserNotFound(_) => {
            warn!(email = %safe_email_log(&email), "No account registered for email");
            ApiError::NotFound("User not found".to_string())
        }
        other => {
            error!(error = %other, email = %safe_email_log(&email), "Failed to look up account");
            ApiError::InternalServer("Failed to look up user".to_string())
        }
    })?;

    identity.set_role(&account.uid, role).await.map_err(|e| {
        error!(error = %e, uid = %account.uid, role = %role, "Failed to assign role");
        ApiError::InternalServer("Failed to update user role".to_string())
    })?;

    info!(
        admin_id = %admin.id,
        uid = %account.uid,
        email = %safe_email_log(&email),
        role = %role,
        "Role assigned"
    );

    Ok(email)
}
