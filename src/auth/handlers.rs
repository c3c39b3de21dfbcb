//! Authentication handlers

use axum::extract::Json;
use serde_json::{json, Value};

use super::extractors::AuthedUser;

/// GET /profile
/// Returns the session user resolved from the caller's ID token
///
/// # Response
/// ```json
/// {
///   "user": { "user_id": "...", "email": "...", "role": "user" }
/// }
/// ```
pub async fn session_user_handler(authed: AuthedUser) -> Json<Value> {
    Json(json!({ "user": authed.0 }))
}
