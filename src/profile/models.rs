// src/profile/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Profile Models
// ============================================================================

/// One profile per identity-provider account, keyed by `user_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub bio: String,
    pub created_at: String,
    pub updated_at: String,
}

/// PUT /profile/update body; only bio and username are editable
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub username: Option<String>,
}
