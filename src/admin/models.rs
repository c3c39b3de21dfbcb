// src/admin/models.rs

use serde::Deserialize;

/// Body of POST /admin/make and DELETE /admin/remove
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}
