// src/quote/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Quote Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Quote {
    pub id: String,
    pub user_id: String,
    pub quote: String,
    pub approved: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub quote: String,
}

/// Editing replaces the text and sends the quote back to moderation
#[derive(Debug, Deserialize)]
pub struct UpdateQuoteRequest {
    pub id: String,
    pub quote: String,
}
