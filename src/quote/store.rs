// src/quote/store.rs
//! Quote persistence

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::Quote;
use crate::common::StoreError;

const ENTITY: &str = "Quote";

#[derive(Debug, Clone)]
pub struct QuoteStore {
    db: SqlitePool,
}

impl QuoteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// New quotes always start unapproved
    pub async fn create(&self, user_id: &str, text: &str) -> Result<Quote, StoreError> {
        let quote = Quote {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quote: text.to_string(),
            approved: false,
            created_at: Utc::now().to_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO quotes (id, user_id, quote, approved, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&quote.id)
        .bind(&quote.user_id)
        .bind(&quote.quote)
        .bind(quote.approved)
        .bind(&quote.created_at)
        .execute(&self.db)
        .await?;

        Ok(quote)
    }

    pub async fn get(&self, id: &str) -> Result<Quote, StoreError> {
        sqlx::query_as::<_, Quote>("SELECT * FROM quotes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound(ENTITY))
    }

    /// Replace the text; approval is reset unconditionally
    pub async fn update_text(&self, id: &str, text: &str) -> Result<Quote, StoreError> {
        let result = sqlx::query("UPDATE quotes SET quote = ?, approved = 0 WHERE id = ?")
            .bind(text)
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(ENTITY));
        }

        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM quotes WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(ENTITY));
        }
        Ok(())
    }

    /// One-way flip to approved
    pub async fn approve(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE quotes SET approved = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(ENTITY));
        }
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<Quote>, StoreError> {
        let quotes = sqlx::query_as::<_, Quote>("SELECT * FROM quotes ORDER BY created_at ASC")
            .fetch_all(&self.db)
            .await?;
        non_empty(quotes)
    }

    pub async fn list_approved(&self) -> Result<Vec<Quote>, StoreError> {
        self.list_by_approval(true).await
    }

    pub async fn list_unapproved(&self) -> Result<Vec<Quote>, StoreError> {
        self.list_by_approval(false).await
    }

    async fn list_by_approval(&self, approved: bool) -> Result<Vec<Quote>, StoreError> {
        let quotes = sqlx::query_as::<_, Quote>(
            "SELECT * FROM quotes WHERE approved = ? ORDER BY created_at ASC",
        )
        .bind(approved)
        .fetch_all(&self.db)
        .await?;
        non_empty(quotes)
    }

    /// Quotes owned by `user_id`; an empty list is not an error here
    pub async fn list_by_user(
        &self,
        user_id: &str,
        approved_only: bool,
    ) -> Result<Vec<Quote>, StoreError> {
        let sql = if approved_only {
            "SELECT * FROM quotes WHERE user_id = ? AND approved = 1 ORDER BY created_at ASC"
        } else {
            "SELECT * FROM quotes WHERE user_id = ? ORDER BY created_at ASC"
        };

        let quotes = sqlx::query_as::<_, Quote>(sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(quotes)
    }
}

fn non_empty(quotes: Vec<Quote>) -> Result<Vec<Quote>, StoreError> {
    if quotes.is_empty() {
        Err(StoreError::NotFound(ENTITY))
    } else {
        Ok(quotes)
    }
}
