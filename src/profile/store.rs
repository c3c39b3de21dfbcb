// src/profile/store.rs
//! Profile persistence

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::Profile;
use crate::common::StoreError;

const ENTITY: &str = "Profile";

#[derive(Debug, Clone)]
pub struct ProfileStore {
    db: SqlitePool,
}

impl ProfileStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a profile for `user_id`.
    ///
    /// A unique-constraint violation on `user_id` or `email` is reported as
    /// `AlreadyExists`, so concurrent creations for the same account cannot
    /// produce a second row.
    pub async fn create(
        &self,
        user_id: &str,
        email: &str,
        username: &str,
    ) -> Result<Profile, StoreError> {
        let now = Utc::now().to_rfc3339();
        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            bio: String::new(),
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO profiles (id, user_id, email, username, bio, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.user_id)
        .bind(&profile.email)
        .bind(&profile.username)
        .bind(&profile.bio)
        .bind(&profile.created_at)
        .bind(&profile.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::AlreadyExists(ENTITY)
            }
            other => StoreError::Database(other),
        })?;

        Ok(profile)
    }

    pub async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(profile)
    }

    pub async fn get_by_user_id(&self, user_id: &str) -> Result<Profile, StoreError> {
        self.find_by_user_id(user_id)
            .await?
            .ok_or(StoreError::NotFound(ENTITY))
    }

    /// Update bio and/or username; `None` keeps the stored value
    pub async fn update(
        &self,
        user_id: &str,
        username: Option<&str>,
        bio: Option<&str>,
    ) -> Result<Profile, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles SET
                username = COALESCE(?, username),
                bio = COALESCE(?, bio),
                updated_at = ?
            WHERE user_id = ?
            "#,
        )
        .bind(username)
        .bind(bio)
        .bind(Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(ENTITY));
        }

        self.get_by_user_id(user_id).await
    }

    pub async fn delete_by_user_id(&self, user_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(ENTITY));
        }
        Ok(())
    }

    /// All profiles, oldest first; an empty table is `NotFound`
    pub async fn list_all(&self) -> Result<Vec<Profile>, StoreError> {
        let profiles =
            sqlx::query_as::<_, Profile>("SELECT * FROM profiles ORDER BY created_at ASC")
                .fetch_all(&self.db)
                .await?;

        if profiles.is_empty() {
            return Err(StoreError::NotFound(ENTITY));
        }
        Ok(profiles)
    }
}
