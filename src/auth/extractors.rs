//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{Role, User};
use super::roles::authorize;
use crate::common::{ApiError, AppState};

/// Authenticated user extractor
///
/// Runs the session resolver on the `Authorization` header: token
/// verification (through the token cache), role repair on the identity
/// provider, and construction of the typed session [`User`].
#[derive(Debug, Clone)]
pub struct AuthedUser(pub User);

impl Deref for AuthedUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract the Extension containing the AppState
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let sessions = state_lock.read().await.sessions.clone();

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        sessions.resolve(header).await.map(AuthedUser)
    }
}

/// Authenticated user that also passed the admin role gate
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl Deref for AdminUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthedUser(user) = AuthedUser::from_request_parts(parts, state).await?;
        authorize(&user, Role::Admin)?;
        Ok(AdminUser(user))
    }
}
