//! Identity provider seam: token verification and role claim assignment

use async_trait::async_trait;
use thiserror::Error;

use super::models::{IdentityUser, Role, VerifiedToken};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("no account registered for {0}")]
    UserNotFound(String),

    #[error("identity provider request failed: {0}")]
    RequestFailed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// External identity provider.
///
/// Credential checks and token issuance happen on the provider; this service
/// only verifies tokens and writes the `role` custom claim back.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify signature, audience, issuer and expiry of an ID token.
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedToken, IdentityError>;

    /// Replace the account's custom claims with `{"role": role}`.
    ///
    /// Visible in tokens issued after the call, not in tokens already held
    /// by the client.
    async fn set_role(&self, uid: &str, role: Role) -> Result<(), IdentityError>;

    async fn get_user_by_email(&self, email: &str) -> Result<IdentityUser, IdentityError>;
}
