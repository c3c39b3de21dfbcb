//! Turns an `Authorization` header into a role-carrying session user

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::cache::TokenCache;
use super::identity::IdentityProvider;
use super::models::{Role, User, VerifiedToken};
use crate::common::{safe_email_log, ApiError};

const INVALID_TOKEN: &str = "Unauthorized, Invalid Token";

pub struct SessionResolver {
    identity: Arc<dyn IdentityProvider>,
    cache: Arc<TokenCache>,
    admin_email: String,
}

impl SessionResolver {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        cache: Arc<TokenCache>,
        admin_email: &str,
    ) -> Self {
        Self {
            identity,
            cache,
            admin_email: admin_email.trim().to_lowercase(),
        }
    }

    /// Resolve the raw header value into a [`User`].
    ///
    /// Missing or malformed headers are rejected before the cache or the
    /// identity provider is touched.
    pub async fn resolve(&self, authorization: Option<&str>) -> Result<User, ApiError> {
        let started = Instant::now();

        let token = bearer_token(authorization)?;

        let verified = self
            .cache
            .get_or_verify(token, self.identity.as_ref())
            .await
            .map_err(|e| {
                warn!(error = %e, "Error verifying token");
                ApiError::Unauthorized(INVALID_TOKEN.to_string())
            })?;

        let email = match verified.email() {
            Some(email) => email.to_string(),
            None => {
                warn!(user_id = %verified.uid, "Email claim not found in token");
                return Err(ApiError::Unauthorized(INVALID_TOKEN.to_string()));
            }
        };

        let role = self.repair_role(token, &verified, &email).await?;

        debug!(
            user_id = %verified.uid,
            email = %safe_email_log(&email),
            role = %role,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Session resolved"
        );

        Ok(User {
            id: verified.uid,
            email,
            role,
        })
    }

    /// Make sure the account carries a role on the identity provider.
    ///
    /// The configured admin address is promoted when its role is absent or
    /// `user`; any other account without a role is assigned `user`. Other
    /// role values are never overwritten. At most one assignment call is
    /// made, and its failure fails the request.
    async fn repair_role(
        &self,
        token: &str,
        verified: &VerifiedToken,
        email: &str,
    ) -> Result<Role, ApiError> {
        let claim = verified.role_claim();

        let assign = match claim {
            None | Some("user") if self.is_admin_email(email) => Role::Admin,
            None => Role::User,
            Some(raw) => {
                return Ok(Role::from_claim(raw).unwrap_or_else(|| {
                    // Left as is on the provider; grants no admin access here
                    warn!(user_id = %verified.uid, role = %raw, "Unrecognized role claim");
                    Role::User
                }));
            }
        };

        self.identity
            .set_role(&verified.uid, assign)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    user_id = %verified.uid,
                    role = %assign,
                    "Error assigning role claim"
                );
                ApiError::InternalServer("Something wrong happened".to_string())
            })?;

        self.cache.record_role(token, assign).await;

        info!(
            user_id = %verified.uid,
            email = %safe_email_log(email),
            role = %assign,
            "Role claim assigned"
        );

        Ok(assign)
    }

    fn is_admin_email(&self, email: &str) -> bool {
        !self.admin_email.is_empty() && email.trim().to_lowercase() == self.admin_email
    }
}

/// Extract `<token>` from `Bearer <token>`
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, ApiError> {
    let header = match authorization {
        Some(h) if !h.trim().is_empty() => h,
        _ => {
            warn!("Missing Authorization header");
            return Err(ApiError::Unauthorized(INVALID_TOKEN.to_string()));
        }
    };

    match header.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() && !token.contains(char::is_whitespace) => Ok(token),
        _ => {
            warn!("Invalid Authorization header");
            Err(ApiError::Unauthorized(INVALID_TOKEN.to_string()))
        }
    }
}
