//! Role gate and ownership rule

use tracing::warn;

use super::models::{Role, User};
use crate::common::{safe_email_log, ApiError};

/// Route-level gate: the session role must equal `required`
pub fn authorize(user: &User, required: Role) -> Result<(), ApiError> {
    if user.role == required {
        Ok(())
    } else {
        warn!(
            user_id = %user.id,
            email = %safe_email_log(&user.email),
            role = %user.role,
            required = %required,
            "Role check failed"
        );
        Err(ApiError::Forbidden("Unauthorized".to_string()))
    }
}

/// Admins may act on any resource, everyone else only on their own
pub fn ensure_owner_or_admin(user: &User, owner_id: &str) -> Result<(), ApiError> {
    if user.is_admin() || user.id == owner_id {
        Ok(())
    } else {
        warn!(
            user_id = %user.id,
            role = %user.role,
            owner_id = %owner_id,
            "Ownership check failed"
        );
        Err(ApiError::Forbidden("not authorized".to_string()))
    }
}
