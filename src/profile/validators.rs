// src/profile/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

// ============================================================================
// Profile Validators
// ============================================================================

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const BIO_MAX_LEN: usize = 500;

pub struct ProfileUpdateValidator;

impl Validator<UpdateProfileRequest> for ProfileUpdateValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.bio.is_none() && data.username.is_none() {
            result.add_error("general", "At least one field must be provided for update");
            return result;
        }

        if let Some(username) = &data.username {
            let len = username.chars().count();
            if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
                result.add_error("username", "Username must be between 3 and 30 characters");
            } else if !is_valid_username(username) {
                result.add_error(
                    "username",
                    "Username may only contain letters, digits, '_', '.' and '-'",
                );
            }
        }

        if let Some(bio) = &data.bio {
            if bio.chars().count() > BIO_MAX_LEN {
                result.add_error("bio", "Bio must be less than 500 characters");
            }
        }

        result
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
