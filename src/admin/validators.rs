// src/admin/validators.rs

use super::models::EmailRequest;
use crate::common::validation::is_valid_email;
use crate::common::{ValidationResult, Validator};

pub struct EmailRequestValidator;

impl Validator<EmailRequest> for EmailRequestValidator {
    fn validate(&self, data: &EmailRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.email.trim().is_empty() {
            result.add_error("email", "Email is required");
        } else if !is_valid_email(data.email.trim()) {
            result.add_error("email", "Invalid email format");
        }

        result
    }
}
