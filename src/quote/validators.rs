// src/quote/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

pub const QUOTE_MAX_LEN: usize = 1000;

pub struct QuoteValidator;

impl Validator<CreateQuoteRequest> for QuoteValidator {
    fn validate(&self, data: &CreateQuoteRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        validate_text(&data.quote, &mut result);
        result
    }
}

impl Validator<UpdateQuoteRequest> for QuoteValidator {
    fn validate(&self, data: &UpdateQuoteRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.id.trim().is_empty() {
            result.add_error("id", "Quote id is required");
        }
        validate_text(&data.quote, &mut result);

        result
    }
}

fn validate_text(quote: &str, result: &mut ValidationResult) {
    if quote.trim().is_empty() {
        result.add_error("quote", "Quote text is required");
    } else if quote.chars().count() > QUOTE_MAX_LEN {
        result.add_error("quote", "Quote must be less than 1000 characters");
    }
}
