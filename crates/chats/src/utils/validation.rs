//! Validation utilities.

use async_trait::async_trait;

use crate::ports::ContentValidator;
use crate::types::{ChatResult, ContentError};

/// Validation utilities
pub struct Validator;

impl Validator {
    /// Validate message content: non-blank and at most `max_length` characters
    pub fn message_content(content: &str, max_length: usize) -> Result<(), ContentError> {
        if content.trim().is_empty() {
            return Err(ContentError::Empty);
        }

        if content.chars().count() > max_length {
            return Err(ContentError::TooLong { max_length });
        }

        Ok(())
    }
}

/// Default content validator backed by [`Validator::message_content`]
#[derive(Debug, Clone, Copy)]
pub struct LengthValidator {
    max_length: usize,
}

impl LengthValidator {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

#[async_trait]
impl ContentValidator for LengthValidator {
    async fn check_content(&self, content: &str) -> ChatResult<()> {
        Validator::message_content(content, self.max_length)?;
        Ok(())
    }
}
