pub mod validation;

pub use validation::ValidatedJson;

use validator::ValidationError;

/// `validator` hook for chat message bodies. The upper bound is a separate
/// `length` rule.
pub fn validate_message_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        let mut err = ValidationError::new("message_content");
        err.message = Some("Message must not be empty or blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_messages_are_rejected() {
        assert!(validate_message_content("Hello").is_ok());
        assert!(validate_message_content(" a ").is_ok());
        assert!(validate_message_content("").is_err());
        assert!(validate_message_content("  \n\t ").is_err());
    }

    #[test]
    fn length_is_left_to_the_length_rule() {
        assert!(validate_message_content(&"x".repeat(10_001)).is_ok());
    }
}
