use crate::utils::validate_message_content;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(
        length(max = 10000, message = "Message must be at most 10000 characters"),
        custom(function = "validate_message_content")
    )]
    pub message: String,

    /// Passed to the resolver as-is; unknown names are replaced there.
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub response: String,
    /// Model that produced the answer; may differ from the requested one.
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}
