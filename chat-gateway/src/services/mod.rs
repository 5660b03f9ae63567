pub mod backend;
pub mod chat;
pub mod error;
pub mod metrics;
pub mod reporting;
pub mod resolver;

pub use backend::{InferenceBackend, MockBackend, OllamaClient};
pub use chat::ChatService;
pub use error::{ChatError, ChatErrorKind};
pub use reporting::Reporter;
pub use resolver::ModelResolver;
