//! Request and response bodies of the HTTP API.

pub mod chat;
pub mod health;

pub use chat::{ChatRequest, ChatResponse, ModelsResponse};
pub use health::{HealthStatus, ModelsHealthReport, PingResponse, RootResponse};
