use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

const DEFAULT_GENERATE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MODELS_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub app: AppConfig,
    pub ollama: OllamaConfig,
    pub models: ModelConfig,
    pub cors: CorsConfig,
    pub messages: MessageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub log_level: String,
    /// OTLP collector for span export. Unset disables export.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    /// Upper bound for a single generate call.
    pub timeout_secs: u64,
    /// Upper bound for catalog and health probes.
    pub models_timeout_secs: u64,
}

impl OllamaConfig {
    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn models_timeout(&self) -> Duration {
        Duration::from_secs(self.models_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Served when the live catalog is unreachable; the first entry replaces
    /// requested models the backend does not advertise.
    pub default_models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// Caller-facing strings for the outcomes the gateway reports.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageConfig {
    pub ollama_api: String,
    pub ollama_not_running: String,
    pub ollama_timeout: String,
    pub empty_response: String,
    pub internal: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            app: AppConfig {
                name: "Multimodal AI Chat API".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                log_level: "info".to_string(),
                otlp_endpoint: None,
            },
            ollama: OllamaConfig {
                base_url: "http://localhost:11434".to_string(),
                timeout_secs: DEFAULT_GENERATE_TIMEOUT_SECS,
                models_timeout_secs: DEFAULT_MODELS_TIMEOUT_SECS,
            },
            models: ModelConfig {
                default_models: ["llama3.2", "mistral", "codellama", "llava", "gemma"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
            cors: CorsConfig {
                allowed_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ],
            },
            messages: MessageConfig {
                ollama_api: "Error communicating with Ollama API".to_string(),
                ollama_not_running: "Ollama not running".to_string(),
                ollama_timeout: "Ollama request timeout".to_string(),
                empty_response:
                    "I apologize, but I couldn't generate a response. Please try again."
                        .to_string(),
                internal: "Internal server error".to_string(),
            },
        }
    }
}

impl GatewayConfig {
    /// Listening address from `service-core`, everything else from plain
    /// environment variables over the built-in defaults.
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let defaults = GatewayConfig::default();

        let config = GatewayConfig {
            common,
            app: AppConfig {
                name: get_env("APP_NAME", &defaults.app.name),
                version: get_env("APP_VERSION", &defaults.app.version),
                log_level: get_env("LOG_LEVEL", &defaults.app.log_level).to_lowercase(),
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            },
            ollama: OllamaConfig {
                base_url: get_env("OLLAMA_BASE_URL", &defaults.ollama.base_url)
                    .trim_end_matches('/')
                    .to_string(),
                timeout_secs: get_env_parsed("OLLAMA_TIMEOUT", defaults.ollama.timeout_secs)?,
                models_timeout_secs: get_env_parsed(
                    "OLLAMA_MODELS_TIMEOUT",
                    defaults.ollama.models_timeout_secs,
                )?,
            },
            models: ModelConfig {
                default_models: get_env_list("DEFAULT_MODELS", defaults.models.default_models),
            },
            cors: CorsConfig {
                allowed_origins: get_env_list("ALLOWED_ORIGINS", defaults.cors.allowed_origins),
            },
            messages: MessageConfig {
                ollama_api: get_env("ERROR_OLLAMA_API", &defaults.messages.ollama_api),
                ollama_not_running: get_env(
                    "ERROR_OLLAMA_NOT_RUNNING",
                    &defaults.messages.ollama_not_running,
                ),
                ollama_timeout: get_env("ERROR_OLLAMA_TIMEOUT", &defaults.messages.ollama_timeout),
                empty_response: get_env("ERROR_EMPTY_RESPONSE", &defaults.messages.empty_response),
                internal: get_env("ERROR_INTERNAL", &defaults.messages.internal),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.models.default_models.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DEFAULT_MODELS must name at least one model"
            )));
        }
        if self.ollama.timeout_secs == 0 || self.ollama.models_timeout_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Ollama timeouts must be greater than zero"
            )));
        }
        Ok(())
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed(key: &str, default: u64) -> Result<u64, AppError> {
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} must be a whole number: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

fn get_env_list(key: &str, default: Vec<String>) -> Vec<String> {
    match env::var(key) {
        Ok(val) => split_list(&val),
        Err(_) => default,
    }
}

/// Comma-separated list; blanks are dropped.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
