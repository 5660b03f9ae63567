//! Common test utilities for chat-gateway integration tests.

#![allow(dead_code)]

use chat_gateway::config::GatewayConfig;
use chat_gateway::startup::Application;
use reqwest::Client;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestApp {
    pub address: String,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_chat(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/v1/chat"))
            .json(&body)
            .send()
            .await
            .expect("Failed to send chat request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
    }
}

/// Gateway settings pointing at `ollama_url`, listening on a random port.
pub fn test_config(ollama_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.common.host = "127.0.0.1".to_string();
    config.common.port = 0;
    config.ollama.base_url = ollama_url.to_string();
    config.ollama.timeout_secs = 1;
    config.ollama.models_timeout_secs = 1;
    config
}

/// Spawn the application in the background and return its address.
pub async fn spawn_app_with(config: GatewayConfig) -> TestApp {
    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let address = format!("http://127.0.0.1:{}", app.port());

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    TestApp {
        address,
        client: Client::new(),
    }
}

pub async fn spawn_app(ollama_url: &str) -> TestApp {
    spawn_app_with(test_config(ollama_url)).await
}

/// A base URL where nothing is listening.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Mock Ollama advertising `models`.
pub async fn mount_tags(server: &MockServer, models: &[&str]) {
    let models: Vec<Value> = models.iter().map(|name| json!({ "name": name })).collect();
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(server)
        .await;
}

/// Mock Ollama answering every generate call with `template`.
pub async fn mount_generate(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(template)
        .mount(server)
        .await;
}
