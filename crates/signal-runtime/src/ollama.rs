//! Ollama Narrator
//!
//! Local text generation through an Ollama server.

use std::time::Duration;

use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, MessageRole, request::ChatMessageRequest},
    models::ModelOptions as OllamaOptions,
};
use signal_core::advisor::Narrator;
use signal_core::error::{Result, SignalError};

/// Ollama narrator configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Model to chat with
    pub model: String,

    pub temperature: f32,

    /// Token cap for one insight
    pub max_tokens: i32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            model: "llama3.2".into(),
            temperature: 0.7,
            max_tokens: 120,
            timeout_secs: 60,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("OLLAMA_HOST").unwrap_or(defaults.host);
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let model = std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model);

        Self {
            host,
            port,
            model,
            ..defaults
        }
    }
}

/// Narrator backed by a local Ollama model
pub struct OllamaNarrator {
    client: Ollama,
    config: OllamaConfig,
    label: String,
}

impl OllamaNarrator {
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(&config.host, config.port),
            label: format!("ollama:{}", config.model),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(OllamaConfig::from_env())
    }

    fn request(&self, prompt: &str) -> ChatMessageRequest {
        let options = OllamaOptions::default()
            .temperature(self.config.temperature)
            .num_predict(self.config.max_tokens);

        ChatMessageRequest::new(
            self.config.model.clone(),
            vec![ChatMessage::new(MessageRole::User, prompt.to_string())],
        )
        .options(options)
    }
}

#[async_trait]
impl Narrator for OllamaNarrator {
    async fn narrate(&self, prompt: &str) -> Result<String> {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let response = tokio::time::timeout(timeout, self.client.send_chat_messages(self.request(prompt)))
            .await
            .map_err(|_| SignalError::Timeout(timeout))?
            .map_err(|e| SignalError::Narrator(e.to_string()))?;

        let text = response.message.content.trim().to_string();
        if text.is_empty() {
            return Err(SignalError::Narrator("empty response from Ollama".into()));
        }
        Ok(text)
    }

    /// Whether the Ollama server answers at all
    async fn health_check(&self) -> bool {
        match self.client.list_local_models().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.host, "http://localhost");
        assert_eq!(config.port, 11434);
        assert_eq!(config.model, "llama3.2");
    }

    #[test]
    fn test_name_includes_model() {
        let narrator = OllamaNarrator::from_config(OllamaConfig {
            model: "mistral".into(),
            ..OllamaConfig::default()
        });
        assert_eq!(narrator.name(), "ollama:mistral");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let narrator = OllamaNarrator::from_config(OllamaConfig {
            port: 1,
            timeout_secs: 5,
            ..OllamaConfig::default()
        });

        assert!(narrator.narrate("hello").await.is_err());
        assert!(!narrator.health_check().await);
    }
}
