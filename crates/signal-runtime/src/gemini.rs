//! Gemini Narrator
//!
//! Hosted text generation through the Gemini `generateContent` REST call.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signal_core::advisor::Narrator;
use signal_core::error::{Result, SignalError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Text used when the model answers without any candidate
pub const NO_ANALYSIS_TEXT: &str = "No analysis available.";

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// `None` keeps the narrator constructible; every call then fails with a
    /// configuration error.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 30,
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            ..defaults
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

// Wire types

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ResponsePart {
    text: String,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| NO_ANALYSIS_TEXT.to_string())
    }
}

/// Narrator backed by the Gemini API
pub struct GeminiNarrator {
    http: reqwest::Client,
    config: GeminiConfig,
    label: String,
}

impl GeminiNarrator {
    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        if config.api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set, narrative advice is disabled");
        }

        Ok(Self {
            http,
            label: format!("gemini:{}", config.model),
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(GeminiConfig::from_env())
    }
}

#[async_trait]
impl Narrator for GeminiNarrator {
    async fn narrate(&self, prompt: &str) -> Result<String> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| SignalError::Config("API key not configured".into()))?;

        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };

        // Key goes in a header, never in the URL
        let response = self
            .http
            .post(self.config.endpoint())
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SignalError::Narrator(format!("Gemini API error: {status}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;
        Ok(parsed.into_text())
    }

    /// Usable once a key is configured
    async fn health_check(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn name(&self) -> &str {
        &self.label
    }
}
