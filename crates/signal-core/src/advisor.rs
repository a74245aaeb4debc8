//! Narrative Advisor
//!
//! Turns a `Recommendation` into a short human-readable insight by asking an
//! external text model. Advisory only: nothing here feeds back into the
//! numbers, and every failure becomes a placeholder message.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};
use crate::model::Recommendation;

pub const CONFIG_ERROR_TEXT: &str = "AI currently unavailable (Config Error).";
pub const UNAVAILABLE_TEXT: &str = "AI Analysis unavailable.";

/// Text generation backend (Strategy pattern)
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Generate text for a free-form prompt
    async fn narrate(&self, prompt: &str) -> Result<String>;

    /// Whether the backend looks usable right now
    async fn health_check(&self) -> bool {
        true
    }

    /// Backend name, for logs and health output
    fn name(&self) -> &str;
}

/// Where an advice text came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceSource {
    Narrator,
    Placeholder,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub text: String,
    pub source: AdviceSource,
}

impl Advice {
    fn placeholder(error: &SignalError) -> Self {
        let text = match error {
            SignalError::Config(_) => CONFIG_ERROR_TEXT,
            _ => UNAVAILABLE_TEXT,
        };
        Self {
            text: text.into(),
            source: AdviceSource::Placeholder,
        }
    }
}

/// Prompt summarizing a recommendation
pub fn build_prompt(rec: &Recommendation) -> String {
    let safety = if rec.is_capped_by_reserve { "CAPPED" } else { "OK" };

    format!(
        "You are a strategic Bitcoin investment advisor.\n\
         \n\
         Current Status:\n\
         - Recommended Buy: ${:.0}\n\
         - Market Sentiment: Fear Level {} (0=Panic, 100=Greed)\n\
         - Multiplier: {:.2}x\n\
         - Budget Safety: {}\n\
         \n\
         Write a concise insight (max 40 words).\n\
         - First, explain \"Why\" (e.g. \"Market panic offers discount\").\n\
         - Second, give a command (e.g. \"Accumulate aggressively\").",
        rec.final_buy.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        rec.stats.fear.normalize(),
        rec.total_mult.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        safety
    )
}

/// Advisor over any narrator backend
#[derive(Clone)]
pub struct NarrativeAdvisor {
    narrator: Arc<dyn Narrator>,
}

impl NarrativeAdvisor {
    pub fn new(narrator: Arc<dyn Narrator>) -> Self {
        Self { narrator }
    }

    pub fn narrator_name(&self) -> &str {
        self.narrator.name()
    }

    pub async fn narrator_available(&self) -> bool {
        self.narrator.health_check().await
    }

    /// Explain a recommendation. Never fails.
    pub async fn advise(&self, rec: &Recommendation) -> Advice {
        match self.relay(&build_prompt(rec)).await {
            Ok(text) => Advice {
                text,
                source: AdviceSource::Narrator,
            },
            Err(e) => Advice::placeholder(&e),
        }
    }

    /// Pass a free-text prompt through to the narrator
    pub async fn relay(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(SignalError::Narrator("empty prompt".into()));
        }

        self.narrator.narrate(prompt).await.map_err(|e| {
            tracing::warn!("Narrator {} failed: {}", self.narrator.name(), e);
            e
        })
    }
}
