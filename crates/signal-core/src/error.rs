//! Error Types for SatoshiSignal

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SignalError>;

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Market data error: {0}")]
    Market(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Profile store error: {0}")]
    Store(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("No active profile")]
    NoActiveProfile,

    #[error("Invalid value for {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("Invalid execution price: {0}")]
    InvalidPrice(Decimal),

    #[error("Narrator error: {0}")]
    Narrator(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SignalError {
    /// Whether a retry of the same request could succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Market(_) | Self::Timeout(_) | Self::Network(_) | Self::Io(_)
        )
    }

    /// Short message safe to show to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::Market(_) | Self::Timeout(_) | Self::Network(_) => {
                "Failed to load live data.".into()
            }
            Self::ProfileNotFound(id) => format!("Profile '{id}' does not exist."),
            Self::NoActiveProfile => "Create a profile first.".into(),
            Self::InvalidField { field, reason } => format!("Invalid {field}: {reason}"),
            Self::InvalidPrice(_) => "A buy needs a positive price.".into(),
            Self::Narrator(_) => "AI Analysis unavailable.".into(),
            Self::Config(_) => "AI currently unavailable (Config Error).".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
