//! # signal-runtime
//!
//! Narrator backends for the satoshi-signal advisor.
//!
//! ## Backends
//!
//! - **Ollama** (default): local inference via Ollama
//! - **Gemini**: Google's hosted `generateContent` API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use signal_core::NarrativeAdvisor;
//!
//! let narrator = signal_runtime::narrator_from_env()?;
//! let advisor = NarrativeAdvisor::new(narrator);
//! let advice = advisor.advise(&recommendation).await;
//! ```

use std::str::FromStr;
use std::sync::Arc;

use signal_core::advisor::Narrator;
use signal_core::error::{Result, SignalError};

pub mod gemini;
#[cfg(feature = "ollama")]
pub mod ollama;

pub use gemini::{GeminiConfig, GeminiNarrator};
#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaNarrator};

/// Which backend `NARRATOR` selects
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NarratorKind {
    #[default]
    Ollama,
    Gemini,
}

impl FromStr for NarratorKind {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            other => Err(SignalError::Config(format!("unknown narrator '{other}'"))),
        }
    }
}

/// Build the narrator named by `kind`, configured from the environment
pub fn narrator_for(kind: NarratorKind) -> Result<Arc<dyn Narrator>> {
    match kind {
        #[cfg(feature = "ollama")]
        NarratorKind::Ollama => Ok(Arc::new(OllamaNarrator::from_env())),
        #[cfg(not(feature = "ollama"))]
        NarratorKind::Ollama => Err(SignalError::Config(
            "built without the `ollama` feature".into(),
        )),
        NarratorKind::Gemini => Ok(Arc::new(GeminiNarrator::from_env()?)),
    }
}

/// Build the narrator selected by `NARRATOR` (default `ollama`)
pub fn narrator_from_env() -> Result<Arc<dyn Narrator>> {
    let kind = match std::env::var("NARRATOR") {
        Ok(raw) => raw.parse()?,
        Err(_) => NarratorKind::default(),
    };
    tracing::info!("Narrator backend: {:?}", kind);
    narrator_for(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("ollama".parse::<NarratorKind>().unwrap(), NarratorKind::Ollama);
        assert_eq!(" Gemini ".parse::<NarratorKind>().unwrap(), NarratorKind::Gemini);
        assert!("gpt".parse::<NarratorKind>().is_err());
    }

    #[test]
    fn test_gemini_backend_name() {
        let narrator = narrator_for(NarratorKind::Gemini).unwrap();
        assert!(narrator.name().starts_with("gemini:"));
    }
}
