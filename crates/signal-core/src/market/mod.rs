//! Market Data
//!
//! Providers deliver `MarketState` snapshots; the feed keeps the current one
//! and refreshes it on an interval.

mod feed;
mod live;

pub use feed::{MarketFeed, PriceTick};
pub use live::{LiveMarketProvider, MarketConfig};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{Result, SignalError};
use crate::model::MarketState;

/// Market data source (Strategy pattern)
///
/// Implementations fetch and normalize live indicators. Failures are plain
/// errors here; substituting a fallback is the feed's job.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch a fresh snapshot
    async fn fetch(&self) -> Result<MarketState>;

    /// Provider name, for logs
    fn name(&self) -> &str;
}

/// Provider returning a fixed snapshot, or always failing.
///
/// For offline runs and tests.
pub struct StaticMarketProvider {
    state: Option<MarketState>,
}

impl StaticMarketProvider {
    pub const fn new(state: MarketState) -> Self {
        Self { state: Some(state) }
    }

    /// A provider whose every fetch fails
    pub const fn unavailable() -> Self {
        Self { state: None }
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarketProvider {
    async fn fetch(&self) -> Result<MarketState> {
        let mut state = self
            .state
            .clone()
            .ok_or_else(|| SignalError::Market("static provider is offline".into()))?;
        state.last_updated = Some(Utc::now());
        Ok(state)
    }

    fn name(&self) -> &str {
        "StaticMarket"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticMarketProvider::new(MarketState::new(
            dec!(97500),
            dec!(30),
            dec!(99000),
            dec!(1.5),
        ));

        let state = provider.fetch().await.unwrap();
        assert_eq!(state.price, Some(dec!(97500)));
        assert!(state.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_unavailable_provider() {
        let provider = StaticMarketProvider::unavailable();
        assert!(provider.fetch().await.is_err());
    }
}
