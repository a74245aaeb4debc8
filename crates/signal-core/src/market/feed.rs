//! Market Feed
//!
//! Holds the snapshot the rest of the system reads and keeps it fresh.
//! A failed initial load installs the mock fallback; a failed poll keeps
//! whatever was there before. Neither ever ends the polling loop.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, watch};

use super::MarketDataProvider;
use crate::model::MarketState;

/// Direction of the price between two successful refreshes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTick {
    Up,
    Down,
    Flat,
    /// The refresh failed; the snapshot was not replaced
    Unchanged,
}

/// Shared, periodically refreshed market snapshot
pub struct MarketFeed {
    provider: Arc<dyn MarketDataProvider>,
    current: RwLock<Option<MarketState>>,
}

impl MarketFeed {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Initial load. Falls back to the flagged mock snapshot on failure.
    pub async fn load(&self) -> MarketState {
        let state = match self.provider.fetch().await {
            Ok(state) => {
                tracing::info!("Market data loaded from {}", self.provider.name());
                state
            }
            Err(e) => {
                tracing::warn!(
                    "Market data unavailable from {} ({}), using fallback snapshot",
                    self.provider.name(),
                    e
                );
                MarketState::fallback()
            }
        };

        *self.current.write().await = Some(state.clone());
        state
    }

    /// Refresh once. Errors are logged and leave the snapshot untouched.
    pub async fn poll(&self) -> PriceTick {
        let fresh = match self.provider.fetch().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Market refresh failed: {}", e);
                return PriceTick::Unchanged;
            }
        };

        let mut current = self.current.write().await;
        let previous_price = current.as_ref().and_then(|s| s.price);

        let tick = match (previous_price, fresh.price) {
            (Some(before), Some(now)) if now > before => PriceTick::Up,
            (Some(before), Some(now)) if now < before => PriceTick::Down,
            _ => PriceTick::Flat,
        };
        tracing::debug!("Market tick {:?}: {:?} -> {:?}", tick, previous_price, fresh.price);

        *current = Some(fresh);
        tick
    }

    /// Current snapshot; the fallback if nothing has been loaded yet
    pub async fn snapshot(&self) -> MarketState {
        self.current
            .read()
            .await
            .clone()
            .unwrap_or_else(MarketState::fallback)
    }

    /// Poll every `every` until `shutdown` flips to true
    pub async fn run(self: Arc<Self>, every: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; `load` already covered it.
        ticker.tick().await;

        tracing::info!("Market polling every {:?}", every);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Market polling stopped");
                        return;
                    }
                }
            }
        }
    }
}
