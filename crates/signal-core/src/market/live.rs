//! Live Market Provider
//!
//! Bitcoin price data from CoinGecko and sentiment from the alternative.me
//! Fear & Greed index. Both requests go through the retry policy.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::MarketDataProvider;
use crate::error::{Result, SignalError};
use crate::model::{MarketState, lenient};
use crate::retry::RetryPolicy;

pub const DEFAULT_FEAR_GREED_URL: &str = "https://api.alternative.me/fng/?limit=1";
pub const DEFAULT_MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&ids=bitcoin&sparkline=false&price_change_percentage=7d";

/// Endpoints and retry settings for the live provider
#[derive(Clone, Debug)]
pub struct MarketConfig {
    pub fear_greed_url: String,
    pub markets_url: String,
    pub retry: RetryPolicy,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            fear_greed_url: DEFAULT_FEAR_GREED_URL.into(),
            markets_url: DEFAULT_MARKETS_URL.into(),
            retry: RetryPolicy::default(),
        }
    }
}

impl MarketConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let fear_greed_url =
            std::env::var("MARKET_FNG_URL").unwrap_or(defaults.fear_greed_url);
        let markets_url =
            std::env::var("MARKET_COINGECKO_URL").unwrap_or(defaults.markets_url);

        let mut retry = defaults.retry;
        if let Some(attempts) = std::env::var("MARKET_RETRY_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            retry = retry.with_attempts(attempts);
        }
        if let Some(secs) = std::env::var("MARKET_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            retry = retry.with_timeout(Some(Duration::from_secs(secs)));
        }

        Self {
            fear_greed_url,
            markets_url,
            retry,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FearGreedResponse {
    #[serde(default)]
    data: Vec<FearGreedEntry>,
}

#[derive(Debug, Deserialize)]
struct FearGreedEntry {
    /// Served as a numeric string
    #[serde(default, deserialize_with = "lenient::option")]
    value: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct CoinMarket {
    #[serde(default, deserialize_with = "lenient::option")]
    current_price: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::option")]
    high_24h: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::option")]
    price_change_percentage_7d_in_currency: Option<Decimal>,
}

/// Merge the two upstream payloads into one snapshot
fn assemble(sentiment: FearGreedResponse, markets: Vec<CoinMarket>) -> Result<MarketState> {
    let fear = sentiment
        .data
        .into_iter()
        .next()
        .ok_or_else(|| SignalError::Market("fear & greed response has no data".into()))?;
    let btc = markets
        .into_iter()
        .next()
        .ok_or_else(|| SignalError::Market("markets response has no bitcoin entry".into()))?;

    Ok(MarketState {
        price: btc.current_price,
        fear_index: fear.value,
        high_24h: btc.high_24h,
        change_7d: btc.price_change_percentage_7d_in_currency,
        last_updated: Some(Utc::now()),
        is_mock: false,
    })
}

/// Provider backed by the public CoinGecko and alternative.me APIs
pub struct LiveMarketProvider {
    client: reqwest::Client,
    config: MarketConfig,
}

impl LiveMarketProvider {
    pub fn new(config: MarketConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("satoshi-signal/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.retry.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(MarketConfig::from_env())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.config
            .retry
            .run(url, || async move {
                let response = self.client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SignalError::Market(format!("HTTP error! status: {status}")));
                }
                Ok(response.json::<T>().await?)
            })
            .await
    }
}

#[async_trait]
impl MarketDataProvider for LiveMarketProvider {
    async fn fetch(&self) -> Result<MarketState> {
        let sentiment: FearGreedResponse = self.get_json(&self.config.fear_greed_url).await?;
        let markets: Vec<CoinMarket> = self.get_json(&self.config.markets_url).await?;

        let state = assemble(sentiment, markets)?;
        tracing::debug!(
            "Live market: price={:?} fear={:?} change7d={:?}",
            state.price,
            state.fear_index,
            state.change_7d
        );
        Ok(state)
    }

    fn name(&self) -> &str {
        "CoinGecko+FearGreed"
    }
}
