//! Server Configuration

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_STORE_PATH: &str = "satoshi_profiles.json";
pub const DEFAULT_POLL_SECS: u64 = 15;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// JSON file holding the profile collection
    pub store_path: PathBuf,

    /// Market refresh interval
    pub poll_every: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            store_path: DEFAULT_STORE_PATH.into(),
            poll_every: Duration::from_secs(DEFAULT_POLL_SECS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let store_path = std::env::var("PROFILE_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);
        let poll_every = std::env::var("MARKET_POLL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.poll_every, Duration::from_secs);

        Self {
            bind_addr,
            store_path,
            poll_every,
        }
    }
}
