//! Application State

use std::sync::Arc;

use signal_core::{MarketFeed, NarrativeAdvisor, ProfileService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Current market snapshot, refreshed in the background
    pub feed: Arc<MarketFeed>,

    /// Profile book and its store
    pub profiles: Arc<ProfileService>,

    /// Narrative text for recommendations
    pub advisor: NarrativeAdvisor,
}
