//! # signal-core
//!
//! Daily buy signal for a recurring Bitcoin accumulation plan.
//!
//! Every day the engine answers one question: given today's market and my
//! budget, how much should I buy? The answer is a base daily amount scaled
//! by five market and goal signals, then capped so the rest of the month
//! stays funded.
//!
//! ## Example: $400/month budget, 30 days left, fearful market
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  base = 400 / 30                         = $13.33           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  fear     (15)          ███████████████  × 1.50             │
//! │  trend    (+5.9%)       ██████████       × 1.00             │
//! │  dip      (-5.3%)       ███████████      × 1.10             │
//! │  goal     (0%)          ███████████      × 1.10             │
//! │  cooldown (0%)          ██████████       × 1.00             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  raw = 13.33 × 1.815                     = $24.20           │
//! │  reserve ceiling = 400 − 10 × 29         = $110.00          │
//! │  buy today                               = $24.20           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod advisor;
pub mod engine;
pub mod error;
pub mod lab;
pub mod market;
pub mod model;
pub mod period;
pub mod profile;
pub mod retry;
pub mod screen;
pub mod store;

pub use advisor::{Advice, AdviceSource, NarrativeAdvisor, Narrator};
pub use error::{Result, SignalError};
pub use lab::{GoalProjection, LabConditions, LabReport};
pub use market::{LiveMarketProvider, MarketDataProvider, MarketFeed, PriceTick, StaticMarketProvider};
pub use model::{MarketState, Profile, ProfileId, Recommendation};
pub use profile::{CommandOutcome, CommandReceipt, NewProfile, ProfileCommand, ProfileField, ProfileService};
pub use retry::RetryPolicy;
pub use screen::{Screen, ScreenAction};
pub use store::{JsonFileStore, MemoryProfileStore, ProfileStore};
