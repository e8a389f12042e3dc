//! Convene Feed - Ranked Discovery
//!
//! Turns access-filtered events into a personalized, paginated feed:
//!
//! - Ranking: `FeedRanker` scoring candidates with `RankingWeights`
//! - Pagination: `FeedCursor` cursors recording what was served, and `paginate`
//! - Configuration: `ConveneConfig` holding the policy catalog and weights
//! - Service: `DiscoveryService` wiring the friend graph, event store, guest
//!   tokens and clock through the access layer
//!
//! # Example
//!
//! ```ignore
//! use convene_feed::{ConveneConfig, DiscoveryService, FeedRequest};
//! use convene_core::ConfigSource;
//!
//! let config = ConveneConfig::resolve(Some(Path::new("convene.toml")))?;
//! let service = DiscoveryService::new(config, graph, store, guests, clock);
//! let page = service.feed(&viewer, FeedRequest::default()).await?;
//! ```

pub mod config;
pub mod pagination;
pub mod ranking;
pub mod service;

// Re-export primary types
pub use config::ConveneConfig;
pub use pagination::{paginate, FeedCursor, FeedPage};
pub use ranking::{
    FeedCandidate, FeedContext, FeedRanker, RankingWeights, Signal, SignalContribution,
};
pub use service::{DiscoveryService, FeedRequest, DEFAULT_PAGE_SIZE};
