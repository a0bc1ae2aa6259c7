//! Kantor Rate Engine
//!
//! Rate table snapshots and pairwise currency conversion.
//!
//! # Features
//!
//! - Immutable rate snapshots against a fixed base currency
//! - Two-hop conversion through the base for cross pairs
//! - Pluggable rate sources (NBP table A feed, static tables)
//! - Atomic snapshot swap with a stale-but-available refresh policy
//!
//! # Example
//!
//! ```rust,ignore
//! use kantor_rates::{RateFeed, NbpSource};
//! use kantor_common::{Currency, Money};
//!
//! let feed = RateFeed::new(Arc::new(NbpSource::new(NbpConfig::default())?), Currency::pln());
//! feed.refresh().await?;
//!
//! let table = feed.current();
//! let usd = table.convert(&Money::new(dec!(100), Currency::pln()), &Currency::usd())?;
//! ```

pub mod feed;
pub mod source;
pub mod table;

pub use feed::{RateFeed, RateFeedConfig};
pub use source::{NbpConfig, NbpSource, RateSource, StaticSource};
pub use table::RateTable;
