//! Rate feed with atomic snapshot swap.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{info, warn};

use kantor_common::{Currency, Result};

use crate::source::RateSource;
use crate::table::RateTable;

/// Configuration for the rate feed.
#[derive(Debug, Clone)]
pub struct RateFeedConfig {
    /// How often the refresh loop pulls a new snapshot.
    pub refresh_interval: Duration,
}

impl Default for RateFeedConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(300),
        }
    }
}

/// Holds the active rate snapshot and refreshes it from a source.
///
/// The swap is a single `Arc` replacement under a short write lock: readers
/// in flight keep the table they already cloned, and new readers see either
/// the old or the new table in full, never a mix of entries. A failed
/// refresh leaves the previous snapshot authoritative.
pub struct RateFeed {
    source: Arc<dyn RateSource>,
    table: RwLock<Arc<RateTable>>,
    config: RateFeedConfig,
}

impl RateFeed {
    /// Create a feed starting from an empty snapshot.
    pub fn new(source: Arc<dyn RateSource>, base: Currency) -> Self {
        Self::with_config(source, base, RateFeedConfig::default())
    }

    /// Create a feed with custom configuration.
    pub fn with_config(
        source: Arc<dyn RateSource>,
        base: Currency,
        config: RateFeedConfig,
    ) -> Self {
        Self {
            source,
            table: RwLock::new(Arc::new(RateTable::empty(base))),
            config,
        }
    }

    /// The active snapshot. Cheap to call; clones an `Arc`.
    pub fn current(&self) -> Arc<RateTable> {
        self.table.read().clone()
    }

    /// Pull a fresh snapshot and swap it in wholesale.
    pub async fn refresh(&self) -> Result<()> {
        match self.source.fetch().await {
            Ok(table) => {
                info!(
                    source = self.source.name(),
                    as_of = %table.as_of(),
                    quoted = table.len(),
                    "Rate snapshot replaced"
                );
                *self.table.write() = Arc::new(table);
                Ok(())
            }
            Err(e) => {
                warn!(
                    source = self.source.name(),
                    error = %e,
                    "Rate refresh failed, keeping previous snapshot"
                );
                Err(e)
            }
        }
    }

    /// Run the periodic refresh loop. Fetch failures are surfaced through
    /// the log inside `refresh` and the loop carries on with the old table.
    pub async fn run_refresh_loop(&self) {
        let mut interval = tokio::time::interval(self.config.refresh_interval);
        loop {
            interval.tick().await;
            let _ = self.refresh().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn table(usd_mid: rust_decimal::Decimal) -> RateTable {
        let mut rates = BTreeMap::new();
        rates.insert(Currency::usd(), usd_mid);
        RateTable::new(
            Currency::pln(),
            NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
            rates,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_refresh_swaps_snapshot() {
        let source = Arc::new(StaticSource::with_table("test", table(dec!(4.00))));
        let feed = RateFeed::new(source.clone(), Currency::pln());

        assert!(feed.current().is_empty());

        feed.refresh().await.unwrap();
        assert_eq!(feed.current().rate(&Currency::usd()), Some(dec!(4.00)));

        source.set_table(table(dec!(4.10)));
        feed.refresh().await.unwrap();
        assert_eq!(feed.current().rate(&Currency::usd()), Some(dec!(4.10)));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let source = Arc::new(StaticSource::with_table("test", table(dec!(4.00))));
        let feed = RateFeed::new(source.clone(), Currency::pln());

        feed.refresh().await.unwrap();

        source.clear();
        assert!(feed.refresh().await.is_err());

        // Stale but available.
        assert_eq!(feed.current().rate(&Currency::usd()), Some(dec!(4.00)));
    }

    #[tokio::test]
    async fn test_reader_keeps_old_snapshot_across_swap() {
        let source = Arc::new(StaticSource::with_table("test", table(dec!(4.00))));
        let feed = RateFeed::new(source.clone(), Currency::pln());
        feed.refresh().await.unwrap();

        let held = feed.current();

        source.set_table(table(dec!(9.99)));
        feed.refresh().await.unwrap();

        // An exchange in progress keeps the rate it started with.
        assert_eq!(held.rate(&Currency::usd()), Some(dec!(4.00)));
        assert_eq!(feed.current().rate(&Currency::usd()), Some(dec!(9.99)));
    }
}
