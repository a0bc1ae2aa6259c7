//! Rate source traits and implementations.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use kantor_common::{Currency, ExchangeError, Result};

use crate::table::RateTable;

/// A source of rate table snapshots.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch a fresh snapshot.
    async fn fetch(&self) -> Result<RateTable>;
}

/// Configuration for the NBP source.
#[derive(Debug, Clone)]
pub struct NbpConfig {
    /// Base URL of the NBP API.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for NbpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.nbp.pl/api".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// One quoted currency in an NBP table response.
#[derive(Debug, Deserialize)]
struct NbpRate {
    #[allow(dead_code)]
    currency: String,
    code: String,
    mid: Decimal,
}

/// An NBP "table A" response entry.
#[derive(Debug, Deserialize)]
struct NbpTable {
    #[allow(dead_code)]
    table: String,
    #[allow(dead_code)]
    no: String,
    #[serde(rename = "effectiveDate")]
    effective_date: NaiveDate,
    rates: Vec<NbpRate>,
}

/// Rate source backed by the National Bank of Poland table A feed.
///
/// NBP quotes every currency against PLN, so snapshots from this source are
/// always PLN-based. Rates arrive at the feed's own precision (4 fractional
/// digits) and are stored as-is.
pub struct NbpSource {
    client: reqwest::Client,
    config: NbpConfig,
}

impl NbpSource {
    /// Create a new NBP source.
    pub fn new(config: NbpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ExchangeError::Feed(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl RateSource for NbpSource {
    fn name(&self) -> &str {
        "NBP"
    }

    async fn fetch(&self) -> Result<RateTable> {
        let url = format!(
            "{}/exchangerates/tables/A/?format=json",
            self.config.base_url
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExchangeError::Feed(e.to_string()))?
            .error_for_status()
            .map_err(|e| ExchangeError::Feed(e.to_string()))?;

        let tables: Vec<NbpTable> = response
            .json()
            .await
            .map_err(|e| ExchangeError::Feed(e.to_string()))?;

        let table = tables
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::Feed("empty table A response".to_string()))?;

        debug!(
            effective_date = %table.effective_date,
            quoted = table.rates.len(),
            "Fetched NBP table A"
        );

        let rates: BTreeMap<Currency, Decimal> = table
            .rates
            .into_iter()
            .map(|r| (Currency::new(r.code), r.mid))
            .collect();

        RateTable::new(Currency::pln(), table.effective_date, rates)
    }
}

/// Static rate source serving a fixed table.
///
/// Used by tests and by deployments that load rates out of band. When no
/// table is set, fetching fails the way an unreachable feed would.
pub struct StaticSource {
    name: String,
    table: RwLock<Option<RateTable>>,
}

impl StaticSource {
    /// Create a source with no table yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: RwLock::new(None),
        }
    }

    /// Create a source serving the given table.
    pub fn with_table(name: impl Into<String>, table: RateTable) -> Self {
        Self {
            name: name.into(),
            table: RwLock::new(Some(table)),
        }
    }

    /// Replace the served table.
    pub fn set_table(&self, table: RateTable) {
        *self.table.write() = Some(table);
    }

    /// Drop the served table; subsequent fetches fail.
    pub fn clear(&self) {
        *self.table.write() = None;
    }
}

#[async_trait]
impl RateSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<RateTable> {
        self.table
            .read()
            .clone()
            .ok_or_else(|| ExchangeError::Feed(format!("source {} has no table", self.name)))
    }
}
