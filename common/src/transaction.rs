//! Transaction records for funding and exchange events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, TransactionId, UserId};

/// Kind of transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// External funds injected into a wallet.
    Fund,
    /// Exchange buying foreign currency with the base currency.
    Buy,
    /// Exchange selling foreign currency back to the base currency.
    Sell,
}

impl TransactionKind {
    /// Stable lowercase name, matching the wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Fund => "fund",
            TransactionKind::Buy => "buy",
            TransactionKind::Sell => "sell",
        }
    }

    /// Parse from the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fund" => Some(TransactionKind::Fund),
            "buy" => Some(TransactionKind::Buy),
            "sell" => Some(TransactionKind::Sell),
            _ => None,
        }
    }
}

/// Filter for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    /// All transaction kinds.
    #[default]
    All,
    /// Funding events only.
    Fund,
    /// Buy exchanges only.
    Buy,
    /// Sell exchanges only.
    Sell,
}

impl KindFilter {
    /// Check whether a transaction kind passes this filter.
    pub fn matches(&self, kind: TransactionKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Fund => kind == TransactionKind::Fund,
            KindFilter::Buy => kind == TransactionKind::Buy,
            KindFilter::Sell => kind == TransactionKind::Sell,
        }
    }
}

/// An immutable record of a funding or exchange event.
///
/// Records are append-only; nothing mutates a transaction after creation.
/// For `Fund` records the source currency is the `SYSTEM` sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID (time-ordered).
    pub id: TransactionId,
    /// User the transaction belongs to.
    pub user_id: UserId,
    /// Source currency (or `SYSTEM` for funding).
    pub from_currency: Currency,
    /// Destination currency.
    pub to_currency: Currency,
    /// Amount debited from the source.
    pub from_amount: Decimal,
    /// Amount credited to the destination.
    pub to_amount: Decimal,
    /// The rate applied, as stated by the rate table at execution time.
    pub rate: Decimal,
    /// Transaction kind.
    pub kind: TransactionKind,
    /// When the transaction was executed.
    pub executed_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new exchange transaction record.
    pub fn exchange(
        user_id: UserId,
        from_currency: Currency,
        to_currency: Currency,
        from_amount: Decimal,
        to_amount: Decimal,
        rate: Decimal,
        kind: TransactionKind,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            user_id,
            from_currency,
            to_currency,
            from_amount,
            to_amount,
            rate,
            kind,
            executed_at: Utc::now(),
        }
    }

    /// Create a funding record: same amount on both legs, rate 1.
    pub fn fund(user_id: UserId, currency: Currency, amount: Decimal) -> Self {
        Self {
            id: TransactionId::new(),
            user_id,
            from_currency: Currency::system(),
            to_currency: currency,
            from_amount: amount,
            to_amount: amount,
            rate: Decimal::ONE,
            kind: TransactionKind::Fund,
            executed_at: Utc::now(),
        }
    }
}
