//! Wallet definitions for the ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kantor_common::{Currency, UserId};

/// A user's balance holding in one currency.
///
/// Identity is (user_id, currency); the ledger keeps at most one wallet per
/// pair. The balance is never negative, not even transiently across a
/// failed operation, and wallets are never deleted once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Owning user.
    pub user_id: UserId,
    /// Wallet currency.
    pub currency: Currency,
    /// Human-readable currency name.
    pub display_name: String,
    /// Current balance.
    pub balance: Decimal,
    /// When the balance last changed.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Open a new empty wallet.
    pub fn open(user_id: UserId, currency: Currency, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            currency,
            display_name: display_name.into(),
            balance: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    /// Check if the wallet covers the given amount.
    pub fn has_sufficient_funds(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

/// Human-readable name for a currency code, falling back to the code
/// itself for currencies outside the known set.
pub fn currency_display_name(currency: &Currency) -> String {
    match currency.code() {
        "PLN" => "Polish Zloty".to_string(),
        "USD" => "US Dollar".to_string(),
        "EUR" => "Euro".to_string(),
        "GBP" => "British Pound".to_string(),
        "CHF" => "Swiss Franc".to_string(),
        "JPY" => "Japanese Yen".to_string(),
        code => code.to_string(),
    }
}
