//! Error taxonomy for the Kantor exchange core.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::Currency;

/// Main error type for Kantor operations.
///
/// Every failure is surfaced to the caller as a typed outcome; nothing is
/// logged-and-ignored, and no operation clamps an invalid amount.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Non-positive or malformed amount. Rejected before any mutation.
    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// Malformed request (same source/destination currency, missing fields).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Currency absent from the active rate snapshot. Transient; the caller
    /// may retry after the next refresh.
    #[error("Rate unavailable for {0}")]
    RateUnavailable(Currency),

    /// Reported outcome of a legitimate request, not a system fault.
    #[error("Insufficient balance in {currency}: requested {requested}, available {available}")]
    InsufficientBalance {
        currency: Currency,
        requested: Decimal,
        available: Decimal,
    },

    /// Underlying persistence unavailable. Fatal to the specific call; the
    /// caller should retry with backoff.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Upstream rate feed failure. The previous snapshot stays authoritative.
    #[error("Rate feed error: {0}")]
    Feed(String),
}

impl ExchangeError {
    /// Check if this error is retryable without changing the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::RateUnavailable(_)
                | ExchangeError::Storage(_)
                | ExchangeError::Feed(_)
        )
    }

    /// Get a stable error code for the caller-facing layer.
    pub fn error_code(&self) -> &'static str {
        match self {
            ExchangeError::InvalidAmount { .. } => "INVALID_AMOUNT",
            ExchangeError::InvalidRequest(_) => "INVALID_REQUEST",
            ExchangeError::RateUnavailable(_) => "RATE_UNAVAILABLE",
            ExchangeError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            ExchangeError::Storage(_) => "STORAGE_ERROR",
            ExchangeError::Feed(_) => "FEED_ERROR",
        }
    }
}

/// Result type alias for Kantor operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        let err = ExchangeError::InvalidAmount { amount: dec!(-5) };
        assert_eq!(err.error_code(), "INVALID_AMOUNT");

        let err = ExchangeError::RateUnavailable(Currency::new("XYZ"));
        assert_eq!(err.error_code(), "RATE_UNAVAILABLE");
    }

    #[test]
    fn test_retryable() {
        assert!(ExchangeError::Feed("timeout".into()).is_retryable());
        assert!(!ExchangeError::InsufficientBalance {
            currency: Currency::pln(),
            requested: dec!(100),
            available: dec!(50),
        }
        .is_retryable());
    }
}
