//! Two-leg exchange orchestration.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use kantor_common::{
    Currency, ExchangeError, Money, Result, Transaction, TransactionKind, UserId,
};
use kantor_ledger::{currency_display_name, Ledger, TransactionLog};
use kantor_rates::RateTable;

/// Orchestrates a currency conversion as one atomic unit: price against a
/// snapshot, move both legs through the ledger, record the transaction.
pub struct ExchangeEngine {
    ledger: Arc<Ledger>,
    log: Arc<TransactionLog>,
}

impl ExchangeEngine {
    /// Create a new exchange engine.
    pub fn new(ledger: Arc<Ledger>, log: Arc<TransactionLog>) -> Self {
        Self { ledger, log }
    }

    /// Execute an exchange against the given rate snapshot.
    ///
    /// The snapshot fixes the applied rate for the whole operation; a feed
    /// refresh landing mid-flight never repriced an exchange already in
    /// progress. On insufficient funds nothing is applied and nothing is
    /// logged.
    #[instrument(skip(self, table), fields(user = %user_id, from = %from, to = %to, amount = %from_amount))]
    pub async fn execute(
        &self,
        user_id: &UserId,
        from: Currency,
        to: Currency,
        from_amount: Decimal,
        kind: TransactionKind,
        table: &RateTable,
    ) -> Result<Transaction> {
        if from_amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount {
                amount: from_amount,
            });
        }
        if from == to {
            return Err(ExchangeError::InvalidRequest(
                "source and destination currency are the same".to_string(),
            ));
        }
        if kind == TransactionKind::Fund {
            return Err(ExchangeError::InvalidRequest(
                "funding is not an exchange".to_string(),
            ));
        }

        let from_rate = table
            .rate(&from)
            .ok_or_else(|| ExchangeError::RateUnavailable(from.clone()))?;
        let to_rate = table
            .rate(&to)
            .ok_or_else(|| ExchangeError::RateUnavailable(to.clone()))?;

        let converted = table.convert(&Money::new(from_amount, from.clone()), &to)?;
        let to_money = converted.round();
        if !to_money.is_positive() {
            // The amount is too small to represent in the destination
            // currency at this rate.
            return Err(ExchangeError::InvalidAmount {
                amount: to_money.amount,
            });
        }

        // The table's stated rate goes on the record for auditability, not
        // the quotient realized after rounding.
        let stated_rate = from_rate / to_rate;

        let transaction = Transaction::exchange(
            user_id.clone(),
            from.clone(),
            to.clone(),
            from_amount,
            to_money.amount,
            stated_rate,
            kind,
        );

        let applied = self
            .ledger
            .two_leg_transfer_recorded(
                user_id,
                Money::new(from_amount, from.clone()),
                to_money,
                &currency_display_name(&to),
                Some(&transaction),
            )
            .await?;

        if !applied {
            let available = self.ledger.balance(user_id, &from).await;
            return Err(ExchangeError::InsufficientBalance {
                currency: from,
                requested: from_amount,
                available,
            });
        }

        self.log.append(transaction.clone());

        info!(
            transaction_id = %transaction.id,
            rate = %transaction.rate,
            to_amount = %transaction.to_amount,
            "Exchange executed"
        );

        Ok(transaction)
    }
}
