//! External interface facade for the exchange core.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::instrument;

use kantor_common::{
    Currency, KindFilter, Money, Result, Transaction, TransactionKind, UserId,
};
use kantor_ledger::{currency_display_name, Ledger, LedgerStore, TransactionLog, Wallet};
use kantor_rates::RateFeed;

/// The operation groups a request-handling layer consumes, bundled over
/// one ledger, one log, and one rate feed. Callers arrive with an already
/// authenticated user identity; anything about tokens, passwords, or
/// transport stays outside this crate.
pub struct ExchangeService {
    ledger: Arc<Ledger>,
    log: Arc<TransactionLog>,
    feed: Arc<RateFeed>,
    engine: crate::ExchangeEngine,
}

impl ExchangeService {
    /// Assemble the service from its parts.
    pub fn new(ledger: Arc<Ledger>, log: Arc<TransactionLog>, feed: Arc<RateFeed>) -> Self {
        let engine = crate::ExchangeEngine::new(ledger.clone(), log.clone());
        Self {
            ledger,
            log,
            feed,
            engine,
        }
    }

    /// Open the service on a store, rehydrating ledger and log.
    pub async fn open(store: Arc<dyn LedgerStore>, feed: Arc<RateFeed>) -> Result<Self> {
        let ledger = Arc::new(Ledger::load(store.clone()).await?);
        let log = Arc::new(TransactionLog::load(store).await?);
        Ok(Self::new(ledger, log, feed))
    }

    /// Inject external funds into a wallet. Returns the balance after.
    #[instrument(skip(self), fields(user = %user_id, amount = %amount, currency = %currency))]
    pub async fn fund(
        &self,
        user_id: &UserId,
        amount: Decimal,
        currency: Currency,
    ) -> Result<Decimal> {
        let record = Transaction::fund(user_id.clone(), currency.clone(), amount);
        let balance = self
            .ledger
            .credit_recorded(
                user_id,
                Money::new(amount, currency.clone()),
                &currency_display_name(&currency),
                Some(&record),
            )
            .await?;
        self.log.append(record);
        Ok(balance)
    }

    /// All wallets of a user, sorted by currency code.
    pub async fn wallets(&self, user_id: &UserId) -> Vec<Wallet> {
        self.ledger.wallets(user_id).await
    }

    /// Balance in one currency; zero when no wallet exists.
    pub async fn balance(&self, user_id: &UserId, currency: &Currency) -> Decimal {
        self.ledger.balance(user_id, currency).await
    }

    /// Execute an exchange priced against the feed's current snapshot.
    pub async fn exchange(
        &self,
        user_id: &UserId,
        from: Currency,
        to: Currency,
        from_amount: Decimal,
        kind: TransactionKind,
    ) -> Result<Transaction> {
        let table = self.feed.current();
        self.engine
            .execute(user_id, from, to, from_amount, kind, &table)
            .await
    }

    /// A user's transaction history, most recent first.
    pub async fn history(&self, user_id: &UserId, filter: KindFilter) -> Vec<Transaction> {
        self.log.query(user_id, filter)
    }
}
