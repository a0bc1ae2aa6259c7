//! Core ledger engine implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use kantor_common::{Currency, ExchangeError, Money, Result, Transaction, UserId};

use crate::store::LedgerStore;
use crate::wallet::Wallet;

/// All wallets of one user, keyed by currency so listings come out sorted.
type UserWallets = BTreeMap<Currency, Wallet>;

/// The ledger owns every wallet and is the only writer of balances.
///
/// Mutations for one user serialize on that user's mutex; operations for
/// different users run fully in parallel. The mutex is held across the
/// store commit, so a concurrent reader observes either the pre- or the
/// post-state of an operation, never an intermediate one, and the
/// in-memory state moves only after the commit succeeded.
pub struct Ledger {
    users: DashMap<UserId, Arc<Mutex<UserWallets>>>,
    store: Arc<dyn LedgerStore>,
}

impl Ledger {
    /// Create an empty ledger on top of the given store.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            users: DashMap::new(),
            store,
        }
    }

    /// Rehydrate the ledger from the store after a restart.
    pub async fn load(store: Arc<dyn LedgerStore>) -> Result<Self> {
        let ledger = Self::new(store.clone());
        for wallet in store.load_wallets().await? {
            let entry = ledger.user_entry(&wallet.user_id);
            let mut wallets = entry.lock().await;
            wallets.insert(wallet.currency.clone(), wallet);
        }
        Ok(ledger)
    }

    fn user_entry(&self, user_id: &UserId) -> Arc<Mutex<UserWallets>> {
        self.users.entry(user_id.clone()).or_default().clone()
    }

    /// Current balance, zero when no wallet exists. Never fails and never
    /// creates a wallet.
    pub async fn balance(&self, user_id: &UserId, currency: &Currency) -> Decimal {
        let entry = match self.users.get(user_id) {
            Some(entry) => entry.value().clone(),
            None => return Decimal::ZERO,
        };
        let wallets = entry.lock().await;
        wallets
            .get(currency)
            .map(|w| w.balance)
            .unwrap_or(Decimal::ZERO)
    }

    /// All wallets of a user, sorted by currency code.
    pub async fn wallets(&self, user_id: &UserId) -> Vec<Wallet> {
        let entry = match self.users.get(user_id) {
            Some(entry) => entry.value().clone(),
            None => return Vec::new(),
        };
        let wallets = entry.lock().await;
        wallets.values().cloned().collect()
    }

    /// Add funds to a wallet, creating it lazily on first credit.
    /// Returns the balance after the credit.
    pub async fn credit(
        &self,
        user_id: &UserId,
        amount: Money,
        display_name: &str,
    ) -> Result<Decimal> {
        self.credit_recorded(user_id, amount, display_name, None)
            .await
    }

    /// Credit with a transaction record committed in the same storage unit.
    #[instrument(skip(self, record), fields(user = %user_id, amount = %amount))]
    pub async fn credit_recorded(
        &self,
        user_id: &UserId,
        amount: Money,
        display_name: &str,
        record: Option<&Transaction>,
    ) -> Result<Decimal> {
        if !amount.is_positive() {
            return Err(ExchangeError::InvalidAmount {
                amount: amount.amount,
            });
        }

        let entry = self.user_entry(user_id);
        let mut wallets = entry.lock().await;

        let mut wallet = wallets
            .get(&amount.currency)
            .cloned()
            .unwrap_or_else(|| Wallet::open(user_id.clone(), amount.currency.clone(), display_name));
        wallet.balance += amount.amount;
        wallet.updated_at = Utc::now();

        self.store.commit(&[wallet.clone()], record).await?;

        let balance = wallet.balance;
        wallets.insert(amount.currency.clone(), wallet);

        info!(balance = %balance, "Wallet credited");
        Ok(balance)
    }

    /// Subtract funds from a wallet.
    ///
    /// Returns `Ok(false)` without mutating anything when the wallet is
    /// absent or the balance does not cover the amount. This is the single
    /// gate keeping balances non-negative.
    #[instrument(skip(self), fields(user = %user_id, amount = %amount))]
    pub async fn debit(&self, user_id: &UserId, amount: Money) -> Result<bool> {
        if !amount.is_positive() {
            return Err(ExchangeError::InvalidAmount {
                amount: amount.amount,
            });
        }

        let entry = self.user_entry(user_id);
        let mut wallets = entry.lock().await;

        let Some(source) = wallets.get(&amount.currency) else {
            return Ok(false);
        };
        if !source.has_sufficient_funds(amount.amount) {
            return Ok(false);
        }

        let mut wallet = source.clone();
        wallet.balance -= amount.amount;
        wallet.updated_at = Utc::now();

        self.store.commit(&[wallet.clone()], None).await?;

        wallets.insert(amount.currency.clone(), wallet);
        info!("Wallet debited");
        Ok(true)
    }

    /// Debit one currency and credit another as a single atomic unit.
    pub async fn two_leg_transfer(
        &self,
        user_id: &UserId,
        from: Money,
        to: Money,
        to_display_name: &str,
    ) -> Result<bool> {
        self.two_leg_transfer_recorded(user_id, from, to, to_display_name, None)
            .await
    }

    /// Two-leg transfer with a transaction record committed in the same
    /// storage unit, the way an exchange is persisted.
    ///
    /// When the debit leg cannot be covered, nothing changes and `Ok(false)`
    /// is returned. Both amounts are validated before the debit is
    /// attempted, so a debit is never left without its matching credit.
    #[instrument(skip(self, record), fields(user = %user_id, from = %from, to = %to))]
    pub async fn two_leg_transfer_recorded(
        &self,
        user_id: &UserId,
        from: Money,
        to: Money,
        to_display_name: &str,
        record: Option<&Transaction>,
    ) -> Result<bool> {
        if !from.is_positive() {
            return Err(ExchangeError::InvalidAmount { amount: from.amount });
        }
        if !to.is_positive() {
            return Err(ExchangeError::InvalidAmount { amount: to.amount });
        }
        if from.currency == to.currency {
            return Err(ExchangeError::InvalidRequest(
                "transfer legs share one currency".to_string(),
            ));
        }

        let entry = self.user_entry(user_id);
        let mut wallets = entry.lock().await;

        let Some(source) = wallets.get(&from.currency) else {
            return Ok(false);
        };
        if !source.has_sufficient_funds(from.amount) {
            return Ok(false);
        }

        let now = Utc::now();
        let mut debited = source.clone();
        debited.balance -= from.amount;
        debited.updated_at = now;

        let mut credited = wallets.get(&to.currency).cloned().unwrap_or_else(|| {
            Wallet::open(user_id.clone(), to.currency.clone(), to_display_name)
        });
        credited.balance += to.amount;
        credited.updated_at = now;

        self.store
            .commit(&[debited.clone(), credited.clone()], record)
            .await?;

        wallets.insert(from.currency.clone(), debited);
        wallets.insert(to.currency.clone(), credited);

        info!("Two-leg transfer applied");
        Ok(true)
    }
}
