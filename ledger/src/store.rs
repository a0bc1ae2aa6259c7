//! Persistence substrate for wallets and transaction records.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use kantor_common::{Currency, ExchangeError, Result, Transaction, UserId};

use crate::wallet::Wallet;

/// Durable storage for wallet and transaction records.
///
/// A `commit` writes the post-state of every touched wallet plus the
/// transaction record (when the operation produces one) as a single atomic
/// unit: either everything lands or nothing does. The ledger applies its
/// in-memory state only after a commit succeeds, so a storage failure never
/// leaves the two out of step.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Atomically persist wallet post-states and an optional record.
    async fn commit(&self, wallets: &[Wallet], transaction: Option<&Transaction>) -> Result<()>;

    /// Load every wallet, for startup rehydration.
    async fn load_wallets(&self) -> Result<Vec<Wallet>>;

    /// Load every transaction record in append order.
    async fn load_transactions(&self) -> Result<Vec<Transaction>>;
}

/// In-memory store. The reference implementation for tests and for
/// ephemeral deployments that do not need restart survival.
#[derive(Default)]
pub struct MemoryStore {
    wallets: RwLock<HashMap<(UserId, Currency), Wallet>>,
    transactions: RwLock<Vec<Transaction>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent commits fail, for exercising rollback paths.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn commit(&self, wallets: &[Wallet], transaction: Option<&Transaction>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ExchangeError::Storage("write failure injected".to_string()));
        }

        {
            let mut stored = self.wallets.write();
            for wallet in wallets {
                stored.insert(
                    (wallet.user_id.clone(), wallet.currency.clone()),
                    wallet.clone(),
                );
            }
        }

        if let Some(txn) = transaction {
            self.transactions.write().push(txn.clone());
        }

        Ok(())
    }

    async fn load_wallets(&self) -> Result<Vec<Wallet>> {
        Ok(self.wallets.read().values().cloned().collect())
    }

    async fn load_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.read().clone())
    }
}
