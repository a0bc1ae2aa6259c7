//! Append-only transaction log.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use kantor_common::{KindFilter, Result, Transaction, UserId};

use crate::store::LedgerStore;

/// Append-only record of every funding and exchange event.
///
/// Records enter in execution order and are never updated or deleted; ids
/// are UUID v7, so the in-memory order matches the id order a store reload
/// produces. Durability is the ledger's concern: the record is part of the
/// same store commit as the balance mutation, and the log only indexes what
/// was already committed, which is why `append` cannot fail.
#[derive(Default)]
pub struct TransactionLog {
    entries: RwLock<Vec<Transaction>>,
}

impl TransactionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate the log from the store after a restart.
    pub async fn load(store: Arc<dyn LedgerStore>) -> Result<Self> {
        let entries = store.load_transactions().await?;
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    /// Append a committed record. O(1) amortized, never fails.
    pub fn append(&self, transaction: Transaction) {
        debug!(
            id = %transaction.id,
            user = %transaction.user_id,
            kind = transaction.kind.as_str(),
            "Transaction recorded"
        );
        self.entries.write().push(transaction);
    }

    /// A user's transactions passing the filter, most recent first.
    /// Pure read; calling it twice without an intervening append returns
    /// identical sequences.
    pub fn query(&self, user_id: &UserId, filter: KindFilter) -> Vec<Transaction> {
        self.entries
            .read()
            .iter()
            .rev()
            .filter(|t| t.user_id == *user_id && filter.matches(t.kind))
            .cloned()
            .collect()
    }

    /// Total number of records across all users.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use kantor_common::{Currency, TransactionKind};
    use rust_decimal_macros::dec;

    fn alice() -> UserId {
        UserId::new("alice")
    }

    fn buy(user: &UserId) -> Transaction {
        Transaction::exchange(
            user.clone(),
            Currency::pln(),
            Currency::usd(),
            dec!(100),
            dec!(25),
            dec!(0.25),
            TransactionKind::Buy,
        )
    }

    #[test]
    fn test_query_most_recent_first() {
        let log = TransactionLog::new();
        let first = Transaction::fund(alice(), Currency::pln(), dec!(100));
        let second = buy(&alice());

        log.append(first.clone());
        log.append(second.clone());

        let history = log.query(&alice(), KindFilter::All);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[1].id, first.id);
    }

    #[test]
    fn test_query_filters_by_kind() {
        let log = TransactionLog::new();
        let fund = Transaction::fund(alice(), Currency::pln(), dec!(100));
        log.append(fund.clone());
        log.append(buy(&alice()));

        let funds = log.query(&alice(), KindFilter::Fund);
        assert_eq!(funds.len(), 1);
        assert_eq!(funds[0].id, fund.id);

        assert_eq!(log.query(&alice(), KindFilter::Sell).len(), 0);
    }

    #[test]
    fn test_query_scoped_to_user() {
        let log = TransactionLog::new();
        log.append(Transaction::fund(alice(), Currency::pln(), dec!(100)));
        log.append(Transaction::fund(UserId::new("bob"), Currency::pln(), dec!(50)));

        assert_eq!(log.query(&alice(), KindFilter::All).len(), 1);
        assert_eq!(log.query(&UserId::new("bob"), KindFilter::All).len(), 1);
        assert_eq!(log.query(&UserId::new("carol"), KindFilter::All).len(), 0);
    }

    #[test]
    fn test_query_idempotent() {
        let log = TransactionLog::new();
        log.append(Transaction::fund(alice(), Currency::pln(), dec!(100)));
        log.append(buy(&alice()));

        let a = log.query(&alice(), KindFilter::All);
        let b = log.query(&alice(), KindFilter::All);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_load_rehydrates_in_order() {
        let store = Arc::new(MemoryStore::new());
        let fund = Transaction::fund(alice(), Currency::pln(), dec!(100));
        let exchange = buy(&alice());
        store.commit(&[], Some(&fund)).await.unwrap();
        store.commit(&[], Some(&exchange)).await.unwrap();

        let log = TransactionLog::load(store).await.unwrap();
        let history = log.query(&alice(), KindFilter::All);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, exchange.id);
        assert_eq!(history[1].id, fund.id);
    }
}
