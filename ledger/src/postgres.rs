//! Postgres-backed ledger store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use kantor_common::{
    Currency, ExchangeError, Result, Transaction, TransactionId, TransactionKind, UserId,
};

use crate::store::LedgerStore;
use crate::wallet::Wallet;

fn storage(e: sqlx::Error) -> ExchangeError {
    ExchangeError::Storage(e.to_string())
}

/// Ledger store backed by Postgres.
///
/// The schema mirrors the wallet and transaction tables of the upstream
/// service: one row per (user_id, currency_code) wallet and one immutable
/// row per transaction. A commit runs inside one database transaction so
/// both legs of a transfer and the record land together or not at all.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await.map_err(storage)?;
        Ok(Self { pool })
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS currency_wallets (
                user_id       TEXT NOT NULL,
                currency_code TEXT NOT NULL,
                currency_name TEXT NOT NULL,
                balance       NUMERIC NOT NULL DEFAULT 0 CHECK (balance >= 0),
                updated_at    TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (user_id, currency_code)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id            UUID PRIMARY KEY,
                user_id       TEXT NOT NULL,
                from_currency TEXT NOT NULL,
                to_currency   TEXT NOT NULL,
                from_amount   NUMERIC NOT NULL CHECK (from_amount > 0),
                to_amount     NUMERIC NOT NULL CHECK (to_amount > 0),
                rate          NUMERIC NOT NULL,
                kind          TEXT NOT NULL,
                executed_at   TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }
}

fn row_to_wallet(row: &sqlx::postgres::PgRow) -> Result<Wallet> {
    let user_id: String = row.try_get("user_id").map_err(storage)?;
    let currency_code: String = row.try_get("currency_code").map_err(storage)?;
    let display_name: String = row.try_get("currency_name").map_err(storage)?;
    let balance: Decimal = row.try_get("balance").map_err(storage)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(storage)?;

    Ok(Wallet {
        user_id: UserId::new(user_id),
        currency: Currency::new(currency_code),
        display_name,
        balance,
        updated_at,
    })
}

fn row_to_transaction(row: &sqlx::postgres::PgRow) -> Result<Transaction> {
    let id: Uuid = row.try_get("id").map_err(storage)?;
    let user_id: String = row.try_get("user_id").map_err(storage)?;
    let from_currency: String = row.try_get("from_currency").map_err(storage)?;
    let to_currency: String = row.try_get("to_currency").map_err(storage)?;
    let from_amount: Decimal = row.try_get("from_amount").map_err(storage)?;
    let to_amount: Decimal = row.try_get("to_amount").map_err(storage)?;
    let rate: Decimal = row.try_get("rate").map_err(storage)?;
    let kind: String = row.try_get("kind").map_err(storage)?;
    let executed_at: DateTime<Utc> = row.try_get("executed_at").map_err(storage)?;

    let kind = TransactionKind::parse(&kind)
        .ok_or_else(|| ExchangeError::Storage(format!("unknown transaction kind: {kind}")))?;

    Ok(Transaction {
        id: TransactionId::from_uuid(id),
        user_id: UserId::new(user_id),
        from_currency: Currency::new(from_currency),
        to_currency: Currency::new(to_currency),
        from_amount,
        to_amount,
        rate,
        kind,
        executed_at,
    })
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn commit(&self, wallets: &[Wallet], transaction: Option<&Transaction>) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        for wallet in wallets {
            sqlx::query(
                r#"
                INSERT INTO currency_wallets (user_id, currency_code, currency_name, balance, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (user_id, currency_code)
                DO UPDATE SET balance = EXCLUDED.balance, updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(wallet.user_id.as_str())
            .bind(wallet.currency.code())
            .bind(&wallet.display_name)
            .bind(wallet.balance)
            .bind(wallet.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        if let Some(txn) = transaction {
            sqlx::query(
                r#"
                INSERT INTO transactions
                    (id, user_id, from_currency, to_currency, from_amount, to_amount, rate, kind, executed_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(*txn.id.as_uuid())
            .bind(txn.user_id.as_str())
            .bind(txn.from_currency.code())
            .bind(txn.to_currency.code())
            .bind(txn.from_amount)
            .bind(txn.to_amount)
            .bind(txn.rate)
            .bind(txn.kind.as_str())
            .bind(txn.executed_at)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)
    }

    async fn load_wallets(&self) -> Result<Vec<Wallet>> {
        let rows = sqlx::query(
            "SELECT user_id, currency_code, currency_name, balance, updated_at FROM currency_wallets",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_wallet).collect()
    }

    async fn load_transactions(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, from_currency, to_currency, from_amount, to_amount, rate, kind, executed_at
            FROM transactions
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_transaction).collect()
    }
}
