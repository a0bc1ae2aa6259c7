//! Kantor Ledger Engine
//!
//! Per-user, per-currency wallet balances with atomic funding and two-leg
//! exchange transfers, an append-only transaction log, and a pluggable
//! persistence substrate.

pub mod engine;
pub mod log;
pub mod postgres;
pub mod store;
pub mod wallet;

pub use engine::Ledger;
pub use log::TransactionLog;
pub use postgres::PgStore;
pub use store::{LedgerStore, MemoryStore};
pub use wallet::{currency_display_name, Wallet};
