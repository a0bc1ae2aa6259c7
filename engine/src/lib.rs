//! Kantor Exchange Engine
//!
//! Orchestrates rate-aware currency conversions on top of the ledger: a
//! conversion is priced against one rate snapshot, applied as an atomic
//! two-leg transfer, and recorded in the transaction log. The service
//! facade exposes the operation groups a request-handling layer consumes.

pub mod exchange;
pub mod service;

pub use exchange::ExchangeEngine;
pub use service::ExchangeService;
