//! Kantor Common Types
//!
//! This crate contains shared types used across the Kantor exchange core,
//! including identifiers, monetary types, transaction records, and the
//! unified error taxonomy.

pub mod error;
pub mod identifiers;
pub mod monetary;
pub mod transaction;

pub use error::*;
pub use identifiers::*;
pub use monetary::*;
pub use transaction::*;
