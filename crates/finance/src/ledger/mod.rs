//! Transaction ledger: append-only movement records with reversal support.
//!
//! - Domain types for transactions, reversals, and filters
//! - The ledger service (record, revert, list, aggregate)
//! - Property tests for reversal exclusion

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::TransactionLedger;
pub use types::{
    ActiveTotals, Reversal, Transaction, TransactionFilter, TransactionKind, TransactionOrigin,
    TransactionStatus,
};
