//! Bank capital pools: consolidated and in-movement money.

pub mod service;
pub mod types;

pub use service::BankLedger;
pub use types::BankSnapshot;
