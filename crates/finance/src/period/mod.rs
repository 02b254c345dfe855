//! Accounting periods: lifecycle states, records, and the registry.

pub mod registry;
pub mod types;

pub use registry::PeriodRegistry;
pub use types::{ConsolidationSummary, Period, PeriodStatus};
