//! Bank aggregate types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use onlytop_shared::types::{Money, PeriodKey};

/// Point-in-time view of the two capital pools.
///
/// `in_movement` is always derived from the open period's ledger and
/// earnings, never stored, so the snapshot cannot drift from the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSnapshot {
    /// Immutable capital carried over from consolidated periods.
    pub consolidated: Money,
    /// Capital accrued in the currently open period.
    pub in_movement: Money,
    /// `consolidated + in_movement`.
    pub total: Money,
    /// The currently open period.
    pub current_period: PeriodKey,
    /// How many periods have been consolidated so far.
    pub periods_consolidated: u32,
    /// Models ever included in a consolidation.
    pub models_all_time: u64,
    /// Net sales ever consolidated.
    pub sales_all_time: Money,
    /// When the last consolidation ran.
    pub last_consolidation: Option<DateTime<Utc>>,
}
