//! Period domain types.
//!
//! A period moves through a one-way lifecycle: it accepts writes while open
//! (optionally under review), is consolidated exactly once, and may later be
//! archived. Consolidation is terminal for write operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use onlytop_shared::types::{Money, PeriodId, PeriodKey};

use crate::earnings::TopModel;

/// Status of an accounting period.
///
/// Valid transitions:
/// - ABIERTO → EN_REVISION (optional, manual)
/// - ABIERTO / EN_REVISION → CONSOLIDADO (exactly once)
/// - CONSOLIDADO → CERRADO (archival)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodStatus {
    /// Period accepts transaction and earnings writes.
    #[serde(rename = "ABIERTO")]
    Open,
    /// Period is under manual review; writes still allowed.
    #[serde(rename = "EN_REVISION")]
    InReview,
    /// Period is consolidated; terminal for all write operations.
    #[serde(rename = "CONSOLIDADO")]
    Consolidated,
    /// Period is archived; purely an archival marker after consolidation.
    #[serde(rename = "CERRADO")]
    Closed,
}

impl PeriodStatus {
    /// Returns the wire representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "ABIERTO",
            Self::InReview => "EN_REVISION",
            Self::Consolidated => "CONSOLIDADO",
            Self::Closed => "CERRADO",
        }
    }

    /// Returns true if the period still accepts writes.
    #[must_use]
    pub fn allows_posting(&self) -> bool {
        matches!(self, Self::Open | Self::InReview)
    }

    /// Returns true if the period has permanently left the open states.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Consolidated | Self::Closed)
    }
}

impl std::fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Totals snapshotted at the moment a period is consolidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationSummary {
    /// Sum of net sales across all calculated models.
    pub total_net_sales: Money,
    /// Sum of the company's net share across all calculated models.
    pub total_company_share: Money,
    /// Number of models with earnings in the period.
    pub model_count: usize,
    /// Top models by company share, best first.
    pub top_models: Vec<TopModel>,
}

/// An accounting period record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Unique identifier, referenced by consolidated records.
    pub id: PeriodId,
    /// The (month, year) bucket this record covers.
    pub key: PeriodKey,
    /// Current lifecycle state.
    pub status: PeriodStatus,
    /// Totals frozen at consolidation; `None` while the period is open.
    pub summary: Option<ConsolidationSummary>,
    /// Free-form notes supplied at close.
    pub closing_notes: Option<String>,
    /// When the period was consolidated.
    pub consolidated_at: Option<DateTime<Utc>>,
}

impl Period {
    /// Creates a fresh open period for the given key.
    #[must_use]
    pub fn open(key: PeriodKey) -> Self {
        Self {
            id: PeriodId::new(),
            key,
            status: PeriodStatus::Open,
            summary: None,
            closing_notes: None,
            consolidated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_allows_posting() {
        assert!(PeriodStatus::Open.allows_posting());
        assert!(PeriodStatus::InReview.allows_posting());
        assert!(!PeriodStatus::Consolidated.allows_posting());
        assert!(!PeriodStatus::Closed.allows_posting());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!PeriodStatus::Open.is_terminal());
        assert!(!PeriodStatus::InReview.is_terminal());
        assert!(PeriodStatus::Consolidated.is_terminal());
        assert!(PeriodStatus::Closed.is_terminal());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(PeriodStatus::Open.as_str(), "ABIERTO");
        assert_eq!(PeriodStatus::InReview.as_str(), "EN_REVISION");
        assert_eq!(PeriodStatus::Consolidated.as_str(), "CONSOLIDADO");
        assert_eq!(PeriodStatus::Closed.as_str(), "CERRADO");
        let json = serde_json::to_string(&PeriodStatus::InReview).unwrap();
        assert_eq!(json, "\"EN_REVISION\"");
    }

    #[test]
    fn test_open_period_defaults() {
        let key = PeriodKey::new(3, 2025).unwrap();
        let period = Period::open(key);
        assert_eq!(period.key, key);
        assert_eq!(period.status, PeriodStatus::Open);
        assert!(period.summary.is_none());
        assert!(period.consolidated_at.is_none());
    }
}
