//! Earnings domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use onlytop_shared::types::{ModelId, Money, PeriodId, PeriodKey};

/// Lifecycle of a per-model earnings record.
///
/// Strictly forward: CALCULADO → PENDIENTE_REVISION → APROBADO → PAGADO.
/// Recomputation while the period is open resets the record to CALCULADO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarningsStatus {
    /// No calculation has run yet.
    #[serde(rename = "SIN_CALCULAR")]
    Uncalculated,
    /// Split computed from sales data.
    #[serde(rename = "CALCULADO")]
    Calculated,
    /// Awaiting manual review.
    #[serde(rename = "PENDIENTE_REVISION")]
    PendingReview,
    /// Reviewed and approved for payment.
    #[serde(rename = "APROBADO")]
    Approved,
    /// Paid out to the model.
    #[serde(rename = "PAGADO")]
    Paid,
}

impl EarningsStatus {
    /// Returns the wire representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uncalculated => "SIN_CALCULAR",
            Self::Calculated => "CALCULADO",
            Self::PendingReview => "PENDIENTE_REVISION",
            Self::Approved => "APROBADO",
            Self::Paid => "PAGADO",
        }
    }
}

impl std::fmt::Display for EarningsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One model's computed earnings split for one period.
///
/// Reconciliation identities, exact for every record:
/// `model_share + agency_commission == net_sales` and
/// `model_share + bank_fee + company_share == net_sales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEarnings {
    /// The model this record belongs to.
    pub model: ModelId,
    /// The accounting bucket.
    pub period: PeriodKey,
    /// Gross sales net of platform deductions.
    pub net_sales: Money,
    /// Agreed agency commission percentage for the model.
    pub agency_pct: Decimal,
    /// The agency's cut of net sales (the company's gross margin).
    pub agency_commission: Money,
    /// Bank commission percentage applied to the company's gross margin.
    pub bank_pct: Decimal,
    /// Bank's cut, charged to the company's share only.
    pub bank_fee: Money,
    /// What the model keeps.
    pub model_share: Money,
    /// The company's net share after the bank fee.
    pub company_share: Money,
    /// Lifecycle state.
    pub status: EarningsStatus,
    /// When the split was (re)computed.
    pub calculated_at: DateTime<Utc>,
    /// When the record was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the payout happened.
    pub paid_at: Option<DateTime<Utc>>,
    /// Reviewer notes.
    pub notes: Option<String>,
    /// Set when the owning period is consolidated.
    pub consolidated_period: Option<PeriodId>,
}

/// One row of the top-models ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopModel {
    /// The ranked model.
    pub model: ModelId,
    /// The company's net share earned through this model.
    pub company_share: Money,
    /// The model's net sales.
    pub net_sales: Money,
}

/// Aggregated earnings statistics for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceStats {
    /// The period the statistics cover.
    pub period: PeriodKey,
    /// Number of models with a calculated record.
    pub model_count: usize,
    /// Sum of net sales.
    pub total_net_sales: Money,
    /// Sum of agency commissions (company gross margin).
    pub total_agency_commission: Money,
    /// Sum of bank fees.
    pub total_bank_fee: Money,
    /// Sum of model shares.
    pub total_model_share: Money,
    /// Sum of company net shares.
    pub total_company_share: Money,
    /// Average net sales per model with a record.
    pub avg_net_sales: Money,
    /// Average company net share per model with a record.
    pub avg_company_share: Money,
    /// Best models by company share, descending; ties broken by model id.
    pub top_models: Vec<TopModel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(EarningsStatus::Uncalculated.as_str(), "SIN_CALCULAR");
        assert_eq!(EarningsStatus::Calculated.as_str(), "CALCULADO");
        assert_eq!(EarningsStatus::PendingReview.as_str(), "PENDIENTE_REVISION");
        assert_eq!(EarningsStatus::Approved.as_str(), "APROBADO");
        assert_eq!(EarningsStatus::Paid.as_str(), "PAGADO");
        assert_eq!(
            serde_json::to_string(&EarningsStatus::Paid).unwrap(),
            "\"PAGADO\""
        );
    }
}
