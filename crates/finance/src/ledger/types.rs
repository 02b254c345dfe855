//! Ledger domain types.
//!
//! Transactions are append-only movement records. Once created, `kind`,
//! `origin`, `amount`, and `period` never change; only the status and the
//! reversal record may be set, exactly once, while the owning period is
//! still open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use onlytop_shared::types::{Money, PeriodId, PeriodKey, TransactionId};

/// Direction of a money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money entering the agency.
    #[serde(rename = "INGRESO")]
    Income,
    /// Money leaving the agency.
    #[serde(rename = "EGRESO")]
    Expense,
}

impl TransactionKind {
    /// Returns the wire representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INGRESO",
            Self::Expense => "EGRESO",
        }
    }
}

/// What produced a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionOrigin {
    /// Imported sale.
    #[serde(rename = "VENTA")]
    Sale,
    /// Manual adjustment.
    #[serde(rename = "AJUSTE")]
    Adjustment,
    /// Commission computation.
    #[serde(rename = "COMISION")]
    Commission,
    /// Correction linked to a reversal.
    #[serde(rename = "REVERSION")]
    Reversal,
    /// Anything else.
    #[serde(rename = "OTRO")]
    Other,
}

/// Whether a transaction still contributes to aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Contributes to period totals.
    #[serde(rename = "ACTIVA")]
    Active,
    /// Excluded from totals; kept for the audit trail.
    #[serde(rename = "REVERTIDA")]
    Reverted,
}

impl TransactionStatus {
    /// Returns true if the transaction contributes to aggregates.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Immutable audit record attached by a reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reversal {
    /// Why the transaction was reverted.
    pub reason: String,
    /// When the reversal happened.
    pub reverted_at: DateTime<Utc>,
    /// Principal label of whoever requested the reversal.
    pub reverted_by: String,
}

/// A ledger entry.
///
/// Reverted transactions keep their original sign: exclusion from the
/// aggregates, not a negative counter-entry, removes their contribution, so
/// kind/origin semantics stay legible in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Direction of the movement.
    pub kind: TransactionKind,
    /// What produced the movement.
    pub origin: TransactionOrigin,
    /// The amount moved; always positive.
    pub amount: Money,
    /// Human-readable description.
    pub description: String,
    /// The accounting bucket the movement belongs to.
    pub period: PeriodKey,
    /// Whether the movement still counts.
    pub status: TransactionStatus,
    /// When the movement was recorded.
    pub created_at: DateTime<Utc>,
    /// Audit record of the reversal, if any.
    pub reversal: Option<Reversal>,
    /// Set when the owning period is consolidated.
    pub consolidated_period: Option<PeriodId>,
}

/// Filter for ledger list reads. Empty fields match everything.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Match only this kind.
    pub kind: Option<TransactionKind>,
    /// Match only this origin.
    pub origin: Option<TransactionOrigin>,
    /// Match only this status.
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    /// Returns true if the transaction passes every set field.
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.kind.is_none_or(|k| k == tx.kind)
            && self.origin.is_none_or(|o| o == tx.origin)
            && self.status.is_none_or(|s| s == tx.status)
    }
}

/// Aggregate over the active transactions of one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTotals {
    /// Sum of active INGRESO amounts.
    pub income: Money,
    /// Sum of active EGRESO amounts.
    pub expense: Money,
    /// `income - expense`.
    pub net: Money,
}
