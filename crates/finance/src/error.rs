//! Error taxonomy for ledger, earnings, and consolidation operations.
//!
//! Every variant is terminal for the triggering call: mutations are never
//! retried automatically, since a silently repeated ledger write risks
//! double-booking. The only retryable outcome is a cancelled read.

use rust_decimal::Decimal;
use thiserror::Error;

use onlytop_shared::types::{ModelId, MoneyError, PeriodKey, TransactionId};

use crate::earnings::EarningsStatus;
use crate::period::PeriodStatus;

/// Errors that can occur during finance engine operations.
#[derive(Debug, Error)]
pub enum FinanceError {
    // ========== Money Errors ==========
    /// Arithmetic between amounts of different currencies.
    #[error(transparent)]
    Currency(#[from] MoneyError),

    /// Amount cannot be zero.
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Amount cannot be negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Percentage outside the 0-100 range.
    #[error("Percentage out of range: {0}")]
    InvalidPercentage(Decimal),

    // ========== Period Errors ==========
    /// Period is consolidated or closed; no further writes allowed.
    #[error("Period {0} is closed, no further writes allowed")]
    PeriodClosed(PeriodKey),

    /// No period record exists for the given key.
    #[error("Period not found: {0}")]
    PeriodNotFound(PeriodKey),

    /// Consolidation requested for a period that already left the open states.
    #[error("Period {0} is already consolidated")]
    AlreadyConsolidated(PeriodKey),

    /// Period state transition not allowed from the current state.
    #[error("Invalid period transition for {period}: {from} -> {to}")]
    InvalidPeriodTransition {
        /// The period whose transition was rejected.
        period: PeriodKey,
        /// State the period is currently in.
        from: PeriodStatus,
        /// State the caller asked for.
        to: PeriodStatus,
    },

    /// Consolidation requested for a period with no activity at all.
    #[error("Period {0} has no activity to consolidate")]
    EmptyPeriod(PeriodKey),

    /// The supplied confirmation token does not match the configured literal.
    #[error("Confirmation token does not match")]
    InvalidConfirmation,

    // ========== Ledger Errors ==========
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Transaction was already reverted; a reversal happens exactly once.
    #[error("Transaction {0} is already reverted")]
    AlreadyReverted(TransactionId),

    /// Reversal reason shorter than the configured minimum.
    #[error("Reversal reason too short: {actual} characters (minimum {min})")]
    InvalidReason {
        /// Configured minimum length.
        min: usize,
        /// Length of the supplied reason after trimming.
        actual: usize,
    },

    // ========== Earnings Errors ==========
    /// Earnings already calculated for the model/period; pass `force` to replace.
    #[error("Earnings for model {model} already calculated for {period}")]
    AlreadyCalculated {
        /// The model whose earnings exist.
        model: ModelId,
        /// The period the record belongs to.
        period: PeriodKey,
    },

    /// No earnings record for the model/period.
    #[error("No earnings record for model {model} in {period}")]
    EarningsNotFound {
        /// The model looked up.
        model: ModelId,
        /// The period looked up.
        period: PeriodKey,
    },

    /// Earnings status transition not allowed from the current status.
    #[error("Invalid earnings transition: {from} -> {to}")]
    InvalidEarningsTransition {
        /// Status the record is currently in.
        from: EarningsStatus,
        /// Status the caller asked for.
        to: EarningsStatus,
    },

    // ========== Collaborator Errors ==========
    /// A collaborator (sales source, model directory) failed.
    #[error("External service error: {0}")]
    ExternalService(String),

    // ========== Read Errors ==========
    /// Aggregate read cancelled by the caller.
    #[error("Aggregate read cancelled")]
    Cancelled,
}

impl FinanceError {
    /// Returns the stable error code for consumers.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Currency(_) => "CURRENCY_MISMATCH",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::InvalidPercentage(_) => "INVALID_PERCENTAGE",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::AlreadyConsolidated(_) => "ALREADY_CONSOLIDATED",
            Self::InvalidPeriodTransition { .. } => "INVALID_PERIOD_TRANSITION",
            Self::EmptyPeriod(_) => "EMPTY_PERIOD",
            Self::InvalidConfirmation => "INVALID_CONFIRMATION",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::AlreadyReverted(_) => "ALREADY_REVERTED",
            Self::InvalidReason { .. } => "INVALID_REASON",
            Self::AlreadyCalculated { .. } => "ALREADY_CALCULATED",
            Self::EarningsNotFound { .. } => "EARNINGS_NOT_FOUND",
            Self::InvalidEarningsTransition { .. } => "INVALID_EARNINGS_TRANSITION",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns true if the failed operation may be retried as-is.
    ///
    /// Only idempotent reads qualify; a rejected ledger mutation must never
    /// be replayed blindly.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
