//! Append-only transaction ledger.
//!
//! Every write serializes through the owning period's exclusive lock, so a
//! concurrent consolidation can never observe a partially-updated period.
//! Reads are lock-free over the concurrent store.

use std::sync::{Arc, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use tracing::info;

use onlytop_shared::types::{
    Currency, Money, MoneyError, PageRequest, PageResponse, PeriodId, PeriodKey, TransactionId,
};

use super::types::{
    ActiveTotals, Reversal, Transaction, TransactionFilter, TransactionKind, TransactionOrigin,
    TransactionStatus,
};
use crate::error::FinanceError;
use crate::period::PeriodRegistry;

/// Append-only store of movement records, tagged by origin, period, and
/// status. Supports reversal by exclusion; records are never deleted.
pub struct TransactionLedger {
    registry: Arc<PeriodRegistry>,
    currency: Currency,
    min_revert_reason_len: usize,
    by_period: DashMap<PeriodKey, Vec<Transaction>>,
    index: DashMap<TransactionId, PeriodKey>,
}

impl TransactionLedger {
    /// Creates a ledger bound to a period registry.
    #[must_use]
    pub fn new(
        registry: Arc<PeriodRegistry>,
        currency: Currency,
        min_revert_reason_len: usize,
    ) -> Self {
        Self {
            registry,
            currency,
            min_revert_reason_len,
            by_period: DashMap::new(),
            index: DashMap::new(),
        }
    }

    /// Appends an active transaction to the given period.
    ///
    /// The first write of a new month/year opens that period implicitly.
    ///
    /// # Errors
    ///
    /// - `CurrencyMismatch` if the amount is not in the ledger currency
    /// - `ZeroAmount` / `NegativeAmount` for non-positive amounts
    /// - `PeriodClosed` if the period is consolidated or archived
    pub fn record(
        &self,
        kind: TransactionKind,
        origin: TransactionOrigin,
        amount: Money,
        description: impl Into<String>,
        period: PeriodKey,
    ) -> Result<Transaction, FinanceError> {
        if amount.currency != self.currency {
            return Err(MoneyError::CurrencyMismatch {
                left: amount.currency,
                right: self.currency,
            }
            .into());
        }
        if amount.is_zero() {
            return Err(FinanceError::ZeroAmount);
        }
        if amount.is_negative() {
            return Err(FinanceError::NegativeAmount);
        }

        let lock = self.registry.lock(period);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.registry.ensure_open(period)?;

        let tx = Transaction {
            id: TransactionId::new(),
            kind,
            origin,
            amount,
            description: description.into(),
            period,
            status: TransactionStatus::Active,
            created_at: Utc::now(),
            reversal: None,
            consolidated_period: None,
        };

        self.by_period.entry(period).or_default().push(tx.clone());
        self.index.insert(tx.id, period);
        info!(
            id = %tx.id,
            period = %period,
            kind = kind.as_str(),
            amount = %amount.amount,
            "transaction recorded"
        );
        Ok(tx)
    }

    /// Reverts a transaction, excluding it from aggregates.
    ///
    /// The original amount keeps its sign; no counter-entry is inserted.
    /// Period state is re-checked after the lock is acquired, so a revert
    /// that lost a race against consolidation fails with `PeriodClosed`.
    ///
    /// # Errors
    ///
    /// - `InvalidReason` if the trimmed reason is shorter than the minimum
    /// - `NotFound` if no such transaction exists
    /// - `PeriodClosed` if the owning period is consolidated or archived
    /// - `AlreadyReverted` if the transaction was reverted before
    pub fn revert(
        &self,
        id: TransactionId,
        reason: &str,
        reverted_by: &str,
    ) -> Result<Transaction, FinanceError> {
        let trimmed = reason.trim();
        let actual = trimmed.chars().count();
        if actual < self.min_revert_reason_len {
            return Err(FinanceError::InvalidReason {
                min: self.min_revert_reason_len,
                actual,
            });
        }

        let period = *self
            .index
            .get(&id)
            .ok_or(FinanceError::TransactionNotFound(id))?;

        let lock = self.registry.lock(period);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.registry.check_open(period)?;

        let mut rows = self
            .by_period
            .get_mut(&period)
            .ok_or(FinanceError::TransactionNotFound(id))?;
        let tx = rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(FinanceError::TransactionNotFound(id))?;

        if tx.status == TransactionStatus::Reverted {
            return Err(FinanceError::AlreadyReverted(id));
        }

        tx.status = TransactionStatus::Reverted;
        tx.reversal = Some(Reversal {
            reason: trimmed.to_string(),
            reverted_at: Utc::now(),
            reverted_by: reverted_by.to_string(),
        });
        info!(id = %id, period = %period, reverted_by, "transaction reverted");
        Ok(tx.clone())
    }

    /// Looks up a single transaction.
    #[must_use]
    pub fn get(&self, id: TransactionId) -> Option<Transaction> {
        let period = *self.index.get(&id)?;
        self.by_period
            .get(&period)?
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Lists a period's transactions, newest first, filtered and paginated.
    #[must_use]
    pub fn list_by_period(
        &self,
        period: PeriodKey,
        filter: TransactionFilter,
        page: &PageRequest,
    ) -> PageResponse<Transaction> {
        let mut rows: Vec<Transaction> = self
            .by_period
            .get(&period)
            .map(|r| r.iter().filter(|t| filter.matches(t)).cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = rows.len() as u64;
        let data: Vec<Transaction> = rows
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();
        PageResponse::new(data, page.page, page.per_page, total)
    }

    /// Sums the period's ACTIVA transactions. Reverted rows contribute zero.
    ///
    /// # Errors
    ///
    /// Propagates `CurrencyMismatch`, which indicates corrupted data since
    /// `record` enforces a single ledger currency.
    pub fn sum_active(&self, period: PeriodKey) -> Result<ActiveTotals, FinanceError> {
        let mut income = Money::zero(self.currency);
        let mut expense = Money::zero(self.currency);

        if let Some(rows) = self.by_period.get(&period) {
            for tx in rows.iter().filter(|t| t.status.is_active()) {
                match tx.kind {
                    TransactionKind::Income => income = income.add(tx.amount)?,
                    TransactionKind::Expense => expense = expense.add(tx.amount)?,
                }
            }
        }

        let net = income.subtract(expense)?;
        Ok(ActiveTotals {
            income,
            expense,
            net,
        })
    }

    /// Number of active transactions in the period.
    #[must_use]
    pub fn active_count(&self, period: PeriodKey) -> usize {
        self.by_period
            .get(&period)
            .map(|rows| rows.iter().filter(|t| t.status.is_active()).count())
            .unwrap_or(0)
    }

    /// Stamps every transaction of the period with the consolidated period
    /// id. Called by the consolidation engine under the period lock.
    pub(crate) fn tag_consolidated(&self, period: PeriodKey, id: PeriodId) {
        if let Some(mut rows) = self.by_period.get_mut(&period) {
            for tx in rows.iter_mut() {
                tx.consolidated_period = Some(id);
            }
        }
    }
}
