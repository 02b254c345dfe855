//! The bank's two capital pools.
//!
//! `consolidated` changes only as an effect of period consolidation; the
//! engine is its single writer. `in_movement` is recomputed on every read
//! from the open period's active transactions plus the company's net share
//! of calculated earnings.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use onlytop_shared::types::{Currency, Money, PeriodKey};

use super::types::BankSnapshot;
use crate::earnings::EarningsCalculator;
use crate::error::FinanceError;
use crate::ledger::TransactionLedger;
use crate::period::PeriodRegistry;

#[derive(Debug, Clone)]
struct LifetimeTotals {
    periods_consolidated: u32,
    models_all_time: u64,
    sales_all_time: Money,
    last_consolidation: Option<DateTime<Utc>>,
}

/// Maintains consolidated capital and derives the in-movement figure.
pub struct BankLedger {
    registry: Arc<PeriodRegistry>,
    ledger: Arc<TransactionLedger>,
    earnings: Arc<EarningsCalculator>,
    consolidated: RwLock<Money>,
    lifetime: RwLock<LifetimeTotals>,
}

impl BankLedger {
    /// Creates a bank ledger with empty pools.
    #[must_use]
    pub fn new(
        registry: Arc<PeriodRegistry>,
        ledger: Arc<TransactionLedger>,
        earnings: Arc<EarningsCalculator>,
        currency: Currency,
    ) -> Self {
        Self {
            registry,
            ledger,
            earnings,
            consolidated: RwLock::new(Money::zero(currency)),
            lifetime: RwLock::new(LifetimeTotals {
                periods_consolidated: 0,
                models_all_time: 0,
                sales_all_time: Money::zero(currency),
                last_consolidation: None,
            }),
        }
    }

    /// The in-movement capital of a period, derived on read.
    ///
    /// # Errors
    ///
    /// Propagates `CurrencyMismatch` from corrupted records.
    pub fn in_movement(&self, period: PeriodKey) -> Result<Money, FinanceError> {
        let totals = self.ledger.sum_active(period)?;
        let stats = self.earnings.aggregate(period)?;
        Ok(totals.net.add(stats.total_company_share)?)
    }

    /// Current view of both pools and the lifetime counters.
    ///
    /// Lock-free with respect to period writes: a snapshot racing an
    /// in-flight record or calculate call may miss it, which is acceptable
    /// for this read model.
    ///
    /// # Errors
    ///
    /// Propagates `CurrencyMismatch` from corrupted records.
    pub fn snapshot(&self) -> Result<BankSnapshot, FinanceError> {
        let current_period = self.registry.current_open();
        let in_movement = self.in_movement(current_period)?;
        let consolidated = *self
            .consolidated
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let total = consolidated.add(in_movement)?;
        let lifetime = self
            .lifetime
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Ok(BankSnapshot {
            consolidated,
            in_movement,
            total,
            current_period,
            periods_consolidated: lifetime.periods_consolidated,
            models_all_time: lifetime.models_all_time,
            sales_all_time: lifetime.sales_all_time,
            last_consolidation: lifetime.last_consolidation,
        })
    }

    /// Total capital: consolidated plus in-movement.
    ///
    /// # Errors
    ///
    /// Propagates `CurrencyMismatch` from corrupted records.
    pub fn total(&self) -> Result<Money, FinanceError> {
        Ok(self.snapshot()?.total)
    }

    /// Moves a period's in-movement capital into the consolidated pool and
    /// bumps the lifetime counters. Only the consolidation engine calls
    /// this, under the period's exclusive lock.
    ///
    /// All sums are computed before any assignment: either the whole
    /// transfer applies or none of it does.
    pub(crate) fn apply_consolidation(
        &self,
        moving: Money,
        model_count: usize,
        net_sales: Money,
        at: DateTime<Utc>,
    ) -> Result<Money, FinanceError> {
        let mut pool = self
            .consolidated
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut lifetime = self
            .lifetime
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let new_pool = pool.add(moving)?;
        let new_sales = lifetime.sales_all_time.add(net_sales)?;

        *pool = new_pool;
        lifetime.periods_consolidated += 1;
        lifetime.models_all_time += model_count as u64;
        lifetime.sales_all_time = new_sales;
        lifetime.last_consolidation = Some(at);
        Ok(new_pool)
    }
}
