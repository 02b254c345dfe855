//! Composition root for the finance engine.
//!
//! Wires the registry and the four services around shared `Arc`s. The
//! reporting/UI layer consumes exactly this surface: it reads
//! `bank.snapshot()`, `earnings.aggregate()`, `ledger.list_by_period()`, and
//! the period history, and mutates only through the documented operations.
//! After a successful mutation, callers simply re-read; there is no refresh
//! primitive.

use std::sync::Arc;

use chrono::{Datelike, Utc};

use onlytop_shared::types::PeriodKey;
use onlytop_shared::FinanceConfig;

use crate::bank::BankLedger;
use crate::collaborators::{ModelDirectory, SalesSource};
use crate::consolidation::PeriodConsolidationEngine;
use crate::earnings::EarningsCalculator;
use crate::ledger::TransactionLedger;
use crate::period::PeriodRegistry;

/// The fully wired engine.
pub struct FinanceSystem {
    /// Period timeline and lock table.
    pub registry: Arc<PeriodRegistry>,
    /// Append-only transaction store.
    pub ledger: Arc<TransactionLedger>,
    /// Per-model earnings records.
    pub earnings: Arc<EarningsCalculator>,
    /// Capital pools.
    pub bank: Arc<BankLedger>,
    /// Period lifecycle driver.
    pub consolidation: Arc<PeriodConsolidationEngine>,
}

impl FinanceSystem {
    /// Builds a system whose first open period is the current calendar month.
    #[must_use]
    pub fn new(
        config: &FinanceConfig,
        sales: Arc<dyn SalesSource>,
        directory: Arc<dyn ModelDirectory>,
    ) -> Self {
        let now = Utc::now();
        // month() is always 1-12
        let initial = PeriodKey {
            month: u8::try_from(now.month()).unwrap_or(1),
            year: now.year(),
        };
        Self::with_initial_period(config, initial, sales, directory)
    }

    /// Builds a system with an explicit first open period. Tests use this to
    /// run independent timelines in parallel.
    #[must_use]
    pub fn with_initial_period(
        config: &FinanceConfig,
        initial: PeriodKey,
        sales: Arc<dyn SalesSource>,
        directory: Arc<dyn ModelDirectory>,
    ) -> Self {
        let registry = Arc::new(PeriodRegistry::new(initial));
        let ledger = Arc::new(TransactionLedger::new(
            registry.clone(),
            config.currency,
            config.min_revert_reason_len,
        ));
        let earnings = Arc::new(EarningsCalculator::new(
            registry.clone(),
            sales,
            directory,
            config.currency,
            config.bank_commission_pct,
        ));
        let bank = Arc::new(BankLedger::new(
            registry.clone(),
            ledger.clone(),
            earnings.clone(),
            config.currency,
        ));
        let consolidation = Arc::new(PeriodConsolidationEngine::new(
            registry.clone(),
            ledger.clone(),
            earnings.clone(),
            bank.clone(),
            config.confirmation_token.clone(),
        ));

        Self {
            registry,
            ledger,
            earnings,
            bank,
            consolidation,
        }
    }
}
