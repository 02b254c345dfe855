//! Atomic period consolidation.
//!
//! Consolidation is the one irreversible operation in the engine: it
//! snapshots the period's totals, transfers the in-movement capital into the
//! consolidated pool, seals every record in the period, and opens the next
//! month. The whole sequence runs under the period's exclusive lock, with
//! every fallible step ordered before the first write, so a failed call
//! leaves the period exactly as it was.

use std::sync::{Arc, PoisonError};

use chrono::Utc;
use subtle::ConstantTimeEq;
use tracing::info;

use onlytop_shared::types::PeriodKey;

use crate::bank::BankLedger;
use crate::earnings::EarningsCalculator;
use crate::error::FinanceError;
use crate::ledger::TransactionLedger;
use crate::period::{ConsolidationSummary, Period, PeriodRegistry};

/// Drives the period lifecycle: review, consolidation, archival.
pub struct PeriodConsolidationEngine {
    registry: Arc<PeriodRegistry>,
    ledger: Arc<TransactionLedger>,
    earnings: Arc<EarningsCalculator>,
    bank: Arc<BankLedger>,
    confirmation_token: String,
}

impl PeriodConsolidationEngine {
    /// Creates an engine over the shared components.
    #[must_use]
    pub fn new(
        registry: Arc<PeriodRegistry>,
        ledger: Arc<TransactionLedger>,
        earnings: Arc<EarningsCalculator>,
        bank: Arc<BankLedger>,
        confirmation_token: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            ledger,
            earnings,
            bank,
            confirmation_token: confirmation_token.into(),
        }
    }

    /// Moves an open period into manual review.
    ///
    /// # Errors
    ///
    /// `PeriodNotFound` or `InvalidPeriodTransition`.
    pub fn begin_review(&self, period: PeriodKey) -> Result<Period, FinanceError> {
        let lock = self.registry.lock(period);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let record = self.registry.begin_review(period)?;
        info!(period = %period, "period moved into review");
        Ok(record)
    }

    /// Consolidates a period, permanently sealing it against writes.
    ///
    /// On success: totals are snapshotted, the in-movement capital joins the
    /// consolidated pool, every transaction and earnings record is tagged
    /// with the period's id, the period flips to CONSOLIDADO, and the next
    /// month opens as the new current period.
    ///
    /// # Errors
    ///
    /// - `InvalidConfirmation` unless `confirmation` equals the configured
    ///   literal (compared in constant time; a friction gate, not auth)
    /// - `PeriodNotFound` for unknown keys
    /// - `AlreadyConsolidated` if the period already left the open states
    /// - `EmptyPeriod` with zero active transactions and zero earnings
    pub fn consolidate(
        &self,
        period: PeriodKey,
        confirmation: &str,
        closing_notes: Option<String>,
    ) -> Result<Period, FinanceError> {
        if !bool::from(
            self.confirmation_token
                .as_bytes()
                .ct_eq(confirmation.as_bytes()),
        ) {
            return Err(FinanceError::InvalidConfirmation);
        }

        let lock = self.registry.lock(period);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let record = self
            .registry
            .get(period)
            .ok_or(FinanceError::PeriodNotFound(period))?;
        if !record.status.allows_posting() {
            return Err(FinanceError::AlreadyConsolidated(period));
        }

        if self.ledger.active_count(period) == 0 && self.earnings.count_for_period(period) == 0 {
            return Err(FinanceError::EmptyPeriod(period));
        }

        // Everything below this point that can fail runs before the first
        // write; the capital transfer itself computes before it assigns.
        let stats = self.earnings.aggregate(period)?;
        let totals = self.ledger.sum_active(period)?;
        let moving = totals.net.add(stats.total_company_share)?;
        let now = Utc::now();

        let new_pool = self
            .bank
            .apply_consolidation(moving, stats.model_count, stats.total_net_sales, now)?;

        self.ledger.tag_consolidated(period, record.id);
        self.earnings.tag_consolidated(period, record.id);

        let summary = ConsolidationSummary {
            total_net_sales: stats.total_net_sales,
            total_company_share: stats.total_company_share,
            model_count: stats.model_count,
            top_models: stats.top_models,
        };
        let sealed = self
            .registry
            .mark_consolidated(period, summary, closing_notes, now)?;
        let next = self.registry.open_next(period);

        info!(
            period = %period,
            moving = %moving.amount,
            consolidated = %new_pool.amount,
            next_period = %next,
            "period consolidated"
        );
        Ok(sealed)
    }

    /// Archives a consolidated period. Purely a bookkeeping marker; the
    /// period was already sealed at consolidation.
    ///
    /// # Errors
    ///
    /// `PeriodNotFound` or `InvalidPeriodTransition`.
    pub fn archive(&self, period: PeriodKey) -> Result<Period, FinanceError> {
        let lock = self.registry.lock(period);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let record = self.registry.archive(period)?;
        info!(period = %period, "period archived");
        Ok(record)
    }

    /// Consolidated-period history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Period> {
        self.registry.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{ModelDirectory, ModelProfile, SalesSource};
    use crate::ledger::{TransactionKind, TransactionOrigin};
    use crate::period::PeriodStatus;
    use onlytop_shared::types::{Currency, ModelId, Money};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct StubSales {
        net: Decimal,
        pct: Decimal,
        models: Vec<ModelId>,
    }

    impl SalesSource for StubSales {
        fn net_sales(&self, _model: ModelId, _period: PeriodKey) -> Result<Money, FinanceError> {
            Ok(Money::new(self.net, Currency::Usd))
        }

        fn agency_commission_pct(&self, _model: ModelId) -> Result<Decimal, FinanceError> {
            Ok(self.pct)
        }
    }

    impl ModelDirectory for StubSales {
        fn list_active_models(&self) -> Vec<ModelProfile> {
            self.models
                .iter()
                .map(|id| ModelProfile {
                    id: *id,
                    name: "model".to_string(),
                    email: "model@example.com".to_string(),
                    agency_commission_pct: self.pct,
                })
                .collect()
        }
    }

    struct Fixture {
        ledger: Arc<TransactionLedger>,
        earnings: Arc<EarningsCalculator>,
        bank: Arc<BankLedger>,
        engine: PeriodConsolidationEngine,
    }

    fn period() -> PeriodKey {
        PeriodKey::new(3, 2025).unwrap()
    }

    fn fixture(net: Decimal, pct: Decimal, models: Vec<ModelId>) -> Fixture {
        let registry = Arc::new(PeriodRegistry::new(period()));
        let ledger = Arc::new(TransactionLedger::new(registry.clone(), Currency::Usd, 10));
        let sales = Arc::new(StubSales { net, pct, models });
        let earnings = Arc::new(EarningsCalculator::new(
            registry.clone(),
            sales.clone(),
            sales,
            Currency::Usd,
            dec!(2),
        ));
        let bank = Arc::new(BankLedger::new(
            registry.clone(),
            ledger.clone(),
            earnings.clone(),
            Currency::Usd,
        ));
        let engine = PeriodConsolidationEngine::new(
            registry,
            ledger.clone(),
            earnings.clone(),
            bank.clone(),
            "CONSOLIDAR",
        );
        Fixture {
            ledger,
            earnings,
            bank,
            engine,
        }
    }

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::Usd)
    }

    #[test]
    fn test_wrong_confirmation_rejected() {
        let fx = fixture(dec!(0), dec!(0), vec![]);
        assert!(matches!(
            fx.engine.consolidate(period(), "CONSOLIDATE", None),
            Err(FinanceError::InvalidConfirmation)
        ));
        assert!(matches!(
            fx.engine.consolidate(period(), "", None),
            Err(FinanceError::InvalidConfirmation)
        ));
    }

    #[test]
    fn test_empty_period_rejected() {
        let fx = fixture(dec!(0), dec!(0), vec![]);
        assert!(matches!(
            fx.engine.consolidate(period(), "CONSOLIDAR", None),
            Err(FinanceError::EmptyPeriod(_))
        ));
        // the failed call left the period open
        assert_eq!(
            fx.engine.history()[0].status,
            PeriodStatus::Open
        );
    }

    #[test]
    fn test_unknown_period_rejected() {
        let fx = fixture(dec!(0), dec!(0), vec![]);
        assert!(matches!(
            fx.engine
                .consolidate(PeriodKey::new(9, 2030).unwrap(), "CONSOLIDAR", None),
            Err(FinanceError::PeriodNotFound(_))
        ));
    }

    #[test]
    fn test_consolidation_transfers_capital_and_seals() {
        let model = ModelId::new();
        let fx = fixture(dec!(10000), dec!(20), vec![model]);

        fx.ledger
            .record(
                TransactionKind::Income,
                TransactionOrigin::Sale,
                usd(dec!(5000)),
                "sales import",
                period(),
            )
            .unwrap();
        fx.earnings.calculate(model, period(), false).unwrap();

        let before = fx.bank.snapshot().unwrap();
        // 5000 net + 1960 company share
        assert_eq!(before.in_movement.amount, dec!(6960));
        assert!(before.consolidated.is_zero());

        let sealed = fx
            .engine
            .consolidate(period(), "CONSOLIDAR", Some("March close".to_string()))
            .unwrap();
        assert_eq!(sealed.status, PeriodStatus::Consolidated);
        assert!(sealed.consolidated_at.is_some());
        assert_eq!(sealed.closing_notes.as_deref(), Some("March close"));

        let summary = sealed.summary.unwrap();
        assert_eq!(summary.total_net_sales.amount, dec!(10000));
        assert_eq!(summary.total_company_share.amount, dec!(1960));
        assert_eq!(summary.model_count, 1);
        assert_eq!(summary.top_models.len(), 1);
        assert_eq!(summary.top_models[0].model, model);

        // monotonicity: pool absorbed exactly the pre-call in-movement,
        // and the new open period starts from zero
        let after = fx.bank.snapshot().unwrap();
        assert_eq!(after.consolidated.amount, dec!(6960));
        assert!(after.in_movement.is_zero());
        assert_eq!(after.total.amount, dec!(6960));
        assert_eq!(after.current_period, PeriodKey::new(4, 2025).unwrap());
        assert_eq!(after.periods_consolidated, 1);
        assert_eq!(after.models_all_time, 1);
        assert_eq!(after.sales_all_time.amount, dec!(10000));

        // records were tagged with the sealed period's id
        let page = fx.ledger.list_by_period(
            period(),
            crate::ledger::TransactionFilter::default(),
            &onlytop_shared::types::PageRequest::default(),
        );
        assert!(page
            .data
            .iter()
            .all(|tx| tx.consolidated_period == Some(sealed.id)));
        let record = fx.earnings.get(model, period()).unwrap();
        assert_eq!(record.consolidated_period, Some(sealed.id));
    }

    #[test]
    fn test_double_consolidation_rejected() {
        let fx = fixture(dec!(0), dec!(0), vec![]);
        fx.ledger
            .record(
                TransactionKind::Income,
                TransactionOrigin::Sale,
                usd(dec!(100)),
                "sale",
                period(),
            )
            .unwrap();

        fx.engine.consolidate(period(), "CONSOLIDAR", None).unwrap();
        assert!(matches!(
            fx.engine.consolidate(period(), "CONSOLIDAR", None),
            Err(FinanceError::AlreadyConsolidated(_))
        ));

        // exactly one transfer happened
        let snapshot = fx.bank.snapshot().unwrap();
        assert_eq!(snapshot.consolidated.amount, dec!(100));
        assert_eq!(snapshot.periods_consolidated, 1);
    }

    #[test]
    fn test_terminal_lock_after_consolidation() {
        let model = ModelId::new();
        let fx = fixture(dec!(1000), dec!(20), vec![model]);
        let tx = fx
            .ledger
            .record(
                TransactionKind::Income,
                TransactionOrigin::Sale,
                usd(dec!(100)),
                "sale",
                period(),
            )
            .unwrap();
        fx.earnings.calculate(model, period(), false).unwrap();

        fx.engine.consolidate(period(), "CONSOLIDAR", None).unwrap();

        assert!(matches!(
            fx.ledger.record(
                TransactionKind::Income,
                TransactionOrigin::Sale,
                usd(dec!(100)),
                "late sale",
                period(),
            ),
            Err(FinanceError::PeriodClosed(_))
        ));
        assert!(matches!(
            fx.ledger.revert(tx.id, "late reversal attempt", "ops"),
            Err(FinanceError::PeriodClosed(_))
        ));
        assert!(matches!(
            fx.earnings.calculate(model, period(), true),
            Err(FinanceError::PeriodClosed(_))
        ));
        assert!(matches!(
            fx.earnings.update_bank_commission(period(), dec!(3)),
            Err(FinanceError::PeriodClosed(_))
        ));
        assert!(matches!(
            fx.earnings.submit_for_review(model, period()),
            Err(FinanceError::PeriodClosed(_))
        ));
    }

    #[test]
    fn test_consolidate_from_review_state() {
        let fx = fixture(dec!(0), dec!(0), vec![]);
        fx.ledger
            .record(
                TransactionKind::Income,
                TransactionOrigin::Sale,
                usd(dec!(50)),
                "sale",
                period(),
            )
            .unwrap();

        let reviewed = fx.engine.begin_review(period()).unwrap();
        assert_eq!(reviewed.status, PeriodStatus::InReview);

        let sealed = fx.engine.consolidate(period(), "CONSOLIDAR", None).unwrap();
        assert_eq!(sealed.status, PeriodStatus::Consolidated);
    }

    #[test]
    fn test_archive_after_consolidation() {
        let fx = fixture(dec!(0), dec!(0), vec![]);
        fx.ledger
            .record(
                TransactionKind::Income,
                TransactionOrigin::Sale,
                usd(dec!(50)),
                "sale",
                period(),
            )
            .unwrap();

        assert!(fx.engine.archive(period()).is_err());
        fx.engine.consolidate(period(), "CONSOLIDAR", None).unwrap();
        let archived = fx.engine.archive(period()).unwrap();
        assert_eq!(archived.status, PeriodStatus::Closed);

        // archival does not touch the pools
        let snapshot = fx.bank.snapshot().unwrap();
        assert_eq!(snapshot.consolidated.amount, dec!(50));
        assert_eq!(snapshot.periods_consolidated, 1);
    }

    #[test]
    fn test_history_shows_sealed_and_new_period() {
        let fx = fixture(dec!(0), dec!(0), vec![]);
        fx.ledger
            .record(
                TransactionKind::Income,
                TransactionOrigin::Sale,
                usd(dec!(50)),
                "sale",
                period(),
            )
            .unwrap();
        fx.engine.consolidate(period(), "CONSOLIDAR", None).unwrap();

        let history = fx.engine.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].key, period());
        assert_eq!(history[0].status, PeriodStatus::Consolidated);
        assert_eq!(history[1].key, PeriodKey::new(4, 2025).unwrap());
        assert_eq!(history[1].status, PeriodStatus::Open);
    }
}
