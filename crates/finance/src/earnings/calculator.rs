//! Per-model earnings calculation and aggregation.
//!
//! The calculator owns the `ModelEarnings` records. Calculation pulls sales
//! data from the injected `SalesSource`, applies the commission split, and
//! stores the result. Recomputation while the period is open replaces the
//! record wholesale; nothing is ever added on top of a previous run.

use std::sync::{Arc, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::{Decimal, RoundingStrategy};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use onlytop_shared::types::{Currency, ModelId, Money, PeriodId, PeriodKey};

use super::split::{reapply_bank_fee, split_net_sales, validate_percentage};
use super::types::{EarningsStatus, FinanceStats, ModelEarnings, TopModel};
use crate::collaborators::{ModelDirectory, SalesSource};
use crate::error::FinanceError;
use crate::period::PeriodRegistry;

/// Number of entries in the top-models ranking.
const TOP_MODELS: usize = 5;

/// Computes and stores per-model period earnings.
pub struct EarningsCalculator {
    registry: Arc<PeriodRegistry>,
    sales: Arc<dyn SalesSource>,
    directory: Arc<dyn ModelDirectory>,
    currency: Currency,
    default_bank_pct: Decimal,
    bank_pct_overrides: DashMap<PeriodKey, Decimal>,
    records: DashMap<(ModelId, PeriodKey), ModelEarnings>,
}

impl EarningsCalculator {
    /// Creates a calculator bound to a period registry and collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<PeriodRegistry>,
        sales: Arc<dyn SalesSource>,
        directory: Arc<dyn ModelDirectory>,
        currency: Currency,
        default_bank_pct: Decimal,
    ) -> Self {
        Self {
            registry,
            sales,
            directory,
            currency,
            default_bank_pct,
            bank_pct_overrides: DashMap::new(),
            records: DashMap::new(),
        }
    }

    /// The bank commission percentage in effect for a period.
    #[must_use]
    pub fn bank_pct(&self, period: PeriodKey) -> Decimal {
        self.bank_pct_overrides
            .get(&period)
            .map_or(self.default_bank_pct, |p| *p)
    }

    /// Looks up a model's earnings record for a period.
    #[must_use]
    pub fn get(&self, model: ModelId, period: PeriodKey) -> Option<ModelEarnings> {
        self.records.get(&(model, period)).map(|r| r.clone())
    }

    /// All earnings records of a period, ordered by model id.
    #[must_use]
    pub fn list_by_period(&self, period: PeriodKey) -> Vec<ModelEarnings> {
        let mut rows: Vec<ModelEarnings> = self
            .records
            .iter()
            .filter(|entry| entry.key().1 == period)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|r| r.model);
        rows
    }

    /// Number of earnings records in the period.
    #[must_use]
    pub fn count_for_period(&self, period: PeriodKey) -> usize {
        self.records
            .iter()
            .filter(|entry| entry.key().1 == period)
            .count()
    }

    /// Computes (or with `force`, recomputes) a model's earnings.
    ///
    /// The previous record, if any, is replaced entirely; downstream status
    /// and timestamps reset to a freshly calculated record.
    ///
    /// # Errors
    ///
    /// - `AlreadyCalculated` if a record exists and `force` is false
    /// - `PeriodClosed` if the period is consolidated or archived
    /// - `ExternalService` / `InvalidPercentage` from the sales data
    pub fn calculate(
        &self,
        model: ModelId,
        period: PeriodKey,
        force: bool,
    ) -> Result<ModelEarnings, FinanceError> {
        let lock = self.registry.lock(period);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.registry.ensure_open(period)?;

        let existed = self.records.contains_key(&(model, period));
        if existed && !force {
            return Err(FinanceError::AlreadyCalculated { model, period });
        }

        let net_sales = self.sales.net_sales(model, period)?;
        if net_sales.currency != self.currency {
            return Err(onlytop_shared::types::MoneyError::CurrencyMismatch {
                left: net_sales.currency,
                right: self.currency,
            }
            .into());
        }
        let agency_pct = self.sales.agency_commission_pct(model)?;
        let bank_pct = self.bank_pct(period);
        let split = split_net_sales(net_sales, agency_pct, bank_pct)?;

        let record = ModelEarnings {
            model,
            period,
            net_sales,
            agency_pct,
            agency_commission: split.agency_commission,
            bank_pct,
            bank_fee: split.bank_fee,
            model_share: split.model_share,
            company_share: split.company_share,
            status: EarningsStatus::Calculated,
            calculated_at: Utc::now(),
            approved_at: None,
            paid_at: None,
            notes: None,
            consolidated_period: None,
        };

        if existed {
            warn!(model = %model, period = %period, "earnings recomputed, previous record replaced");
        } else {
            info!(model = %model, period = %period, net_sales = %net_sales.amount, "earnings calculated");
        }
        self.records.insert((model, period), record.clone());
        Ok(record)
    }

    /// Runs `calculate` for every active model in the directory.
    ///
    /// Without `force`, models that already have a record are skipped rather
    /// than rejected; the returned list covers only freshly written records.
    ///
    /// # Errors
    ///
    /// Stops at the first failing model and propagates its error.
    pub fn calculate_all(
        &self,
        period: PeriodKey,
        force: bool,
    ) -> Result<Vec<ModelEarnings>, FinanceError> {
        let mut out = Vec::new();
        for profile in self.directory.list_active_models() {
            if !force && self.records.contains_key(&(profile.id, period)) {
                continue;
            }
            out.push(self.calculate(profile.id, period, force)?);
        }
        Ok(out)
    }

    /// Changes the bank commission percentage for a whole period.
    ///
    /// Every stored record re-derives `bank_fee` and `company_share` from
    /// its frozen `agency_commission`; returns the number of records
    /// touched. Subsequent `calculate` calls for the period pick up the new
    /// percentage as well.
    ///
    /// # Errors
    ///
    /// - `InvalidPercentage` outside 0-100
    /// - `PeriodNotFound` / `PeriodClosed` for unknown or terminal periods
    pub fn update_bank_commission(
        &self,
        period: PeriodKey,
        pct: Decimal,
    ) -> Result<usize, FinanceError> {
        validate_percentage(pct)?;

        let lock = self.registry.lock(period);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.registry.check_open(period)?;

        self.bank_pct_overrides.insert(period, pct);

        let mut affected = 0usize;
        for mut entry in self.records.iter_mut() {
            if entry.key().1 != period {
                continue;
            }
            let (bank_fee, company_share) = reapply_bank_fee(entry.agency_commission, pct)?;
            let record = entry.value_mut();
            record.bank_pct = pct;
            record.bank_fee = bank_fee;
            record.company_share = company_share;
            affected += 1;
        }

        info!(period = %period, pct = %pct, affected, "bank commission reapplied");
        Ok(affected)
    }

    /// Aggregates a period's earnings into totals, averages, and a top-N
    /// ranking.
    ///
    /// # Errors
    ///
    /// Propagates `CurrencyMismatch` from corrupted records.
    pub fn aggregate(&self, period: PeriodKey) -> Result<FinanceStats, FinanceError> {
        self.aggregate_inner(period, None)
    }

    /// Like [`aggregate`](Self::aggregate), but aborts with `Cancelled` once
    /// the token fires. A cancelled read has no side effects.
    pub fn aggregate_with_cancel(
        &self,
        period: PeriodKey,
        cancel: &CancellationToken,
    ) -> Result<FinanceStats, FinanceError> {
        self.aggregate_inner(period, Some(cancel))
    }

    fn aggregate_inner(
        &self,
        period: PeriodKey,
        cancel: Option<&CancellationToken>,
    ) -> Result<FinanceStats, FinanceError> {
        let rows = self.list_by_period(period);

        let zero = Money::zero(self.currency);
        let mut total_net_sales = zero;
        let mut total_agency_commission = zero;
        let mut total_bank_fee = zero;
        let mut total_model_share = zero;
        let mut total_company_share = zero;

        for row in &rows {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(FinanceError::Cancelled);
                }
            }
            total_net_sales = total_net_sales.add(row.net_sales)?;
            total_agency_commission = total_agency_commission.add(row.agency_commission)?;
            total_bank_fee = total_bank_fee.add(row.bank_fee)?;
            total_model_share = total_model_share.add(row.model_share)?;
            total_company_share = total_company_share.add(row.company_share)?;
        }

        let model_count = rows.len();
        let avg_net_sales = average(total_net_sales, model_count);
        let avg_company_share = average(total_company_share, model_count);

        let mut ranked = rows;
        ranked.sort_by(|a, b| {
            b.company_share
                .amount
                .cmp(&a.company_share.amount)
                .then(a.model.cmp(&b.model))
        });
        let top_models = ranked
            .into_iter()
            .take(TOP_MODELS)
            .map(|r| TopModel {
                model: r.model,
                company_share: r.company_share,
                net_sales: r.net_sales,
            })
            .collect();

        Ok(FinanceStats {
            period,
            model_count,
            total_net_sales,
            total_agency_commission,
            total_bank_fee,
            total_model_share,
            total_company_share,
            avg_net_sales,
            avg_company_share,
            top_models,
        })
    }

    /// Moves a calculated record into manual review.
    ///
    /// # Errors
    ///
    /// `EarningsNotFound`, `PeriodClosed`, or `InvalidEarningsTransition`.
    pub fn submit_for_review(
        &self,
        model: ModelId,
        period: PeriodKey,
    ) -> Result<ModelEarnings, FinanceError> {
        self.transition(model, period, EarningsStatus::PendingReview, |record| {
            record.status = EarningsStatus::PendingReview;
        })
    }

    /// Approves a record under review, stamping the approval time.
    ///
    /// # Errors
    ///
    /// `EarningsNotFound`, `PeriodClosed`, or `InvalidEarningsTransition`.
    pub fn approve(
        &self,
        model: ModelId,
        period: PeriodKey,
        notes: Option<String>,
    ) -> Result<ModelEarnings, FinanceError> {
        self.transition(model, period, EarningsStatus::Approved, |record| {
            record.status = EarningsStatus::Approved;
            record.approved_at = Some(Utc::now());
            record.notes = notes;
        })
    }

    /// Marks an approved record as paid, stamping the payout time.
    ///
    /// # Errors
    ///
    /// `EarningsNotFound`, `PeriodClosed`, or `InvalidEarningsTransition`.
    pub fn mark_paid(
        &self,
        model: ModelId,
        period: PeriodKey,
    ) -> Result<ModelEarnings, FinanceError> {
        self.transition(model, period, EarningsStatus::Paid, |record| {
            record.status = EarningsStatus::Paid;
            record.paid_at = Some(Utc::now());
        })
    }

    fn transition(
        &self,
        model: ModelId,
        period: PeriodKey,
        to: EarningsStatus,
        apply: impl FnOnce(&mut ModelEarnings),
    ) -> Result<ModelEarnings, FinanceError> {
        let lock = self.registry.lock(period);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.registry.check_open(period)?;

        let mut entry = self
            .records
            .get_mut(&(model, period))
            .ok_or(FinanceError::EarningsNotFound { model, period })?;

        let allowed = matches!(
            (entry.status, to),
            (EarningsStatus::Calculated, EarningsStatus::PendingReview)
                | (EarningsStatus::PendingReview, EarningsStatus::Approved)
                | (EarningsStatus::Approved, EarningsStatus::Paid)
        );
        if !allowed {
            return Err(FinanceError::InvalidEarningsTransition {
                from: entry.status,
                to,
            });
        }

        apply(entry.value_mut());
        let updated = entry.value().clone();
        info!(model = %model, period = %period, status = updated.status.as_str(), "earnings status changed");
        Ok(updated)
    }

    /// Stamps every record of the period with the consolidated period id.
    /// Called by the consolidation engine under the period lock.
    pub(crate) fn tag_consolidated(&self, period: PeriodKey, id: PeriodId) {
        for mut entry in self.records.iter_mut() {
            if entry.key().1 == period {
                entry.value_mut().consolidated_period = Some(id);
            }
        }
    }
}

/// Average of a total over `count` records, rounded half away from zero at
/// the currency's minor-unit boundary. Zero records yield a zero average.
fn average(total: Money, count: usize) -> Money {
    if count == 0 {
        return Money::zero(total.currency);
    }
    let raw = total.amount / Decimal::from(count as u64);
    Money::new(
        raw.round_dp_with_strategy(
            total.currency.decimal_places(),
            RoundingStrategy::MidpointAwayFromZero,
        ),
        total.currency,
    )
}
