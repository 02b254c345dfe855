//! Period registry: the explicit home of the "current open period".
//!
//! The registry is injected into every component instead of living as
//! ambient global state, so tests can run several independent period
//! timelines in parallel. It also owns the per-period lock table that
//! serializes every write against a given period.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use onlytop_shared::types::PeriodKey;

use super::types::{ConsolidationSummary, Period, PeriodStatus};
use crate::error::FinanceError;

/// Registry of accounting periods and their exclusive write locks.
pub struct PeriodRegistry {
    periods: DashMap<PeriodKey, Period>,
    locks: DashMap<PeriodKey, Arc<Mutex<()>>>,
    current: RwLock<PeriodKey>,
}

impl PeriodRegistry {
    /// Creates a registry with the given period open and current.
    #[must_use]
    pub fn new(initial: PeriodKey) -> Self {
        let periods = DashMap::new();
        periods.insert(initial, Period::open(initial));
        Self {
            periods,
            locks: DashMap::new(),
            current: RwLock::new(initial),
        }
    }

    /// The key of the currently open period.
    #[must_use]
    pub fn current_open(&self) -> PeriodKey {
        *self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The exclusive lock for a period.
    ///
    /// Writers hold it for the duration of a single record/revert/calculate
    /// call; consolidation holds it across its whole snapshot-and-commit
    /// sequence. Locks are never nested across periods.
    #[must_use]
    pub fn lock(&self, key: PeriodKey) -> Arc<Mutex<()>> {
        self.locks.entry(key).or_default().clone()
    }

    /// Looks up a period record.
    #[must_use]
    pub fn get(&self, key: PeriodKey) -> Option<Period> {
        self.periods.get(&key).map(|p| p.clone())
    }

    /// All period records, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Period> {
        let mut all: Vec<Period> = self.periods.iter().map(|p| p.clone()).collect();
        all.sort_by_key(|p| p.key);
        all
    }

    /// Opens the period implicitly if this is the first write against a new
    /// month/year; rejects the write if the period left the open states.
    ///
    /// Callers must hold the period's lock.
    pub(crate) fn ensure_open(&self, key: PeriodKey) -> Result<(), FinanceError> {
        match self.periods.entry(key) {
            Entry::Occupied(entry) => {
                if entry.get().status.allows_posting() {
                    Ok(())
                } else {
                    Err(FinanceError::PeriodClosed(key))
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Period::open(key));
                info!(period = %key, "period opened implicitly on first write");
                Ok(())
            }
        }
    }

    /// Verifies an existing period still accepts writes, without creating it.
    ///
    /// Callers must hold the period's lock; the re-check after acquisition is
    /// what makes a revert racing a consolidation fail instead of silently
    /// succeeding against a closed period.
    pub(crate) fn check_open(&self, key: PeriodKey) -> Result<(), FinanceError> {
        let period = self
            .periods
            .get(&key)
            .ok_or(FinanceError::PeriodNotFound(key))?;
        if period.status.allows_posting() {
            Ok(())
        } else {
            Err(FinanceError::PeriodClosed(key))
        }
    }

    /// Moves an open period into manual review.
    pub(crate) fn begin_review(&self, key: PeriodKey) -> Result<Period, FinanceError> {
        let mut period = self
            .periods
            .get_mut(&key)
            .ok_or(FinanceError::PeriodNotFound(key))?;
        match period.status {
            PeriodStatus::Open => {
                period.status = PeriodStatus::InReview;
                Ok(period.clone())
            }
            from => Err(FinanceError::InvalidPeriodTransition {
                period: key,
                from,
                to: PeriodStatus::InReview,
            }),
        }
    }

    /// Flips a period to consolidated, freezing its summary.
    ///
    /// The consolidation engine validates state beforehand and holds the
    /// period lock; this only commits the already-validated transition.
    pub(crate) fn mark_consolidated(
        &self,
        key: PeriodKey,
        summary: ConsolidationSummary,
        closing_notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Period, FinanceError> {
        let mut period = self
            .periods
            .get_mut(&key)
            .ok_or(FinanceError::PeriodNotFound(key))?;
        period.status = PeriodStatus::Consolidated;
        period.summary = Some(summary);
        period.closing_notes = closing_notes;
        period.consolidated_at = Some(at);
        Ok(period.clone())
    }

    /// Archives a consolidated period.
    pub(crate) fn archive(&self, key: PeriodKey) -> Result<Period, FinanceError> {
        let mut period = self
            .periods
            .get_mut(&key)
            .ok_or(FinanceError::PeriodNotFound(key))?;
        match period.status {
            PeriodStatus::Consolidated => {
                period.status = PeriodStatus::Closed;
                Ok(period.clone())
            }
            from => Err(FinanceError::InvalidPeriodTransition {
                period: key,
                from,
                to: PeriodStatus::Closed,
            }),
        }
    }

    /// Opens the period following `after` and, when `after` was the current
    /// period, makes the new one current. An existing record is left intact.
    pub(crate) fn open_next(&self, after: PeriodKey) -> PeriodKey {
        let next = after.next();
        if let Entry::Vacant(entry) = self.periods.entry(next) {
            entry.insert(Period::open(next));
        }
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if *current == after {
            *current = next;
            info!(period = %next, "new current period opened");
        }
        next
    }
}
