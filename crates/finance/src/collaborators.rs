//! Trait seams for the out-of-scope collaborator systems.
//!
//! The engine never imports sales or talent data itself; callers inject
//! implementations of these traits (an API client in production, fixed
//! fakes in tests).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use onlytop_shared::types::{ModelId, Money, PeriodKey};

use crate::error::FinanceError;

/// Source of per-model sales figures and agreed commission terms.
pub trait SalesSource: Send + Sync {
    /// Net sales for a model in a period, in the ledger currency.
    ///
    /// # Errors
    ///
    /// Returns `ExternalService` when the figure cannot be obtained.
    fn net_sales(&self, model: ModelId, period: PeriodKey) -> Result<Money, FinanceError>;

    /// The model's agreed agency commission percentage (0-100).
    ///
    /// # Errors
    ///
    /// Returns `ExternalService` when the model is unknown to the source.
    fn agency_commission_pct(&self, model: ModelId) -> Result<Decimal, FinanceError>;
}

/// Roster entry returned by the model directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Unique model identifier.
    pub id: ModelId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Agreed agency commission percentage (0-100).
    pub agency_commission_pct: Decimal,
}

/// Directory of currently active models.
pub trait ModelDirectory: Send + Sync {
    /// All models that should appear in a period calculation run.
    fn list_active_models(&self) -> Vec<ModelProfile>;
}
