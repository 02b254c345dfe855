//! Commission split math.
//!
//! Splits a model's net sales into the agency commission, the model's share,
//! the bank fee, and the company's net share. Rounded multiplications use
//! half-away-from-zero at the minor-unit boundary; the residual share of each
//! step is derived by subtraction, so the shares reconstruct the original
//! amount exactly for any percentage pair. Any rounding remainder therefore
//! lands on the company's side of the split.

use rust_decimal::Decimal;

use onlytop_shared::types::Money;

use crate::error::FinanceError;

/// The four-way split of one model's net sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarningsSplit {
    /// The agency's cut of net sales (company gross margin).
    pub agency_commission: Money,
    /// What the model keeps: `net_sales - agency_commission`.
    pub model_share: Money,
    /// Bank's cut of the agency commission.
    pub bank_fee: Money,
    /// Company net share: `agency_commission - bank_fee`.
    pub company_share: Money,
}

/// Validates a percentage is within 0-100 inclusive.
pub(crate) fn validate_percentage(pct: Decimal) -> Result<(), FinanceError> {
    if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
        return Err(FinanceError::InvalidPercentage(pct));
    }
    Ok(())
}

/// Splits net sales between model, bank, and company.
///
/// The bank fee is charged against the company's gross margin, never the
/// model's share.
///
/// # Errors
///
/// Returns `InvalidPercentage` for percentages outside 0-100 and
/// `CurrencyMismatch` never in practice (all shares derive from one amount).
pub fn split_net_sales(
    net_sales: Money,
    agency_pct: Decimal,
    bank_pct: Decimal,
) -> Result<EarningsSplit, FinanceError> {
    validate_percentage(agency_pct)?;
    validate_percentage(bank_pct)?;

    let agency_commission = net_sales.multiply_by_percentage(agency_pct);
    let model_share = net_sales.subtract(agency_commission)?;
    let (bank_fee, company_share) = reapply_bank_fee(agency_commission, bank_pct)?;

    Ok(EarningsSplit {
        agency_commission,
        model_share,
        bank_fee,
        company_share,
    })
}

/// Re-derives the bank fee and company share from a stored agency
/// commission, used when the bank percentage changes for a whole period.
///
/// # Errors
///
/// Returns `InvalidPercentage` for percentages outside 0-100.
pub fn reapply_bank_fee(
    agency_commission: Money,
    bank_pct: Decimal,
) -> Result<(Money, Money), FinanceError> {
    validate_percentage(bank_pct)?;
    let bank_fee = agency_commission.multiply_by_percentage(bank_pct);
    let company_share = agency_commission.subtract(bank_fee)?;
    Ok((bank_fee, company_share))
}
