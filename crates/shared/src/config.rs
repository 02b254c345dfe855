//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::Currency;

/// Finance engine configuration.
///
/// Every option has a default, so an empty source yields a working
/// configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FinanceConfig {
    /// Bank commission percentage applied to the company's gross margin.
    #[serde(default = "default_bank_commission_pct")]
    pub bank_commission_pct: Decimal,
    /// Minimum accepted length for a reversal reason.
    #[serde(default = "default_min_revert_reason_len")]
    pub min_revert_reason_len: usize,
    /// Literal the caller must supply to confirm a consolidation.
    #[serde(default = "default_confirmation_token")]
    pub confirmation_token: String,
    /// Ledger currency; every recorded amount must carry it.
    #[serde(default = "default_currency")]
    pub currency: Currency,
}

fn default_bank_commission_pct() -> Decimal {
    Decimal::new(20, 1) // 2.0
}

fn default_min_revert_reason_len() -> usize {
    10
}

fn default_confirmation_token() -> String {
    "CONSOLIDAR".to_string()
}

fn default_currency() -> Currency {
    Currency::Usd
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            bank_commission_pct: default_bank_commission_pct(),
            min_revert_reason_len: default_min_revert_reason_len(),
            confirmation_token: default_confirmation_token(),
            currency: default_currency(),
        }
    }
}

impl FinanceConfig {
    /// Loads configuration from config files and environment.
    ///
    /// Sources, later overriding earlier: `config/default`,
    /// `config/<RUN_MODE>`, then `ONLYTOP__`-prefixed environment variables
    /// (e.g. `ONLYTOP__BANK_COMMISSION_PCT=2.5`).
    ///
    /// # Errors
    ///
    /// Returns an error if a source exists but cannot be parsed.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("ONLYTOP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = FinanceConfig::default();
        assert_eq!(config.bank_commission_pct, dec!(2.0));
        assert_eq!(config.min_revert_reason_len, 10);
        assert_eq!(config.confirmation_token, "CONSOLIDAR");
        assert_eq!(config.currency, Currency::Usd);
    }

    #[test]
    fn test_defaults_apply_to_empty_source() {
        let config: FinanceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.bank_commission_pct, dec!(2.0));
        assert_eq!(config.confirmation_token, "CONSOLIDAR");
    }

    #[test]
    fn test_partial_override() {
        let config: FinanceConfig =
            serde_json::from_str(r#"{"bank_commission_pct": "3.5", "currency": "EUR"}"#).unwrap();
        assert_eq!(config.bank_commission_pct, dec!(3.5));
        assert_eq!(config.currency, Currency::Eur);
        assert_eq!(config.min_revert_reason_len, 10);
    }
}
