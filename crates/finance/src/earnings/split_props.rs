//! Property-based tests for the commission split.
//!
//! The reconciliation identity must hold exactly for every amount and
//! percentage pair: no cent is ever lost or created by rounding.

use proptest::prelude::*;
use rust_decimal::Decimal;

use onlytop_shared::types::{Currency, Money};

use super::split::split_net_sales;

/// Strategy for cent amounts (0.00 to 100,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for percentages with basis-point precision (0.00 to 100.00).
fn percentage() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|bp| Decimal::new(bp, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// model_share + agency_commission == net_sales, exactly.
    #[test]
    fn prop_gross_split_reconstructs_net_sales(
        net in amount(),
        agency_pct in percentage(),
        bank_pct in percentage(),
    ) {
        let net_sales = Money::new(net, Currency::Usd);
        let split = split_net_sales(net_sales, agency_pct, bank_pct).unwrap();

        let rebuilt = split.model_share.add(split.agency_commission).unwrap();
        prop_assert_eq!(rebuilt.amount, net);
    }

    /// model_share + bank_fee + company_share == net_sales, exactly.
    #[test]
    fn prop_full_split_reconstructs_net_sales(
        net in amount(),
        agency_pct in percentage(),
        bank_pct in percentage(),
    ) {
        let net_sales = Money::new(net, Currency::Usd);
        let split = split_net_sales(net_sales, agency_pct, bank_pct).unwrap();

        let rebuilt = split
            .model_share
            .add(split.bank_fee)
            .unwrap()
            .add(split.company_share)
            .unwrap();
        prop_assert_eq!(rebuilt.amount, net);
    }

    /// The bank fee never exceeds the agency commission, and no share goes
    /// negative for non-negative inputs.
    #[test]
    fn prop_shares_stay_in_bounds(
        net in amount(),
        agency_pct in percentage(),
        bank_pct in percentage(),
    ) {
        let net_sales = Money::new(net, Currency::Usd);
        let split = split_net_sales(net_sales, agency_pct, bank_pct).unwrap();

        prop_assert!(!split.agency_commission.is_negative());
        prop_assert!(!split.model_share.is_negative());
        prop_assert!(!split.bank_fee.is_negative());
        prop_assert!(!split.company_share.is_negative());
        prop_assert!(
            split.bank_fee.compare(split.agency_commission).unwrap()
                != std::cmp::Ordering::Greater
        );
    }

    /// Splitting is deterministic: same inputs, same shares.
    #[test]
    fn prop_split_is_deterministic(
        net in amount(),
        agency_pct in percentage(),
        bank_pct in percentage(),
    ) {
        let net_sales = Money::new(net, Currency::Usd);
        let first = split_net_sales(net_sales, agency_pct, bank_pct).unwrap();
        let second = split_net_sales(net_sales, agency_pct, bank_pct).unwrap();
        prop_assert_eq!(first, second);
    }
}
