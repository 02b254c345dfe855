//! Property-based tests for the transaction ledger.
//!
//! - Reversal exclusion: reverted transactions contribute zero to period
//!   totals for every ordering of record/revert calls.
//! - Totals additivity: net always equals active income minus active expense.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

use onlytop_shared::types::{Currency, Money, PeriodKey};

use super::service::TransactionLedger;
use super::types::{TransactionKind, TransactionOrigin};
use crate::period::PeriodRegistry;

/// Strategy for positive cent amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn kind_strategy() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![
        Just(TransactionKind::Income),
        Just(TransactionKind::Expense),
    ]
}

fn period() -> PeriodKey {
    PeriodKey::new(3, 2025).unwrap()
}

fn fresh_ledger() -> TransactionLedger {
    TransactionLedger::new(Arc::new(PeriodRegistry::new(period())), Currency::Usd, 10)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any mix of recorded movements, net equals the signed sum of the
    /// individual amounts.
    #[test]
    fn prop_net_is_signed_sum(
        entries in prop::collection::vec((kind_strategy(), positive_amount()), 1..20),
    ) {
        let ledger = fresh_ledger();
        let mut expected = Decimal::ZERO;

        for (kind, amount) in &entries {
            ledger
                .record(
                    *kind,
                    TransactionOrigin::Sale,
                    Money::new(*amount, Currency::Usd),
                    "generated",
                    period(),
                )
                .unwrap();
            match kind {
                TransactionKind::Income => expected += *amount,
                TransactionKind::Expense => expected -= *amount,
            }
        }

        let totals = ledger.sum_active(period()).unwrap();
        prop_assert_eq!(totals.net.amount, expected);
    }

    /// Reverting any subset of transactions removes exactly their
    /// contribution, regardless of the order of reversals.
    #[test]
    fn prop_reversal_exclusion(
        entries in prop::collection::vec((kind_strategy(), positive_amount(), any::<bool>()), 1..20),
        shuffle_seed in any::<u64>(),
    ) {
        let ledger = fresh_ledger();
        let mut expected = Decimal::ZERO;
        let mut to_revert = Vec::new();

        for (kind, amount, revert) in &entries {
            let tx = ledger
                .record(
                    *kind,
                    TransactionOrigin::Adjustment,
                    Money::new(*amount, Currency::Usd),
                    "generated",
                    period(),
                )
                .unwrap();
            if *revert {
                to_revert.push(tx.id);
            } else {
                match kind {
                    TransactionKind::Income => expected += *amount,
                    TransactionKind::Expense => expected -= *amount,
                }
            }
        }

        // deterministic pseudo-shuffle so reversal order varies across cases
        if !to_revert.is_empty() {
            let pivot = (shuffle_seed as usize) % to_revert.len();
            to_revert.rotate_left(pivot);
        }
        for id in to_revert {
            ledger.revert(id, "generated reversal case", "prop").unwrap();
        }

        let totals = ledger.sum_active(period()).unwrap();
        prop_assert_eq!(totals.net.amount, expected);
    }

    /// A reversal is idempotent in effect: the second attempt fails and the
    /// totals do not change again.
    #[test]
    fn prop_double_revert_rejected(
        amount in positive_amount(),
    ) {
        let ledger = fresh_ledger();
        let keep = ledger
            .record(
                TransactionKind::Income,
                TransactionOrigin::Sale,
                Money::new(amount, Currency::Usd),
                "kept",
                period(),
            )
            .unwrap();
        let gone = ledger
            .record(
                TransactionKind::Income,
                TransactionOrigin::Sale,
                Money::new(amount, Currency::Usd),
                "reverted",
                period(),
            )
            .unwrap();

        ledger.revert(gone.id, "generated reversal case", "prop").unwrap();
        let after_first = ledger.sum_active(period()).unwrap();

        prop_assert!(ledger.revert(gone.id, "generated reversal case", "prop").is_err());
        let after_second = ledger.sum_active(period()).unwrap();

        prop_assert_eq!(after_first.net, after_second.net);
        prop_assert_eq!(after_first.net.amount, keep.amount.amount);
    }
}
