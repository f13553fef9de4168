//! Property-based tests for search invariants.
//!
//! These tests use proptest to verify that money is conserved and scores
//! stay bounded across randomly generated portfolios and targets.

use nanofolio::permute::{factorial, permutations};
use nanofolio::portfolio::{Account, AccountType, Portfolio, Position};
use nanofolio::search::{SearchOptions, rebalance};
use nanofolio::{Security, SecurityCatalog, Symbol, TargetRatios};
use proptest::prelude::*;
use rustc_hash::FxHashSet;

fn catalog() -> SecurityCatalog {
    let fund = |s: &str, er, stock, domestic| {
        Security::new(Symbol::new(s), s, None, er, stock, domestic).unwrap()
    };
    SecurityCatalog::from_securities([
        fund("VTSAX", 0.04, 1.0, 1.0),
        fund("VTIAX", 0.11, 1.0, 0.0),
        fund("VBTLX", 0.05, 0.0, 1.0),
        fund("VTABX", 0.11, 0.0, 0.0),
        // Balanced fund: partial coverage of two buckets.
        fund("VBIAX", 0.07, 0.6, 1.0),
    ])
}

/// Generate an account type
fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Taxable),
        Just(AccountType::TaxDeferred),
        Just(AccountType::TaxFree),
    ]
}

/// Generate an account holding one or two funds
fn account_strategy() -> impl Strategy<Value = (AccountType, f64, f64)> {
    (account_type_strategy(), 1_000.0..500_000.0f64, 0.0..100_000.0f64)
}

/// Generate a portfolio of one to three accounts
fn portfolio_strategy() -> impl Strategy<Value = Portfolio> {
    prop::collection::vec(account_strategy(), 1..=3).prop_map(|accounts| {
        Portfolio::new(
            accounts
                .into_iter()
                .enumerate()
                .map(|(i, (ty, stock, bond))| {
                    Account::new(
                        format!("Account {i}"),
                        "Vanguard",
                        ty,
                        vec![
                            Position::new(Symbol::new("VBIAX"), bond),
                            Position::new(Symbol::new("VTSAX"), stock),
                        ],
                    )
                })
                .collect(),
        )
    })
}

fn ratios_strategy() -> impl Strategy<Value = TargetRatios> {
    (0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64)
        .prop_map(|(s, d, b)| TargetRatios::new(s, d, b).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // ========================================================================
    // CONSERVATION INVARIANTS
    // ========================================================================

    /// Every account keeps its value; orders net to zero per account
    #[test]
    fn money_is_conserved(portfolio in portfolio_strategy(), ratios in ratios_strategy()) {
        let catalog = catalog();
        let outcome = rebalance(&portfolio, &catalog, &ratios, &SearchOptions::default()).unwrap();
        let best = outcome.best.expect("every bucket is reachable");

        let tolerance = 1e-6 * portfolio.total_value().max(1.0);
        prop_assert!((best.total_value() - portfolio.total_value()).abs() <= tolerance);

        for (old, new) in portfolio.accounts().iter().zip(best.portfolio.accounts()) {
            prop_assert_eq!(old.key(), new.key());
            prop_assert!((old.total_value() - new.total_value()).abs() <= tolerance);

            let net: f64 = best
                .orders
                .iter()
                .filter(|o| o.account == old.key())
                .map(|o| o.signed_amount())
                .sum();
            prop_assert!(net.abs() <= 0.05,
                "account {} nets {}", old.name, net);
        }
    }

    // ========================================================================
    // SCORE INVARIANTS
    // ========================================================================

    /// Sub-scores stay in [0, 1]; the sales penalty never adds
    #[test]
    fn scores_are_bounded(portfolio in portfolio_strategy(), ratios in ratios_strategy()) {
        let catalog = catalog();
        let outcome = rebalance(&portfolio, &catalog, &ratios, &SearchOptions::default()).unwrap();
        let best = outcome.best.expect("every bucket is reachable");
        let s = best.score;

        for v in [s.asset_mix, s.tax_efficiency, s.expense_ratio, s.taxable_sales] {
            prop_assert!((-1e-9..=1.0 + 1e-9).contains(&v), "sub-score {} out of range", v);
        }
        prop_assert!(s.rebalance_total() <= s.total() + 1e-12);
        prop_assert!((0.0..=1.0 + 1e-9).contains(&s.total()));
        prop_assert!((0.0..=1.0 + 1e-9).contains(&s.rebalance_total()));
        prop_assert!(outcome.stats.unique <= outcome.stats.valid);
        prop_assert!(outcome.stats.valid <= outcome.stats.evaluated);
        prop_assert_eq!(outcome.stats.evaluated, outcome.stats.combinations);
    }

    // ========================================================================
    // ENUMERATION
    // ========================================================================

    /// n! distinct orderings
    #[test]
    fn permutations_are_complete(n in 0usize..=6) {
        let all: Vec<Vec<usize>> = permutations(0..n).collect();
        prop_assert_eq!(all.len(), factorial(n));
        let distinct: FxHashSet<_> = all.iter().cloned().collect();
        prop_assert_eq!(distinct.len(), all.len());
    }
}
