//! Candidate scoring.
//!
//! A score has four sub-scores, each nominally in `[0, 1]` with 1 best:
//!
//! | Sub-score | Measures |
//! |-----------|----------|
//! | asset mix | closeness of the bucket fractions to the targets |
//! | tax efficiency | how much of each bucket sits in its best account types |
//! | expense ratio | portfolio expense ratio against a baseline |
//! | taxable sales | dollars sold inside taxable accounts (rebalances only) |
//!
//! The first three are combined into [`Score::total`]. The taxable-sales
//! penalty is subtracted on top of that in [`Score::rebalance_total`].
//! Neither total is clamped.

use std::fmt;

use crate::catalog::SecurityCatalog;
use crate::diff;
use crate::error::{Error, Result};
use crate::exposure::{Bucket, Exposure};
use crate::portfolio::{AccountType, Portfolio};
use crate::types::sum_dollars;

/// Default expense ratio baseline, in percent per year.
pub const DEFAULT_EXPENSE_BASELINE: f64 = 1.0;

/// Relative importance of each sub-score.
///
/// `asset_mix + tax_efficiency + expense_ratio` must equal 100.
/// `taxable_sales` is separate: it scales the penalty subtracted for
/// rebalances.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreWeights {
    pub asset_mix: f64,
    pub tax_efficiency: f64,
    pub expense_ratio: f64,
    pub taxable_sales: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            asset_mix: 60.0,
            tax_efficiency: 25.0,
            expense_ratio: 15.0,
            taxable_sales: 20.0,
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> Result<()> {
        let sum = self.asset_mix + self.tax_efficiency + self.expense_ratio;
        let negative = [
            self.asset_mix,
            self.tax_efficiency,
            self.expense_ratio,
            self.taxable_sales,
        ]
        .iter()
        .any(|w| !w.is_finite() || *w < 0.0);
        if negative || (sum - 100.0).abs() > 1e-9 {
            return Err(Error::InvalidWeights { sum });
        }
        Ok(())
    }
}

/// How desirable it is to hold each bucket in each account type, `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaxEfficiencyTable {
    /// Indexed `[bucket.index()][account_type.index()]`.
    weights: [[f64; AccountType::COUNT]; Bucket::COUNT],
}

impl Default for TaxEfficiencyTable {
    /// Columns are taxable, tax-deferred, tax-free.
    fn default() -> Self {
        Self::new([
            [0.8, 0.6, 1.0], // stock/domestic
            [1.0, 0.5, 0.8], // stock/international: foreign tax credit
            [0.4, 1.0, 0.7], // bond/domestic
            [1.0, 0.8, 0.6], // bond/international
        ])
    }
}

impl TaxEfficiencyTable {
    pub fn new(weights: [[f64; AccountType::COUNT]; Bucket::COUNT]) -> Self {
        Self { weights }
    }

    /// Every weight must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for bucket in Bucket::ALL {
            if let Some(&value) = self.row(bucket).iter().find(|w| !w.is_finite() || **w < 0.0) {
                return Err(Error::InvalidTaxWeight {
                    bucket: bucket.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Weights for `bucket`: taxable, tax-deferred, tax-free.
    pub fn row(&self, bucket: Bucket) -> [f64; AccountType::COUNT] {
        self.weights[bucket.index()]
    }

    #[inline]
    pub fn weight(&self, bucket: Bucket, ty: AccountType) -> f64 {
        self.weights[bucket.index()][ty.index()]
    }

    /// The best weight any account type earns for `bucket`.
    pub fn best(&self, bucket: Bucket) -> f64 {
        self.weights[bucket.index()]
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }
}

/// Sub-scores and the weights that combine them.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Score {
    pub asset_mix: f64,
    pub tax_efficiency: f64,
    pub expense_ratio: f64,
    pub taxable_sales: f64,
    pub weights: ScoreWeights,
}

impl Score {
    /// Allocation quality, ignoring the cost of getting there.
    pub fn total(&self) -> f64 {
        let w = &self.weights;
        (self.asset_mix * w.asset_mix
            + self.tax_efficiency * w.tax_efficiency
            + self.expense_ratio * w.expense_ratio)
            / 100.0
    }

    /// [`Score::total`] minus the taxable-sales penalty.
    ///
    /// The penalty is the fraction of the portfolio sold in taxable
    /// accounts, scaled by the taxable-sales weight.
    pub fn rebalance_total(&self) -> f64 {
        self.total() - self.weights.taxable_sales / 100.0 * (1.0 - self.taxable_sales)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Asset mix:       {:>7.4}", self.asset_mix)?;
        writeln!(f, "  Tax efficiency:  {:>7.4}", self.tax_efficiency)?;
        writeln!(f, "  Expense ratio:   {:>7.4}", self.expense_ratio)?;
        writeln!(f, "  Taxable sales:   {:>7.4}", self.taxable_sales)?;
        writeln!(f, "  Total:           {:>7.4}", self.total())?;
        write!(f, "  Rebalance total: {:>7.4}", self.rebalance_total())
    }
}

/// Scores portfolios against a set of target exposures.
#[derive(Clone, Debug)]
pub struct Scorer<'a> {
    catalog: &'a SecurityCatalog,
    weights: ScoreWeights,
    table: TaxEfficiencyTable,
    expense_baseline: f64,
}

impl<'a> Scorer<'a> {
    pub fn new(
        catalog: &'a SecurityCatalog,
        weights: ScoreWeights,
        table: TaxEfficiencyTable,
        expense_baseline: f64,
    ) -> Result<Self> {
        weights.validate()?;
        table.validate()?;
        if !(expense_baseline > 0.0 && expense_baseline.is_finite()) {
            return Err(Error::InvalidBaseline(expense_baseline));
        }
        Ok(Self {
            catalog,
            weights,
            table,
            expense_baseline,
        })
    }

    /// Scorer with default weights, tax table and baseline.
    pub fn with_defaults(catalog: &'a SecurityCatalog) -> Self {
        Self {
            catalog,
            weights: ScoreWeights::default(),
            table: TaxEfficiencyTable::default(),
            expense_baseline: DEFAULT_EXPENSE_BASELINE,
        }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Score `portfolio` as it stands; no sales are involved.
    pub fn score(&self, portfolio: &Portfolio, exposures: &[Exposure; Bucket::COUNT]) -> Score {
        Score {
            asset_mix: self.asset_mix(portfolio, exposures),
            tax_efficiency: self.tax_efficiency(portfolio),
            expense_ratio: self.expense_ratio(portfolio),
            taxable_sales: 1.0,
            weights: self.weights,
        }
    }

    /// Score `candidate` as a rebalance of `original`, charging for taxable
    /// sales.
    pub fn score_rebalance(
        &self,
        candidate: &Portfolio,
        exposures: &[Exposure; Bucket::COUNT],
        original: &Portfolio,
    ) -> Score {
        let orders = diff::compute_orders(original, candidate);
        let sold = diff::taxable_sales(&orders);
        let total = original.total_value();
        Score {
            taxable_sales: if total > 0.0 { 1.0 - sold / total } else { 1.0 },
            ..self.score(candidate, exposures)
        }
    }

    /// `1 - Σ|actual - target| / 2`; 2 is the largest possible deviation.
    pub fn asset_mix(&self, portfolio: &Portfolio, exposures: &[Exposure; Bucket::COUNT]) -> f64 {
        let total = portfolio.total_value();
        let deviation: f64 = exposures
            .iter()
            .map(|e| {
                let actual = portfolio.bucket_fraction(self.catalog, e.bucket);
                (actual - e.fraction_of(total)).abs()
            })
            .sum();
        1.0 - deviation / 2.0
    }

    /// Weighted placement relative to the perfect placement.
    pub fn tax_efficiency(&self, portfolio: &Portfolio) -> f64 {
        let placement = portfolio.placement(self.catalog);
        let mut earned = 0.0;
        let mut perfect = 0.0;
        for bucket in Bucket::ALL {
            let row = &placement[bucket.index()];
            for ty in AccountType::ALL {
                earned += self.table.weight(bucket, ty) * row[ty.index()];
            }
            perfect += self.table.best(bucket) * sum_dollars(*row);
        }
        if perfect > 0.0 { earned / perfect } else { 1.0 }
    }

    /// `1 - expense_ratio / baseline`.
    pub fn expense_ratio(&self, portfolio: &Portfolio) -> f64 {
        1.0 - portfolio.expense_ratio(self.catalog) / self.expense_baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::{TargetRatios, target_exposures};
    use crate::portfolio::{Account, Position};
    use crate::security::Security;
    use crate::types::Symbol;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s)
    }

    fn catalog() -> SecurityCatalog {
        SecurityCatalog::from_securities([
            Security::new(sym("VTSAX"), "", None, 0.04, 1.0, 1.0).unwrap(),
            Security::new(sym("VTIAX"), "", None, 0.12, 1.0, 0.0).unwrap(),
            Security::new(sym("VBTLX"), "", None, 0.05, 0.0, 1.0).unwrap(),
        ])
    }

    fn one_account(ty: AccountType, positions: &[(&str, f64)]) -> Portfolio {
        Portfolio::new(vec![Account::new(
            "Acct",
            "Vanguard",
            ty,
            positions
                .iter()
                .map(|&(s, v)| Position::new(sym(s), v))
                .collect(),
        )])
    }

    fn exposures(total: f64, stock: f64, dom_s: f64, dom_b: f64) -> [Exposure; 4] {
        target_exposures(total, &TargetRatios::new(stock, dom_s, dom_b).unwrap())
    }

    #[test]
    fn weights_must_sum_to_100() {
        assert!(ScoreWeights::default().validate().is_ok());
        let bad = ScoreWeights {
            asset_mix: 50.0,
            ..ScoreWeights::default()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidWeights { .. })));
    }

    #[test]
    fn scorer_rejects_bad_baseline() {
        let c = catalog();
        let err = Scorer::new(&c, ScoreWeights::default(), TaxEfficiencyTable::default(), 0.0);
        assert!(matches!(err, Err(Error::InvalidBaseline(_))));
    }

    #[test]
    fn scorer_rejects_bad_tax_table() {
        let c = catalog();
        let mut rows = [[0.5; AccountType::COUNT]; Bucket::COUNT];
        rows[Bucket::BondDomestic.index()][1] = -0.1;
        let table = TaxEfficiencyTable::new(rows);
        let err = Scorer::new(&c, ScoreWeights::default(), table, 1.0).err();
        assert_eq!(
            err,
            Some(Error::InvalidTaxWeight {
                bucket: "bond/domestic".into(),
                value: -0.1
            })
        );

        rows[Bucket::BondDomestic.index()][1] = f64::NAN;
        assert!(TaxEfficiencyTable::new(rows).validate().is_err());
        assert!(TaxEfficiencyTable::default().validate().is_ok());
    }

    #[test]
    fn perfect_mix_scores_one() {
        let c = catalog();
        let p = one_account(AccountType::TaxFree, &[("VTSAX", 600.0), ("VBTLX", 400.0)]);
        let scorer = Scorer::with_defaults(&c);
        assert!((scorer.asset_mix(&p, &exposures(1_000.0, 0.6, 1.0, 1.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn opposite_mix_scores_zero() {
        let c = catalog();
        let p = one_account(AccountType::TaxFree, &[("VBTLX", 1_000.0)]);
        let scorer = Scorer::with_defaults(&c);
        assert!(scorer.asset_mix(&p, &exposures(1_000.0, 1.0, 1.0, 1.0)).abs() < 1e-12);
    }

    #[test]
    fn cash_counts_against_mix() {
        let c = catalog();
        let p = one_account(AccountType::TaxFree, &[("VTSAX", 500.0), ("$CASH", 500.0)]);
        let scorer = Scorer::with_defaults(&c);
        let mix = scorer.asset_mix(&p, &exposures(1_000.0, 1.0, 1.0, 1.0));
        assert!((mix - 0.75).abs() < 1e-12);
    }

    #[test]
    fn tax_efficiency_prefers_best_placement() {
        let c = catalog();
        let scorer = Scorer::with_defaults(&c);
        let best = one_account(AccountType::TaxFree, &[("VTSAX", 1_000.0)]);
        let worse = one_account(AccountType::TaxDeferred, &[("VTSAX", 1_000.0)]);
        assert!((scorer.tax_efficiency(&best) - 1.0).abs() < 1e-12);
        assert!((scorer.tax_efficiency(&worse) - 0.6).abs() < 1e-12);
        assert_eq!(scorer.tax_efficiency(&Portfolio::default()), 1.0);
    }

    #[test]
    fn expense_ratio_against_baseline() {
        let c = catalog();
        let scorer = Scorer::with_defaults(&c);
        let p = one_account(AccountType::TaxFree, &[("VTIAX", 1_000.0)]);
        assert!((scorer.expense_ratio(&p) - 0.88).abs() < 1e-12);
    }

    #[test]
    fn totals_combine_weights() {
        let score = Score {
            asset_mix: 1.0,
            tax_efficiency: 0.5,
            expense_ratio: 0.9,
            taxable_sales: 0.75,
            weights: ScoreWeights::default(),
        };
        // (60 + 12.5 + 13.5) / 100
        assert!((score.total() - 0.86).abs() < 1e-12);
        // 0.86 - 0.20 * 0.25
        assert!((score.rebalance_total() - 0.81).abs() < 1e-12);
    }

    #[test]
    fn rebalance_charges_taxable_sales() {
        let c = catalog();
        let scorer = Scorer::with_defaults(&c);
        let original = one_account(AccountType::Taxable, &[("VTSAX", 1_000.0)]);
        let candidate = one_account(AccountType::Taxable, &[("VBTLX", 250.0), ("VTSAX", 750.0)]);
        let e = exposures(1_000.0, 0.75, 1.0, 1.0);

        let score = scorer.score_rebalance(&candidate, &e, &original);
        assert!((score.taxable_sales - 0.75).abs() < 1e-12);
        assert!(score.rebalance_total() < score.total());

        let unchanged = scorer.score_rebalance(&original, &e, &original);
        assert_eq!(unchanged.taxable_sales, 1.0);
        assert_eq!(unchanged.rebalance_total(), unchanged.total());
    }

    #[test]
    fn sales_in_tax_advantaged_accounts_are_free() {
        let c = catalog();
        let scorer = Scorer::with_defaults(&c);
        let original = one_account(AccountType::TaxFree, &[("VTSAX", 1_000.0)]);
        let candidate = one_account(AccountType::TaxFree, &[("VBTLX", 1_000.0)]);
        let score = scorer.score_rebalance(&candidate, &exposures(1_000.0, 0.0, 1.0, 1.0), &original);
        assert_eq!(score.taxable_sales, 1.0);
    }

    #[test]
    fn default_table_agrees_with_default_preferences() {
        let table = TaxEfficiencyTable::default();
        for bucket in Bucket::ALL {
            let pref = bucket.default_preference();
            assert_eq!(table.weight(bucket, pref[0]), table.best(bucket), "{bucket}");
            assert!(table.weight(bucket, pref[0]) >= table.weight(bucket, pref[1]));
            assert!(table.weight(bucket, pref[1]) >= table.weight(bucket, pref[2]));
        }
    }
}
