//! Plain-text rendering of scores and rebalance plans.

use std::fmt;

use nanofolio::search::SearchOutcome;
use nanofolio::{AccountType, Bucket, Exposure, Portfolio, Score, SecurityCatalog};
use serde::Serialize;

/// Current state of a portfolio against its targets.
pub struct ScoreReport<'a> {
    pub portfolio: &'a Portfolio,
    pub catalog: &'a SecurityCatalog,
    pub exposures: [Exposure; Bucket::COUNT],
    pub score: Score,
}

impl fmt::Display for ScoreReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PORTFOLIO (${:.2}):", self.portfolio.total_value())?;
        for account in self.portfolio.accounts() {
            writeln!(f, "  {}: ${:.2}", account.key(), account.total_value())?;
            for p in &account.positions {
                let hold = if p.hold { "  (hold)" } else { "" };
                writeln!(f, "    {:8} ${:>14.2}{hold}", p.symbol, p.value)?;
            }
        }
        writeln!(f)?;
        write_mix(f, self.portfolio, self.catalog, &self.exposures)?;
        writeln!(f)?;
        write_score(f, "SCORE", &self.score, self.score.total())
    }
}

/// A completed search ready for display.
pub struct PlanReport<'a> {
    pub outcome: &'a SearchOutcome<'a>,
    pub catalog: &'a SecurityCatalog,
}

impl fmt::Display for PlanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.outcome;
        writeln!(f, "SEARCH: {}", outcome.stats)?;
        writeln!(f)?;
        write_score(f, "ORIGINAL", &outcome.original_score, outcome.original_score.total())?;

        let Some(best) = &outcome.best else {
            return writeln!(f, "\nNo valid allocation found.");
        };

        writeln!(f)?;
        write_score(f, "REBALANCED", &best.score, best.score.rebalance_total())?;
        writeln!(f)?;
        write_mix(f, &best.portfolio, self.catalog, &outcome.exposures)?;

        writeln!(f, "\nACCOUNT TYPES:")?;
        for ty in AccountType::ALL {
            writeln!(
                f,
                "  {:14} {:>6.1}%",
                ty.to_string(),
                best.account_type_fraction(ty) * 100.0
            )?;
        }

        if best.orders.is_empty() {
            return writeln!(f, "\nNo rebalancing needed.");
        }

        writeln!(f, "\nREBALANCE ORDERS:")?;
        writeln!(
            f,
            "  {:>3}  {:4} {:8} {:>15}  {}",
            "#", "Side", "Symbol", "Amount", "Account"
        )?;
        for (i, order) in best.orders.iter().enumerate() {
            writeln!(f, "  {:>3}  {order}", i + 1)?;
        }
        writeln!(
            f,
            "\nTaxable sales: ${:.2}   Turnover: ${:.2}",
            best.taxable_sales(),
            nanofolio::diff::turnover(&best.orders)
        )
    }
}

fn write_mix(
    f: &mut fmt::Formatter<'_>,
    portfolio: &Portfolio,
    catalog: &SecurityCatalog,
    exposures: &[Exposure; Bucket::COUNT],
) -> fmt::Result {
    let total = portfolio.total_value();
    writeln!(f, "ASSET MIX:")?;
    writeln!(f, "  {:20} {:>8} {:>8}", "Bucket", "Actual", "Target")?;
    for e in exposures {
        writeln!(
            f,
            "  {:20} {:>7.1}% {:>7.1}%",
            e.bucket.to_string(),
            portfolio.bucket_fraction(catalog, e.bucket) * 100.0,
            e.fraction_of(total) * 100.0
        )?;
    }
    Ok(())
}

fn write_score(f: &mut fmt::Formatter<'_>, label: &str, score: &Score, total: f64) -> fmt::Result {
    writeln!(f, "{label}: {:.4}", total)?;
    writeln!(f, "  asset mix       {:.4}", score.asset_mix)?;
    writeln!(f, "  tax efficiency  {:.4}", score.tax_efficiency)?;
    writeln!(f, "  expense ratio   {:.4}", score.expense_ratio)?;
    writeln!(f, "  taxable sales   {:.4}", score.taxable_sales)
}

/// Machine-readable form of a completed search (`--json`).
#[derive(Serialize)]
pub struct PlanJson<'a> {
    pub stats: nanofolio::SearchStats,
    pub original_score: Score,
    pub original_total: f64,
    pub best: Option<&'a nanofolio::RebalancedPortfolio<'a>>,
    pub rebalance_total: Option<f64>,
}

impl<'a> PlanJson<'a> {
    pub fn new(outcome: &'a SearchOutcome<'a>) -> Self {
        Self {
            stats: outcome.stats,
            original_score: outcome.original_score,
            original_total: outcome.original_score.total(),
            best: outcome.best.as_ref(),
            rebalance_total: outcome.best.as_ref().map(|b| b.score.rebalance_total()),
        }
    }
}
