//! Run orchestrator: load → search → report → audit.
//!
//! This is the main workflow that ties together all components.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{Level, info, log, warn};
use nanofolio::search::{self, CandidateSink, Progress};
use nanofolio::{Scorer, target_exposures};

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::dump::DirSink;
use crate::error::{Error, Result};
use crate::input;
use crate::report::{PlanJson, PlanReport, ScoreReport};

/// Options for a plan run.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub portfolio_file: PathBuf,
    pub catalog_file: PathBuf,
    /// Print JSON instead of the text report.
    pub json: bool,
}

/// Logs search progress at every 10% step, at `info` unless told otherwise.
#[derive(Debug)]
pub struct LogProgress {
    next: AtomicUsize,
    level: Level,
}

impl LogProgress {
    pub fn with_level(level: Level) -> Self {
        Self {
            next: AtomicUsize::new(1),
            level,
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::with_level(Level::Info)
    }
}

impl Progress for LogProgress {
    fn update(&self, evaluated: usize, total: usize) {
        if total == 0 {
            return;
        }
        let decile = evaluated.saturating_mul(10) / total;
        let next = self.next.load(Ordering::Relaxed);
        if decile >= next
            && self
                .next
                .compare_exchange(next, decile + 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        {
            log!(self.level, "search {}% ({evaluated}/{total})", decile * 10);
        }
    }
}

/// Search for the best rebalance and print the plan.
///
/// Returns [`Error::NoValidAllocation`] when every combination fails.
pub fn run_plan(config: &Config, opts: &PlanOptions) -> Result<()> {
    // 1. Load inputs
    let catalog = input::load_catalog(&opts.catalog_file)?;
    let portfolio = input::load_portfolio(&opts.portfolio_file, &catalog)?;
    let ratios = config.ratios()?;
    info!(
        "loaded {} accounts ({} positions) and {} securities",
        portfolio.accounts().len(),
        portfolio.position_count(),
        catalog.len()
    );

    // 2. Open audit log
    let mut audit = AuditLog::open(&config.audit_path())?;
    audit::log_run_started(
        &mut audit,
        &opts.portfolio_file.display().to_string(),
        &opts.catalog_file.display().to_string(),
        &ratios,
    )?;

    // 3. Search
    let sink = if config.search.dump_top > 0 {
        Some(DirSink::new(&config.dump_dir())?)
    } else {
        None
    };
    let progress = LogProgress::default();
    let options = config.search_options(
        sink.as_ref().map(|s| s as &dyn CandidateSink),
        Some(&progress as &dyn Progress),
    );
    let outcome = search::rebalance(&portfolio, &catalog, &ratios, &options)?;
    audit::log_search_completed(&mut audit, &outcome)?;

    // 4. Display the plan
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&PlanJson::new(&outcome))?);
    } else {
        print!(
            "{}",
            PlanReport {
                outcome: &outcome,
                catalog: &catalog,
            }
        );
    }

    // 5. Record the orders
    let Some(best) = &outcome.best else {
        warn!("no valid allocation: {}", outcome.stats);
        return Err(Error::NoValidAllocation(format!(
            "all {} evaluated combinations failed",
            outcome.stats.evaluated
        )));
    };

    if best.orders.is_empty() {
        audit.log_simple("no_rebalance_needed")?;
    } else {
        audit::log_orders_planned(&mut audit, &best.orders)?;
    }
    info!("audit logged to {}", audit.path().display());

    Ok(())
}

/// Score the portfolio as it stands.
pub fn run_score(config: &Config, opts: &PlanOptions) -> Result<()> {
    let catalog = input::load_catalog(&opts.catalog_file)?;
    let portfolio = input::load_portfolio(&opts.portfolio_file, &catalog)?;
    let ratios = config.ratios()?;

    let scorer = Scorer::new(
        &catalog,
        config.score_weights(),
        config.tax_table(),
        config.weights.expense_baseline,
    )?;
    let exposures = target_exposures(portfolio.total_value(), &ratios);
    let score = scorer.score(&portfolio, &exposures);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&score)?);
    } else {
        print!(
            "{}",
            ScoreReport {
                portfolio: &portfolio,
                catalog: &catalog,
                exposures,
                score,
            }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_steps_by_decile() {
        let progress = LogProgress::default();
        for i in 1..=100 {
            progress.update(i, 100);
        }
        assert_eq!(progress.next.load(Ordering::Relaxed), 11);
    }

    #[test]
    fn progress_is_visible_at_default_filter() {
        // main.rs filters at info.
        assert_eq!(LogProgress::default().level, Level::Info);
        assert!(LogProgress::default().level <= log::LevelFilter::Info);
    }

    #[test]
    fn progress_ignores_empty_search() {
        let progress = LogProgress::default();
        progress.update(0, 0);
        assert_eq!(progress.next.load(Ordering::Relaxed), 1);
    }
}
