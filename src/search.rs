//! Exhaustive rebalance search.
//!
//! Every combination of bucket fill order (4! orderings) and per-bucket
//! account-type preference (3! orderings per bucket with a non-zero target)
//! is run through the greedy [`Allocator`]. Valid candidates are scored,
//! deduplicated by structural fingerprint, and the best one is returned with
//! the orders that reach it.
//!
//! With the `parallel` feature the combinations are split across a fixed
//! rayon pool. Workers send candidates over a bounded channel to a single
//! collector that owns the dedup map.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::allocate::Allocator;
use crate::catalog::SecurityCatalog;
use crate::diff::{self, Order};
use crate::error::Result;
use crate::exposure::{Bucket, Exposure, TargetRatios, target_exposures};
use crate::permute::permutations;
use crate::portfolio::{AccountType, Portfolio};
use crate::score::{DEFAULT_EXPENSE_BASELINE, Score, ScoreWeights, Scorer, TaxEfficiencyTable};
use crate::types::Dollars;

/// Receives search progress from worker threads.
pub trait Progress: Sync {
    /// `evaluated` combinations of `total` have started.
    fn update(&self, evaluated: usize, total: usize);
}

/// Receives the top-ranked candidates once the search completes.
///
/// The core hands candidates over in rank order (0 = best) and leaves the
/// format to the sink.
pub trait CandidateSink {
    fn dump(&self, rank: usize, candidate: &RebalancedPortfolio<'_>);
}

/// Tuning knobs for [`rebalance`].
#[derive(Clone, Copy)]
pub struct SearchOptions<'a> {
    /// Stop starting new combinations after this many. `None` = all.
    pub max_iterations: Option<usize>,
    /// Worker threads, capped at the available parallelism. `None` = all.
    pub parallelism: Option<usize>,
    pub weights: ScoreWeights,
    pub tax_table: TaxEfficiencyTable,
    /// Expense ratio (percent) that scores zero.
    pub expense_baseline: f64,
    /// Hand the top N candidates to a sink.
    pub dump_top: Option<(usize, &'a dyn CandidateSink)>,
    pub progress: Option<&'a dyn Progress>,
}

impl Default for SearchOptions<'_> {
    fn default() -> Self {
        Self {
            max_iterations: None,
            parallelism: None,
            weights: ScoreWeights::default(),
            tax_table: TaxEfficiencyTable::default(),
            expense_baseline: DEFAULT_EXPENSE_BASELINE,
            dump_top: None,
            progress: None,
        }
    }
}

impl fmt::Debug for SearchOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("max_iterations", &self.max_iterations)
            .field("parallelism", &self.parallelism)
            .field("weights", &self.weights)
            .field("tax_table", &self.tax_table)
            .field("expense_baseline", &self.expense_baseline)
            .field("dump_top", &self.dump_top.map(|(n, _)| n))
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Counters describing one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    /// Size of the search space.
    pub combinations: usize,
    /// Combinations actually allocated.
    pub evaluated: usize,
    /// Allocations without fatal errors.
    pub valid: usize,
    /// Distinct valid allocations.
    pub unique: usize,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} combinations, {} evaluated, {} valid, {} unique",
            self.combinations, self.evaluated, self.valid, self.unique
        )
    }
}

/// A chosen allocation together with how to get there.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RebalancedPortfolio<'a> {
    pub portfolio: Portfolio,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub original: &'a Portfolio,
    pub exposures: [Exposure; Bucket::COUNT],
    pub score: Score,
    pub orders: Vec<Order>,
    #[cfg_attr(feature = "serde", serde(skip))]
    catalog: &'a SecurityCatalog,
}

impl RebalancedPortfolio<'_> {
    pub fn total_value(&self) -> Dollars {
        self.portfolio.total_value()
    }

    pub fn expense_ratio(&self) -> f64 {
        self.portfolio.expense_ratio(self.catalog)
    }

    pub fn bucket_fraction(&self, bucket: Bucket) -> f64 {
        self.portfolio.bucket_fraction(self.catalog, bucket)
    }

    pub fn account_type_fraction(&self, ty: AccountType) -> f64 {
        self.portfolio.account_type_fraction(ty)
    }

    pub fn bucket_type_fraction(&self, bucket: Bucket, ty: AccountType) -> f64 {
        self.portfolio.bucket_type_fraction(self.catalog, bucket, ty)
    }

    /// Dollars sold inside taxable accounts.
    pub fn taxable_sales(&self) -> Dollars {
        diff::taxable_sales(&self.orders)
    }
}

/// Result of [`rebalance`].
#[derive(Clone, Debug)]
pub struct SearchOutcome<'a> {
    /// Best valid candidate, or `None` if every combination failed.
    pub best: Option<RebalancedPortfolio<'a>>,
    /// The original portfolio scored against the same targets.
    pub original_score: Score,
    pub exposures: [Exposure; Bucket::COUNT],
    pub stats: SearchStats,
}

impl SearchOutcome<'_> {
    /// How much the best candidate's rebalance total beats the original's
    /// total. `None` if there is no candidate.
    pub fn improvement(&self) -> Option<f64> {
        self.best
            .as_ref()
            .map(|b| b.score.rebalance_total() - self.original_score.total())
    }
}

/// The enumerable space of (bucket order, per-bucket preference) pairs.
///
/// A combination is addressed by a mixed-radix index: the low digits pick a
/// preference ordering per bucket, the high digit picks the bucket order.
#[derive(Clone, Debug)]
pub struct SearchSpace {
    bucket_orders: Vec<Vec<Bucket>>,
    preferences: [Vec<Vec<AccountType>>; Bucket::COUNT],
}

impl SearchSpace {
    /// Buckets with no target keep only their default preference.
    pub fn new(exposures: &[Exposure; Bucket::COUNT]) -> Self {
        Self {
            bucket_orders: permutations(Bucket::ALL).collect(),
            preferences: exposures.each_ref().map(|e| {
                if e.target > 0.0 {
                    permutations(e.preference).collect()
                } else {
                    vec![e.preference.to_vec()]
                }
            }),
        }
    }

    /// Number of combinations.
    pub fn len(&self) -> usize {
        self.preferences
            .iter()
            .map(Vec::len)
            .product::<usize>()
            .saturating_mul(self.bucket_orders.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The combination at `index` (`index < len()`).
    pub fn combination(&self, mut index: usize) -> (&[Bucket], [&[AccountType]; Bucket::COUNT]) {
        let mut prefs: [&[AccountType]; Bucket::COUNT] = [&[]; Bucket::COUNT];
        for (slot, options) in prefs.iter_mut().zip(&self.preferences) {
            *slot = options[index % options.len()].as_slice();
            index /= options.len();
        }
        (self.bucket_orders[index].as_slice(), prefs)
    }
}

/// A scored, valid allocation awaiting ranking.
struct Candidate {
    portfolio: Portfolio,
    score: Score,
    fingerprint: u64,
    expense_ratio: f64,
    positions: usize,
}

/// Best first: rebalance total desc, expense ratio asc, position count asc,
/// fingerprint asc.
fn rank(a: &Candidate, b: &Candidate) -> CmpOrdering {
    b.score
        .rebalance_total()
        .total_cmp(&a.score.rebalance_total())
        .then(a.expense_ratio.total_cmp(&b.expense_ratio))
        .then(a.positions.cmp(&b.positions))
        .then(a.fingerprint.cmp(&b.fingerprint))
}

/// Single owner of the dedup map.
#[derive(Default)]
struct Collector {
    unique: FxHashMap<u64, Candidate>,
    valid: usize,
}

impl Collector {
    fn insert(&mut self, candidate: Candidate) {
        self.valid += 1;
        self.unique.entry(candidate.fingerprint).or_insert(candidate);
    }
}

/// Search every allocation ordering for the best rebalance of `original`.
///
/// Rejects invalid input up front (see [`Portfolio::validate`],
/// [`TargetRatios::validate`], [`ScoreWeights::validate`]). A search that
/// finds no valid candidate is not an error: `best` is `None`.
///
/// ```
/// use nanofolio::portfolio::{Account, AccountType, Portfolio, Position};
/// use nanofolio::search::{rebalance, SearchOptions};
/// use nanofolio::{Security, SecurityCatalog, Symbol, TargetRatios};
///
/// let catalog = SecurityCatalog::from_securities([
///     Security::new(Symbol::new("VTSAX"), "", None, 0.04, 1.0, 1.0).unwrap(),
///     Security::new(Symbol::new("VBTLX"), "", None, 0.05, 0.0, 1.0).unwrap(),
/// ]);
/// let portfolio = Portfolio::new(vec![Account::new(
///     "IRA",
///     "Vanguard",
///     AccountType::TaxDeferred,
///     vec![Position::new(Symbol::new("VTSAX"), 10_000.0)],
/// )]);
///
/// let ratios = TargetRatios::new(0.7, 1.0, 1.0).unwrap();
/// let outcome = rebalance(&portfolio, &catalog, &ratios, &SearchOptions::default()).unwrap();
/// let best = outcome.best.unwrap();
/// assert_eq!(best.orders.len(), 2);
/// ```
pub fn rebalance<'a>(
    original: &'a Portfolio,
    catalog: &'a SecurityCatalog,
    ratios: &TargetRatios,
    options: &SearchOptions<'_>,
) -> Result<SearchOutcome<'a>> {
    ratios.validate()?;
    original.validate(catalog)?;
    let scorer = Scorer::new(
        catalog,
        options.weights,
        options.tax_table,
        options.expense_baseline,
    )?;

    let exposures = target_exposures(original.total_value(), ratios);
    let original_score = scorer.score(original, &exposures);
    let space = SearchSpace::new(&exposures);
    let allocator = Allocator::new(original, catalog, exposures);
    let total = space.len();
    let cap = options.max_iterations.unwrap_or(usize::MAX);
    let started = AtomicUsize::new(0);
    let progress = options.progress;

    info!(
        "searching {total} combinations across {} accounts (${:.2})",
        original.accounts().len(),
        original.total_value()
    );

    let evaluate = |index: usize| -> Option<Option<Candidate>> {
        let n = started.fetch_add(1, Ordering::Relaxed);
        if n >= cap {
            return None;
        }
        if let Some(progress) = progress {
            progress.update(n + 1, total);
        }

        let (order, prefs) = space.combination(index);
        let allocation = allocator.allocate(order, &prefs);
        if !allocation.is_valid() {
            return Some(None);
        }

        let portfolio = allocation.portfolio;
        Some(Some(Candidate {
            score: scorer.score_rebalance(&portfolio, &exposures, original),
            fingerprint: portfolio.fingerprint(),
            expense_ratio: portfolio.expense_ratio(catalog),
            positions: portfolio.position_count(),
            portfolio,
        }))
    };

    let evaluated = AtomicUsize::new(0);
    let collector = dispatch(total, worker_count(options.parallelism), |index| {
        let result = evaluate(index);
        if result.is_some() {
            evaluated.fetch_add(1, Ordering::Relaxed);
        }
        result.flatten()
    });

    let stats = SearchStats {
        combinations: total,
        evaluated: evaluated.into_inner(),
        valid: collector.valid,
        unique: collector.unique.len(),
    };
    debug!("search stats: {stats}");

    let mut ranked: Vec<Candidate> = collector.unique.into_values().collect();
    ranked.sort_by(rank);

    let finish = |c: Candidate| RebalancedPortfolio {
        orders: diff::compute_orders(original, &c.portfolio),
        portfolio: c.portfolio,
        original,
        exposures,
        score: c.score,
        catalog,
    };

    if let Some((n, sink)) = options.dump_top {
        for (i, candidate) in ranked.iter().take(n).enumerate() {
            let dumped = finish(Candidate {
                portfolio: candidate.portfolio.clone(),
                ..*candidate
            });
            sink.dump(i, &dumped);
        }
    }

    let best = ranked.into_iter().next().map(finish);
    match &best {
        Some(b) => info!(
            "best candidate: rebalance total {:.4} (original {:.4}), {} orders",
            b.score.rebalance_total(),
            original_score.total(),
            b.orders.len()
        ),
        None => info!("no valid allocation found ({stats})"),
    }

    Ok(SearchOutcome {
        best,
        original_score,
        exposures,
        stats,
    })
}

/// Pool size: the requested count, capped at what the machine offers.
fn worker_count(requested: Option<usize>) -> usize {
    let available = std::thread::available_parallelism().map_or(1, |n| n.get());
    requested.unwrap_or(available).clamp(1, available)
}

/// Run `work` over `0..total` and collect the candidates it yields.
#[cfg(feature = "parallel")]
fn dispatch<F>(total: usize, threads: usize, work: F) -> Collector
where
    F: Fn(usize) -> Option<Candidate> + Sync,
{
    use rayon::prelude::*;
    use std::sync::mpsc;

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool,
        Err(e) => {
            log::warn!("failed to build a {threads}-thread pool ({e}); searching serially");
            return dispatch_serial(total, work);
        }
    };
    debug!("dispatching on {threads} threads");

    let (tx, rx) = mpsc::sync_channel::<Candidate>(threads * 16);
    let mut collector = Collector::default();
    std::thread::scope(|s| {
        s.spawn(|| {
            pool.install(|| {
                (0..total).into_par_iter().for_each_with(tx, |tx, index| {
                    if let Some(candidate) = work(index) {
                        // The receiver outlives every sender.
                        let _ = tx.send(candidate);
                    }
                });
            });
        });
        for candidate in rx {
            collector.insert(candidate);
        }
    });
    collector
}

#[cfg(not(feature = "parallel"))]
fn dispatch<F>(total: usize, _threads: usize, work: F) -> Collector
where
    F: Fn(usize) -> Option<Candidate>,
{
    dispatch_serial(total, work)
}

fn dispatch_serial<F>(total: usize, work: F) -> Collector
where
    F: Fn(usize) -> Option<Candidate>,
{
    let mut collector = Collector::default();
    for candidate in (0..total).filter_map(work) {
        collector.insert(candidate);
    }
    collector
}
