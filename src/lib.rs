//! # nanofolio
//!
//! A deterministic, tax-aware rebalance search over multi-account portfolios.
//!
//! Given accounts of three tax treatments (taxable, tax-deferred, tax-free),
//! a catalog of funds and a target asset mix, nanofolio tries every ordering
//! of how the four exposure buckets are filled and which account types are
//! preferred for each, scores every distinct result, and returns the best
//! one with the buy and sell orders that reach it.
//!
//! ## Features
//!
//! - **Four buckets**: domestic/international × stock/bond
//! - **Greedy allocation**: cheapest full-coverage fund per brokerage
//! - **Exhaustive search**: up to 24 × 6⁴ orderings, deduplicated
//! - **Scoring**: asset mix, tax efficiency, expense ratio, taxable sales
//! - **Parallel**: bounded rayon pool (`parallel` feature, on by default)
//!
//! ## Quick Start
//!
//! ```
//! use nanofolio::portfolio::{Account, AccountType, Portfolio, Position};
//! use nanofolio::search::{rebalance, SearchOptions};
//! use nanofolio::{Security, SecurityCatalog, Symbol, TargetRatios};
//!
//! let catalog = SecurityCatalog::from_securities([
//!     Security::new(Symbol::new("VTSAX"), "Total Stock", None, 0.04, 1.0, 1.0).unwrap(),
//!     Security::new(Symbol::new("VTIAX"), "Intl Stock", None, 0.11, 1.0, 0.0).unwrap(),
//!     Security::new(Symbol::new("VBTLX"), "Total Bond", None, 0.05, 0.0, 1.0).unwrap(),
//! ]);
//!
//! let portfolio = Portfolio::new(vec![
//!     Account::new("Brokerage", "Vanguard", AccountType::Taxable, vec![
//!         Position::new(Symbol::new("VTSAX"), 60_000.0),
//!     ]),
//!     Account::new("401k", "Vanguard", AccountType::TaxDeferred, vec![
//!         Position::new(Symbol::new("VTSAX"), 40_000.0),
//!     ]),
//! ]);
//!
//! // 80% stock, 70% of stock domestic, all bonds domestic.
//! let ratios = TargetRatios::new(0.8, 0.7, 1.0).unwrap();
//! let outcome = rebalance(&portfolio, &catalog, &ratios, &SearchOptions::default()).unwrap();
//!
//! let best = outcome.best.expect("a valid allocation");
//! assert!((best.total_value() - 100_000.0).abs() < 1e-6);
//! assert!(best.score.asset_mix > 0.99);
//! ```
//!
//! ## Money
//!
//! Dollar amounts are [`Dollars`] (`f64`). Comparisons against zero use
//! [`DUST`]; orders below [`diff::MIN_ORDER_VALUE`] are dropped.
//!
//! ## Scoring
//!
//! ```
//! use nanofolio::score::{Scorer, ScoreWeights};
//! use nanofolio::{target_exposures, SecurityCatalog, TargetRatios};
//! use nanofolio::portfolio::Portfolio;
//!
//! let catalog = SecurityCatalog::new();
//! let scorer = Scorer::with_defaults(&catalog);
//! assert_eq!(*scorer.weights(), ScoreWeights::default());
//!
//! let exposures = target_exposures(0.0, &TargetRatios::new(0.6, 0.5, 0.5).unwrap());
//! let score = scorer.score(&Portfolio::default(), &exposures);
//! assert_eq!(score.tax_efficiency, 1.0);
//! ```

pub mod allocate;
mod catalog;
pub mod diff;
mod error;
mod exposure;
pub mod permute;
pub mod portfolio;
pub mod score;
pub mod search;
mod security;
mod types;

// Re-export public API
pub use allocate::{Allocation, AllocationError, Allocator};
pub use catalog::SecurityCatalog;
pub use diff::{Action, Order, compute_orders};
pub use error::{Error, Result};
pub use exposure::{AssetClass, AssetLocation, Bucket, Exposure, TargetRatios, target_exposures};
pub use portfolio::{Account, AccountKey, AccountType, Portfolio, Position};
pub use score::{Score, ScoreWeights, Scorer, TaxEfficiencyTable};
pub use search::{
    CandidateSink, Progress, RebalancedPortfolio, SearchOptions, SearchOutcome, SearchStats,
    rebalance,
};
pub use security::{CASH_SYMBOL, Security};
pub use types::{DUST, Dollars, SYMBOL_MAX_LEN, Symbol};
