//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use log::info;
use nanofolio::search::{CandidateSink, Progress, SearchOptions};
use nanofolio::{Bucket, ScoreWeights, TargetRatios, TaxEfficiencyTable};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub tax_efficiency: TaxEfficiencyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_stock")]
    pub stock: f64,
    #[serde(default = "default_domestic_stock")]
    pub domestic_stock: f64,
    #[serde(default = "default_domestic_bond")]
    pub domestic_bond: f64,
    /// 0 = unlimited.
    #[serde(default)]
    pub max_iterations: usize,
    /// 0 = all available cores.
    #[serde(default)]
    pub parallelism: usize,
    /// Candidates to dump; 0 = none.
    #[serde(default)]
    pub dump_top: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            stock: default_stock(),
            domestic_stock: default_domestic_stock(),
            domestic_bond: default_domestic_bond(),
            max_iterations: 0,
            parallelism: 0,
            dump_top: 0,
        }
    }
}

fn default_stock() -> f64 {
    0.6
}
fn default_domestic_stock() -> f64 {
    0.7
}
fn default_domestic_bond() -> f64 {
    0.8
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_asset_mix")]
    pub asset_mix: f64,
    #[serde(default = "default_tax_efficiency")]
    pub tax_efficiency: f64,
    #[serde(default = "default_expense_ratio")]
    pub expense_ratio: f64,
    #[serde(default = "default_taxable_sales")]
    pub taxable_sales: f64,
    #[serde(default = "default_expense_baseline")]
    pub expense_baseline: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            asset_mix: default_asset_mix(),
            tax_efficiency: default_tax_efficiency(),
            expense_ratio: default_expense_ratio(),
            taxable_sales: default_taxable_sales(),
            expense_baseline: default_expense_baseline(),
        }
    }
}

fn default_asset_mix() -> f64 {
    ScoreWeights::default().asset_mix
}
fn default_tax_efficiency() -> f64 {
    ScoreWeights::default().tax_efficiency
}
fn default_expense_ratio() -> f64 {
    ScoreWeights::default().expense_ratio
}
fn default_taxable_sales() -> f64 {
    ScoreWeights::default().taxable_sales
}
fn default_expense_baseline() -> f64 {
    nanofolio::score::DEFAULT_EXPENSE_BASELINE
}

/// Desirability of each bucket per account type.
/// Each row is `[taxable, tax_deferred, tax_free]`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxEfficiencyConfig {
    #[serde(default = "default_stock_domestic_row")]
    pub stock_domestic: [f64; 3],
    #[serde(default = "default_stock_international_row")]
    pub stock_international: [f64; 3],
    #[serde(default = "default_bond_domestic_row")]
    pub bond_domestic: [f64; 3],
    #[serde(default = "default_bond_international_row")]
    pub bond_international: [f64; 3],
}

impl Default for TaxEfficiencyConfig {
    fn default() -> Self {
        Self {
            stock_domestic: default_stock_domestic_row(),
            stock_international: default_stock_international_row(),
            bond_domestic: default_bond_domestic_row(),
            bond_international: default_bond_international_row(),
        }
    }
}

fn default_stock_domestic_row() -> [f64; 3] {
    TaxEfficiencyTable::default().row(Bucket::StockDomestic)
}
fn default_stock_international_row() -> [f64; 3] {
    TaxEfficiencyTable::default().row(Bucket::StockInternational)
}
fn default_bond_domestic_row() -> [f64; 3] {
    TaxEfficiencyTable::default().row(Bucket::BondDomestic)
}
fn default_bond_international_row() -> [f64; 3] {
    TaxEfficiencyTable::default().row(Bucket::BondInternational)
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
    #[serde(default = "default_dump_dir")]
    pub dump_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
            dump_dir: default_dump_dir(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}
fn default_dump_dir() -> String {
    "./logs/candidates".into()
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("{} not found, using default config", path.display());
            Ok(Self::default())
        }
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        self.ratios()
            .map_err(|e| Error::Config(format!("[search] {e}")))?;
        self.score_weights()
            .validate()
            .map_err(|e| Error::Config(format!("[weights] {e}")))?;
        self.tax_table()
            .validate()
            .map_err(|e| Error::Config(format!("[tax_efficiency] {e}")))?;
        let baseline = self.weights.expense_baseline;
        if !(baseline > 0.0 && baseline.is_finite()) {
            return Err(Error::Config(format!(
                "[weights] expense_baseline must be > 0, got {baseline}"
            )));
        }
        Ok(())
    }

    /// Target ratios from `[search]`.
    pub fn ratios(&self) -> nanofolio::Result<TargetRatios> {
        TargetRatios::new(
            self.search.stock,
            self.search.domestic_stock,
            self.search.domestic_bond,
        )
    }

    /// Score weights from `[weights]`.
    pub fn score_weights(&self) -> ScoreWeights {
        ScoreWeights {
            asset_mix: self.weights.asset_mix,
            tax_efficiency: self.weights.tax_efficiency,
            expense_ratio: self.weights.expense_ratio,
            taxable_sales: self.weights.taxable_sales,
        }
    }

    /// Tax efficiency table from `[tax_efficiency]`.
    pub fn tax_table(&self) -> TaxEfficiencyTable {
        let t = &self.tax_efficiency;
        let mut rows = [[0.0; 3]; Bucket::COUNT];
        rows[Bucket::StockDomestic.index()] = t.stock_domestic;
        rows[Bucket::StockInternational.index()] = t.stock_international;
        rows[Bucket::BondDomestic.index()] = t.bond_domestic;
        rows[Bucket::BondInternational.index()] = t.bond_international;
        TaxEfficiencyTable::new(rows)
    }

    /// Build core search options. The sink only receives candidates when
    /// `dump_top > 0`.
    pub fn search_options<'a>(
        &self,
        sink: Option<&'a dyn CandidateSink>,
        progress: Option<&'a dyn Progress>,
    ) -> SearchOptions<'a> {
        let nonzero = |n: usize| (n > 0).then_some(n);
        SearchOptions {
            max_iterations: nonzero(self.search.max_iterations),
            parallelism: nonzero(self.search.parallelism),
            weights: self.score_weights(),
            tax_table: self.tax_table(),
            expense_baseline: self.weights.expense_baseline,
            dump_top: sink
                .zip(nonzero(self.search.dump_top))
                .map(|(sink, n)| (n, sink)),
            progress,
            ..SearchOptions::default()
        }
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }

    pub fn dump_dir(&self) -> PathBuf {
        PathBuf::from(&self.logging.dump_dir)
    }
}
