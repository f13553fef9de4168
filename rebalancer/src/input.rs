//! Security catalog (catalog.json) and portfolio (portfolio.json) loading.

use std::path::Path;

use nanofolio::{Portfolio, Security, SecurityCatalog, Symbol};
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::error::{Error, Result};

/// One catalog.json entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brokerage: Option<String>,
    /// Annual expense ratio in percent.
    pub expense_ratio: f64,
    /// Fraction of the fund in stocks; the rest is bonds.
    pub stock_ratio: f64,
    /// Fraction of the fund held domestically.
    pub domestic_ratio: f64,
}

impl CatalogEntry {
    fn to_security(&self) -> Result<Security> {
        let symbol = Symbol::try_new(&self.symbol)
            .ok_or_else(|| nanofolio::Error::InvalidSymbol(self.symbol.clone()))?;
        Ok(Security::new(
            symbol,
            self.description.clone(),
            self.brokerage.clone(),
            self.expense_ratio,
            self.stock_ratio,
            self.domestic_ratio,
        )?)
    }
}

/// Load and validate a catalog.json file.
pub fn load_catalog(path: &Path) -> Result<SecurityCatalog> {
    catalog_from_json(&read(path)?)
}

/// Parse a catalog from a JSON string. Cash is always present.
pub fn catalog_from_json(json: &str) -> Result<SecurityCatalog> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
    let mut catalog = SecurityCatalog::new();
    let mut seen = FxHashSet::default();

    for entry in &entries {
        let security = entry.to_security()?;
        if security.is_cash() {
            return Err(Error::Input(format!(
                "{} is reserved for cash",
                security.symbol
            )));
        }
        if !seen.insert(security.symbol) {
            return Err(Error::Input(format!(
                "duplicate catalog symbol: {}",
                security.symbol
            )));
        }
        catalog.insert(security);
    }

    Ok(catalog)
}

/// Load a portfolio.json file and validate it against `catalog`.
pub fn load_portfolio(path: &Path, catalog: &SecurityCatalog) -> Result<Portfolio> {
    portfolio_from_json(&read(path)?, catalog)
}

/// Parse a portfolio from a JSON string and validate it against `catalog`.
pub fn portfolio_from_json(json: &str, catalog: &SecurityCatalog) -> Result<Portfolio> {
    let portfolio: Portfolio = serde_json::from_str(json)?;

    let mut keys = FxHashSet::default();
    for account in portfolio.accounts() {
        if !keys.insert(account.key()) {
            return Err(Error::Input(format!("duplicate account: {}", account.key())));
        }
    }

    portfolio.validate(catalog)?;
    Ok(portfolio)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::InputRead {
        path: path.to_path_buf(),
        source: e,
    })
}
