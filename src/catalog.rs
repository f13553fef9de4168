//! Security catalog: symbol → security, with brokerage-scoped lookups.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::exposure::Bucket;
use crate::security::Security;
use crate::types::Symbol;

/// Registry of every security the search may hold or buy.
///
/// The synthetic cash security is always present.
///
/// ```
/// use nanofolio::{Bucket, Security, SecurityCatalog, Symbol};
///
/// let mut catalog = SecurityCatalog::new();
/// catalog.insert(
///     Security::new(Symbol::new("VTSAX"), "Total Stock", Some("Vanguard".into()), 0.04, 1.0, 1.0)
///         .unwrap(),
/// );
///
/// let best = catalog.best_for("Vanguard", Bucket::StockDomestic).unwrap();
/// assert_eq!(best.symbol, Symbol::new("VTSAX"));
/// assert!(catalog.best_for("Fidelity", Bucket::StockDomestic).is_none());
/// ```
#[derive(Clone, Debug)]
pub struct SecurityCatalog {
    securities: FxHashMap<Symbol, Security>,
    cash: Symbol,
}

impl Default for SecurityCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityCatalog {
    /// Create a catalog holding only the cash security.
    pub fn new() -> Self {
        let cash = Security::cash();
        let symbol = cash.symbol;
        let mut securities = FxHashMap::default();
        securities.insert(symbol, cash);
        Self {
            securities,
            cash: symbol,
        }
    }

    /// Build a catalog from securities. Later duplicates replace earlier ones.
    pub fn from_securities(securities: impl IntoIterator<Item = Security>) -> Self {
        let mut catalog = Self::new();
        for s in securities {
            catalog.insert(s);
        }
        catalog
    }

    /// Add or replace a security, returning the one it replaced.
    ///
    /// The cash entry cannot be replaced.
    pub fn insert(&mut self, security: Security) -> Option<Security> {
        if security.symbol == self.cash {
            return None;
        }
        self.securities.insert(security.symbol, security)
    }

    /// Look up a security by symbol.
    pub fn get(&self, symbol: &Symbol) -> Option<&Security> {
        self.securities.get(symbol)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.securities.contains_key(symbol)
    }

    /// Symbol of the cash security.
    pub fn cash_symbol(&self) -> Symbol {
        self.cash
    }

    /// Number of securities, including cash.
    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Security> {
        self.securities.values()
    }

    /// Securities that can be bought through `brokerage`.
    pub fn for_brokerage<'a>(&'a self, brokerage: &str) -> impl Iterator<Item = &'a Security> {
        self.securities.values().filter(move |s| s.available_at(brokerage))
    }

    /// Whether `brokerage` offers any security with exposure to `bucket`.
    pub fn offers(&self, brokerage: &str, bucket: Bucket) -> bool {
        self.for_brokerage(brokerage).any(|s| s.coverage(bucket) > 0.0)
    }

    /// The best security `brokerage` offers for `bucket`.
    ///
    /// Highest coverage wins; ties go to the lower expense ratio, then to the
    /// lexicographically smaller symbol. Securities with no coverage of the
    /// bucket are never returned.
    pub fn best_for<'a>(&'a self, brokerage: &str, bucket: Bucket) -> Option<&'a Security> {
        self.for_brokerage(brokerage)
            .filter(|s| s.coverage(bucket) > 0.0)
            .min_by(|a, b| rank(a, b, bucket))
    }
}

/// Ordering where the preferred security compares as `Less`.
fn rank(a: &Security, b: &Security, bucket: Bucket) -> Ordering {
    b.coverage(bucket)
        .total_cmp(&a.coverage(bucket))
        .then(a.expense_ratio.total_cmp(&b.expense_ratio))
        .then(a.symbol.cmp(&b.symbol))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sec(sym: &str, brokerage: Option<&str>, er: f64, stock: f64, domestic: f64) -> Security {
        Security::new(Symbol::new(sym), sym, brokerage.map(String::from), er, stock, domestic)
            .unwrap()
    }

    #[test]
    fn always_has_cash() {
        let catalog = SecurityCatalog::new();
        assert_eq!(catalog.len(), 1);
        let cash = catalog.get(&catalog.cash_symbol()).unwrap();
        assert!(cash.is_cash());
    }

    #[test]
    fn cash_cannot_be_replaced() {
        let mut catalog = SecurityCatalog::new();
        let fake = sec("$CASH", None, 1.0, 1.0, 1.0);
        assert!(catalog.insert(fake).is_none());
        assert!(catalog.get(&catalog.cash_symbol()).unwrap().is_cash());
    }

    #[test]
    fn prefers_pure_fund_over_blend() {
        let catalog = SecurityCatalog::from_securities([
            sec("VBIAX", Some("V"), 0.01, 0.6, 1.0),
            sec("VTSAX", Some("V"), 0.04, 1.0, 1.0),
        ]);
        let best = catalog.best_for("V", Bucket::StockDomestic).unwrap();
        assert_eq!(best.symbol.as_str(), "VTSAX");
    }

    #[test]
    fn ties_break_on_expense_then_symbol() {
        let catalog = SecurityCatalog::from_securities([
            sec("VTSAX", Some("V"), 0.04, 1.0, 1.0),
            sec("VTI", Some("V"), 0.03, 1.0, 1.0),
            sec("ITOT", Some("V"), 0.03, 1.0, 1.0),
        ]);
        let best = catalog.best_for("V", Bucket::StockDomestic).unwrap();
        assert_eq!(best.symbol.as_str(), "ITOT");
    }

    #[test]
    fn brokerage_scope_and_universal_securities() {
        let catalog = SecurityCatalog::from_securities([
            sec("FXAIX", Some("Fidelity"), 0.015, 1.0, 1.0),
            sec("BND", None, 0.03, 0.0, 1.0),
        ]);
        assert!(catalog.offers("Fidelity", Bucket::StockDomestic));
        assert!(!catalog.offers("Vanguard", Bucket::StockDomestic));
        assert!(catalog.offers("Vanguard", Bucket::BondDomestic));
        assert!(!catalog.offers("Vanguard", Bucket::BondInternational));
        assert_eq!(catalog.for_brokerage("Vanguard").count(), 2); // BND + cash
    }

    #[test]
    fn selection_outlives_brokerage_name() {
        let catalog = SecurityCatalog::from_securities([sec("VTSAX", Some("V"), 0.04, 1.0, 1.0)]);
        let best = {
            let brokerage = String::from("V");
            catalog.best_for(&brokerage, Bucket::StockDomestic)
        };
        assert_eq!(best.map(|s| s.symbol.as_str()), Some("VTSAX"));
    }

    #[test]
    fn never_selects_cash() {
        let catalog = SecurityCatalog::new();
        for b in Bucket::ALL {
            assert!(catalog.best_for("any", b).is_none());
        }
    }
}
