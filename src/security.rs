//! A tradable security and its exposure breakdown.

use crate::error::{Error, Result};
use crate::exposure::{AssetClass, AssetLocation, Bucket};
use crate::types::Symbol;

/// Symbol of the synthetic cash security.
pub const CASH_SYMBOL: &str = "$CASH";

/// A fund or other security that accounts may hold.
///
/// Each security splits its value across the four exposure buckets by its
/// class ratios (stock vs. bond) and location ratios (domestic vs.
/// international). A blended fund covers several buckets at once; cash
/// covers none.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "SecurityRecord", try_from = "SecurityRecord"))]
pub struct Security {
    pub symbol: Symbol,
    pub description: String,
    /// Brokerage that offers this security. `None` = available everywhere.
    pub brokerage: Option<String>,
    /// Annual expense ratio in percent (0.04 = 0.04%/yr).
    pub expense_ratio: f64,
    stock: f64,
    bond: f64,
    domestic: f64,
    international: f64,
}

impl Security {
    /// Create a security from its stock and domestic fractions.
    ///
    /// Bond and international fractions are the complements.
    pub fn new(
        symbol: Symbol,
        description: impl Into<String>,
        brokerage: Option<String>,
        expense_ratio: f64,
        stock_ratio: f64,
        domestic_ratio: f64,
    ) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidSecurity {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        };
        if !(0.0..=1.0).contains(&stock_ratio) {
            return Err(invalid("stock ratio must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&domestic_ratio) {
            return Err(invalid("domestic ratio must be in [0, 1]"));
        }
        if !expense_ratio.is_finite() || expense_ratio < 0.0 {
            return Err(invalid("expense ratio must be >= 0"));
        }
        Ok(Self {
            symbol,
            description: description.into(),
            brokerage,
            expense_ratio,
            stock: stock_ratio,
            bond: 1.0 - stock_ratio,
            domestic: domestic_ratio,
            international: 1.0 - domestic_ratio,
        })
    }

    /// The synthetic cash security: every ratio is zero, no expense, and
    /// it is available at every brokerage.
    pub fn cash() -> Self {
        Self {
            symbol: Symbol::new(CASH_SYMBOL),
            description: "Cash".into(),
            brokerage: None,
            expense_ratio: 0.0,
            stock: 0.0,
            bond: 0.0,
            domestic: 0.0,
            international: 0.0,
        }
    }

    pub fn is_cash(&self) -> bool {
        self.symbol.as_str() == CASH_SYMBOL
    }

    pub fn class_ratio(&self, class: AssetClass) -> f64 {
        match class {
            AssetClass::Stock => self.stock,
            AssetClass::Bond => self.bond,
        }
    }

    pub fn location_ratio(&self, location: AssetLocation) -> f64 {
        match location {
            AssetLocation::Domestic => self.domestic,
            AssetLocation::International => self.international,
        }
    }

    /// Fraction of this security's value that lands in `bucket`.
    #[inline]
    pub fn coverage(&self, bucket: Bucket) -> f64 {
        self.class_ratio(bucket.class()) * self.location_ratio(bucket.location())
    }

    /// Whether the security can be bought through `brokerage`.
    pub fn available_at(&self, brokerage: &str) -> bool {
        self.brokerage.as_deref().is_none_or(|b| b.eq_ignore_ascii_case(brokerage))
    }
}

/// Serialized form of a [`Security`]: the two free ratios only.
/// Deserialization goes through [`Security::new`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SecurityRecord {
    symbol: Symbol,
    #[serde(default)]
    description: String,
    #[serde(default)]
    brokerage: Option<String>,
    expense_ratio: f64,
    stock_ratio: f64,
    domestic_ratio: f64,
}

#[cfg(feature = "serde")]
impl From<Security> for SecurityRecord {
    fn from(s: Security) -> Self {
        Self {
            symbol: s.symbol,
            description: s.description,
            brokerage: s.brokerage,
            expense_ratio: s.expense_ratio,
            stock_ratio: s.stock,
            domestic_ratio: s.domestic,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<SecurityRecord> for Security {
    type Error = Error;

    fn try_from(r: SecurityRecord) -> Result<Self> {
        if r.symbol.as_str() == CASH_SYMBOL {
            return Ok(Security::cash());
        }
        Security::new(
            r.symbol,
            r.description,
            r.brokerage,
            r.expense_ratio,
            r.stock_ratio,
            r.domestic_ratio,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blend() -> Security {
        Security::new(Symbol::new("VTWAX"), "Blend", None, 0.1, 0.6, 0.75).unwrap()
    }

    #[test]
    fn coverage_splits_value() {
        let s = blend();
        assert!((s.coverage(Bucket::StockDomestic) - 0.45).abs() < 1e-12);
        assert!((s.coverage(Bucket::StockInternational) - 0.15).abs() < 1e-12);
        assert!((s.coverage(Bucket::BondDomestic) - 0.30).abs() < 1e-12);
        assert!((s.coverage(Bucket::BondInternational) - 0.10).abs() < 1e-12);
        let total: f64 = Bucket::ALL.iter().map(|&b| s.coverage(b)).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cash_covers_nothing() {
        let cash = Security::cash();
        assert!(cash.is_cash());
        for b in Bucket::ALL {
            assert_eq!(cash.coverage(b), 0.0);
        }
        assert!(cash.available_at("anywhere"));
    }

    #[test]
    fn brokerage_scoping() {
        let s = Security::new(Symbol::new("FXAIX"), "", Some("Fidelity".into()), 0.015, 1.0, 1.0)
            .unwrap();
        assert!(s.available_at("fidelity"));
        assert!(!s.available_at("Vanguard"));
    }

    #[test]
    fn rejects_bad_ratios() {
        let sym = Symbol::new("BAD");
        assert!(Security::new(sym, "", None, 0.1, 1.2, 0.5).is_err());
        assert!(Security::new(sym, "", None, 0.1, 0.5, f64::NAN).is_err());
        assert!(Security::new(sym, "", None, -0.1, 0.5, 0.5).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_validates_ratios() {
        let json = serde_json::to_string(&blend()).unwrap();
        assert!(json.contains("\"stock_ratio\":0.6"));
        let back: Security = serde_json::from_str(&json).unwrap();
        assert_eq!(back, blend());

        let bad = r#"{"symbol":"BAD","expense_ratio":0.1,"stock_ratio":1.5,"domestic_ratio":0.5}"#;
        assert!(serde_json::from_str::<Security>(bad).is_err());
        let negative = r#"{"symbol":"BAD","expense_ratio":-5.0,"stock_ratio":0.5,"domestic_ratio":0.5}"#;
        assert!(serde_json::from_str::<Security>(negative).is_err());
        // The derived ratios are not accepted as input.
        let raw = r#"{"symbol":"BAD","expense_ratio":0.1,"stock":0.9,"bond":0.9,"domestic":2.0}"#;
        assert!(serde_json::from_str::<Security>(raw).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn cash_round_trips() {
        let json = serde_json::to_string(&Security::cash()).unwrap();
        let back: Security = serde_json::from_str(&json).unwrap();
        assert!(back.is_cash());
        for b in Bucket::ALL {
            assert_eq!(back.coverage(b), 0.0);
        }
    }
}
