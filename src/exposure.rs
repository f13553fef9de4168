//! Target exposures: the four asset class × location buckets and their
//! dollar targets.

use std::fmt;

use crate::error::{Error, Result};
use crate::portfolio::AccountType;
use crate::types::Dollars;

/// Stocks or bonds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AssetClass {
    Stock,
    Bond,
}

/// Domestic or international.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AssetLocation {
    Domestic,
    International,
}

/// One of the four exposure buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Bucket {
    StockDomestic,
    StockInternational,
    BondDomestic,
    BondInternational,
}

impl Bucket {
    pub const COUNT: usize = 4;

    /// All buckets in index order.
    pub const ALL: [Bucket; Bucket::COUNT] = [
        Bucket::StockDomestic,
        Bucket::StockInternational,
        Bucket::BondDomestic,
        Bucket::BondInternational,
    ];

    /// Stable array index of this bucket.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn class(self) -> AssetClass {
        match self {
            Bucket::StockDomestic | Bucket::StockInternational => AssetClass::Stock,
            Bucket::BondDomestic | Bucket::BondInternational => AssetClass::Bond,
        }
    }

    pub fn location(self) -> AssetLocation {
        match self {
            Bucket::StockDomestic | Bucket::BondDomestic => AssetLocation::Domestic,
            Bucket::StockInternational | Bucket::BondInternational => {
                AssetLocation::International
            }
        }
    }

    /// Account types this bucket prefers to be placed in, best first.
    ///
    /// Growth-heavy domestic stock goes to tax-free accounts first, bond
    /// income to tax-deferred, and international holdings to taxable accounts
    /// where the foreign tax credit can be claimed.
    pub fn default_preference(self) -> [AccountType; AccountType::COUNT] {
        use AccountType::*;
        match self {
            Bucket::StockDomestic => [TaxFree, Taxable, TaxDeferred],
            Bucket::StockInternational => [Taxable, TaxFree, TaxDeferred],
            Bucket::BondDomestic => [TaxDeferred, TaxFree, Taxable],
            Bucket::BondInternational => [Taxable, TaxDeferred, TaxFree],
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class() {
            AssetClass::Stock => "stock",
            AssetClass::Bond => "bond",
        };
        let location = match self.location() {
            AssetLocation::Domestic => "domestic",
            AssetLocation::International => "international",
        };
        write!(f, "{class}/{location}")
    }
}

/// The three allocation knobs, each a fraction in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetRatios {
    /// Fraction of the portfolio held in stocks.
    pub stock: f64,
    /// Fraction of the stock allocation held domestically.
    pub domestic_stock: f64,
    /// Fraction of the bond allocation held domestically.
    pub domestic_bond: f64,
}

impl TargetRatios {
    /// Create validated ratios.
    pub fn new(stock: f64, domestic_stock: f64, domestic_bond: f64) -> Result<Self> {
        let ratios = Self {
            stock,
            domestic_stock,
            domestic_bond,
        };
        ratios.validate()?;
        Ok(ratios)
    }

    /// Check every ratio lies in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("stock", self.stock),
            ("domestic_stock", self.domestic_stock),
            ("domestic_bond", self.domestic_bond),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidRatio { name, value });
            }
        }
        Ok(())
    }

    /// Fraction of the whole portfolio targeted at `bucket`.
    pub fn fraction(&self, bucket: Bucket) -> f64 {
        let bond = 1.0 - self.stock;
        match bucket {
            Bucket::StockDomestic => self.stock * self.domestic_stock,
            Bucket::StockInternational => self.stock * (1.0 - self.domestic_stock),
            Bucket::BondDomestic => bond * self.domestic_bond,
            Bucket::BondInternational => bond * (1.0 - self.domestic_bond),
        }
    }
}

/// A target dollar exposure for one bucket.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Exposure {
    pub bucket: Bucket,
    /// Dollars the portfolio should hold in this bucket.
    pub target: Dollars,
    /// Account types to fill from, best first.
    pub preference: [AccountType; AccountType::COUNT],
}

impl Exposure {
    /// Fraction of `total` this exposure represents (0 for an empty total).
    pub fn fraction_of(&self, total: Dollars) -> f64 {
        if total > 0.0 { self.target / total } else { 0.0 }
    }
}

/// Compute the four target exposures for a portfolio worth `total`.
///
/// Returned in [`Bucket::ALL`] order; `exposures[b.index()]` is bucket `b`.
///
/// ```
/// use nanofolio::{target_exposures, Bucket, TargetRatios};
///
/// let ratios = TargetRatios::new(0.6, 0.7, 1.0).unwrap();
/// let exposures = target_exposures(100_000.0, &ratios);
/// assert!((exposures[Bucket::StockDomestic.index()].target - 42_000.0).abs() < 1e-9);
/// assert_eq!(exposures[Bucket::BondInternational.index()].target, 0.0);
/// ```
pub fn target_exposures(total: Dollars, ratios: &TargetRatios) -> [Exposure; Bucket::COUNT] {
    Bucket::ALL.map(|bucket| Exposure {
        bucket,
        target: total * ratios.fraction(bucket),
        preference: bucket.default_preference(),
    })
}
