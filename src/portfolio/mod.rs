//! Portfolios: ordered accounts, positions and the derived queries the
//! scorer needs.
//!
//! # Example
//!
//! ```
//! use nanofolio::portfolio::{Account, AccountType, Portfolio, Position};
//! use nanofolio::{Bucket, Security, SecurityCatalog, Symbol};
//!
//! let catalog = SecurityCatalog::from_securities([
//!     Security::new(Symbol::new("VTSAX"), "Total Stock", None, 0.04, 1.0, 1.0).unwrap(),
//!     Security::new(Symbol::new("VBTLX"), "Total Bond", None, 0.05, 0.0, 1.0).unwrap(),
//! ]);
//! let portfolio = Portfolio::new(vec![Account::new(
//!     "Roth",
//!     "Vanguard",
//!     AccountType::TaxFree,
//!     vec![
//!         Position::new(Symbol::new("VTSAX"), 6_000.0),
//!         Position::new(Symbol::new("VBTLX"), 4_000.0),
//!     ],
//! )]);
//!
//! portfolio.validate(&catalog).unwrap();
//! assert_eq!(portfolio.total_value(), 10_000.0);
//! assert!((portfolio.bucket_fraction(&catalog, Bucket::StockDomestic) - 0.6).abs() < 1e-12);
//! ```

pub mod account;
pub mod position;

pub use account::{Account, AccountKey, AccountType};
pub use position::Position;

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashSet, FxHasher};

use crate::catalog::SecurityCatalog;
use crate::error::{Error, Result};
use crate::exposure::Bucket;
use crate::types::{Dollars, sum_dollars};

/// Dollars per (bucket, account type), indexed `[bucket.index()][type.index()]`.
pub type Placement = [[Dollars; AccountType::COUNT]; Bucket::COUNT];

/// An ordered set of accounts.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Portfolio {
    accounts: Vec<Account>,
}

impl Portfolio {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// Reject input the search cannot work with: duplicate symbols within an
    /// account, negative or non-finite values, and symbols missing from the
    /// catalog.
    pub fn validate(&self, catalog: &SecurityCatalog) -> Result<()> {
        for account in &self.accounts {
            let mut seen = FxHashSet::default();
            for p in &account.positions {
                if !seen.insert(p.symbol) {
                    return Err(Error::DuplicateSymbol {
                        account: account.name.clone(),
                        symbol: p.symbol.to_string(),
                    });
                }
                if !p.value.is_finite() || p.value < 0.0 {
                    return Err(Error::NegativeValue {
                        account: account.name.clone(),
                        symbol: p.symbol.to_string(),
                    });
                }
                if !catalog.contains(&p.symbol) {
                    return Err(Error::UnknownSymbol {
                        account: account.name.clone(),
                        symbol: p.symbol.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    // === Queries ===

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Find an account by identity.
    pub fn account(&self, key: &AccountKey) -> Option<&Account> {
        self.accounts.iter().find(|a| a.is(key))
    }

    /// Sum of every position value.
    pub fn total_value(&self) -> Dollars {
        sum_dollars(self.accounts.iter().map(Account::total_value))
    }

    /// Number of positions across all accounts.
    pub fn position_count(&self) -> usize {
        self.accounts.iter().map(|a| a.positions.len()).sum()
    }

    /// Value-weighted average expense ratio, in percent. Zero when empty.
    pub fn expense_ratio(&self, catalog: &SecurityCatalog) -> f64 {
        let total = self.total_value();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted = sum_dollars(
            self.accounts
                .iter()
                .flat_map(|a| &a.positions)
                .filter_map(|p| catalog.get(&p.symbol).map(|s| p.value * s.expense_ratio)),
        );
        weighted / total
    }

    /// Dollars held in `bucket` across all accounts.
    pub fn bucket_value(&self, catalog: &SecurityCatalog, bucket: Bucket) -> Dollars {
        sum_dollars(self.accounts.iter().map(|a| a.exposure(catalog, bucket)))
    }

    /// Fraction of the portfolio held in `bucket`.
    pub fn bucket_fraction(&self, catalog: &SecurityCatalog, bucket: Bucket) -> f64 {
        fraction(self.bucket_value(catalog, bucket), self.total_value())
    }

    /// Dollars held in accounts of type `ty`.
    pub fn account_type_value(&self, ty: AccountType) -> Dollars {
        sum_dollars(
            self.accounts
                .iter()
                .filter(|a| a.account_type == ty)
                .map(Account::total_value),
        )
    }

    /// Fraction of the portfolio held in accounts of type `ty`.
    pub fn account_type_fraction(&self, ty: AccountType) -> f64 {
        fraction(self.account_type_value(ty), self.total_value())
    }

    /// Dollars per (bucket, account type).
    pub fn placement(&self, catalog: &SecurityCatalog) -> Placement {
        let mut placement = [[0.0; AccountType::COUNT]; Bucket::COUNT];
        for account in &self.accounts {
            let exposures = account.exposures(catalog);
            for bucket in Bucket::ALL {
                placement[bucket.index()][account.account_type.index()] +=
                    exposures[bucket.index()];
            }
        }
        placement
    }

    /// Fraction of `bucket`'s dollars that sit in accounts of type `ty`.
    pub fn bucket_type_fraction(&self, catalog: &SecurityCatalog, bucket: Bucket, ty: AccountType) -> f64 {
        let row = self.placement(catalog)[bucket.index()];
        fraction(row[ty.index()], sum_dollars(row))
    }

    /// Structural hash of the allocation: every account's positions,
    /// symbol and exact dollar value, in order.
    ///
    /// Two allocations with the same accounts and bit-identical positions
    /// share a fingerprint.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for (i, account) in self.accounts.iter().enumerate() {
            i.hash(&mut hasher);
            account.positions.len().hash(&mut hasher);
            for p in &account.positions {
                p.symbol.hash(&mut hasher);
                p.value.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

#[inline]
fn fraction(part: Dollars, whole: Dollars) -> f64 {
    if whole > 0.0 { part / whole } else { 0.0 }
}
