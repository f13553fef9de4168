//! Investment accounts and their tax treatment.

use std::fmt;

use crate::catalog::SecurityCatalog;
use crate::exposure::Bucket;
use crate::types::{Dollars, Symbol, sum_dollars};

use super::position::Position;

/// Tax treatment of an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AccountType {
    /// Regular brokerage account; sales realize capital gains.
    Taxable,
    /// Traditional IRA / 401(k): taxed on withdrawal.
    TaxDeferred,
    /// Roth: qualified withdrawals are tax free.
    TaxFree,
}

impl AccountType {
    pub const COUNT: usize = 3;

    pub const ALL: [AccountType; AccountType::COUNT] = [
        AccountType::Taxable,
        AccountType::TaxDeferred,
        AccountType::TaxFree,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether selling inside this account is a taxable event.
    pub fn is_taxable(self) -> bool {
        self == AccountType::Taxable
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Taxable => write!(f, "taxable"),
            AccountType::TaxDeferred => write!(f, "tax-deferred"),
            AccountType::TaxFree => write!(f, "tax-free"),
        }
    }
}

/// Identity of an account: name, brokerage and type together.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountKey {
    pub name: String,
    pub brokerage: String,
    pub account_type: AccountType,
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.brokerage, self.account_type)
    }
}

/// An account: its brokerage, tax treatment and positions.
///
/// Position symbols are unique within an account (checked by
/// [`super::Portfolio::validate`]).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
    pub name: String,
    pub brokerage: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub account_type: AccountType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub positions: Vec<Position>,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        brokerage: impl Into<String>,
        account_type: AccountType,
        positions: Vec<Position>,
    ) -> Self {
        Self {
            name: name.into(),
            brokerage: brokerage.into(),
            account_type,
            positions,
        }
    }

    pub fn key(&self) -> AccountKey {
        AccountKey {
            name: self.name.clone(),
            brokerage: self.brokerage.clone(),
            account_type: self.account_type,
        }
    }

    /// Whether this account has the identity `key`.
    pub fn is(&self, key: &AccountKey) -> bool {
        self.account_type == key.account_type
            && self.name == key.name
            && self.brokerage == key.brokerage
    }

    /// Sum of position values.
    pub fn total_value(&self) -> Dollars {
        sum_dollars(self.positions.iter().map(|p| p.value))
    }

    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol == *symbol)
    }

    /// Dollars this account holds in `bucket`. Unknown symbols count as zero.
    pub fn exposure(&self, catalog: &SecurityCatalog, bucket: Bucket) -> Dollars {
        sum_dollars(
            self.positions
                .iter()
                .filter_map(|p| catalog.get(&p.symbol).map(|s| p.exposure(s, bucket))),
        )
    }

    /// Dollars per bucket, indexed by [`Bucket::index`].
    pub fn exposures(&self, catalog: &SecurityCatalog) -> [Dollars; Bucket::COUNT] {
        Bucket::ALL.map(|b| self.exposure(catalog, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::Security;

    fn catalog() -> SecurityCatalog {
        SecurityCatalog::from_securities([
            Security::new(Symbol::new("VTSAX"), "", None, 0.04, 1.0, 1.0).unwrap(),
            Security::new(Symbol::new("VBIAX"), "", None, 0.07, 0.6, 1.0).unwrap(),
        ])
    }

    fn roth() -> Account {
        Account::new(
            "Roth",
            "Vanguard",
            AccountType::TaxFree,
            vec![
                Position::new(Symbol::new("VTSAX"), 1_000.0),
                Position::new(Symbol::new("VBIAX"), 500.0),
            ],
        )
    }

    #[test]
    fn total_and_exposure() {
        let acct = roth();
        let catalog = catalog();
        assert_eq!(acct.total_value(), 1_500.0);
        let exp = acct.exposures(&catalog);
        assert!((exp[Bucket::StockDomestic.index()] - 1_300.0).abs() < 1e-9);
        assert!((exp[Bucket::BondDomestic.index()] - 200.0).abs() < 1e-9);
        assert_eq!(exp[Bucket::StockInternational.index()], 0.0);
    }

    #[test]
    fn key_identity() {
        let acct = roth();
        let key = acct.key();
        assert!(acct.is(&key));
        let other = AccountKey {
            account_type: AccountType::TaxDeferred,
            ..key
        };
        assert!(!acct.is(&other));
    }

    #[test]
    fn only_taxable_is_taxable() {
        assert!(AccountType::Taxable.is_taxable());
        assert!(!AccountType::TaxDeferred.is_taxable());
        assert!(!AccountType::TaxFree.is_taxable());
    }
}
