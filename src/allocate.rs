//! Greedy allocation for one priority ordering.
//!
//! The allocator fills each exposure bucket in priority order, walking the
//! bucket's account-type preference and buying the best fund each account's
//! brokerage offers. Account capacity and bucket need live in flat arrays
//! indexed by account and bucket position, owned by a single call.

use std::fmt;

use crate::catalog::SecurityCatalog;
use crate::exposure::{Bucket, Exposure};
use crate::portfolio::{Account, AccountType, Portfolio, Position};
use crate::security::Security;
use crate::types::{DUST, Dollars, Symbol};

/// A fatal problem with one candidate allocation.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AllocationError {
    /// No account with spare capacity can buy anything in this bucket.
    #[error("no account has access to {0}")]
    Unreachable(Bucket),
    /// An account ended with more committed than it holds.
    #[error("account {account} overdrawn by ${amount:.2}")]
    Overdraft { account: String, amount: Dollars },
}

/// A candidate portfolio and the errors that invalidate it, if any.
#[derive(Clone, Debug)]
pub struct Allocation {
    pub portfolio: Portfolio,
    pub errors: Vec<AllocationError>,
}

impl Allocation {
    /// True if no fatal error was recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for account in self.portfolio.accounts() {
            writeln!(f, "{}:", account.key())?;
            for p in &account.positions {
                let hold = if p.hold { " (hold)" } else { "" };
                writeln!(f, "  {:<8} ${:>14.2}{hold}", p.symbol, p.value)?;
            }
        }
        for e in &self.errors {
            writeln!(f, "error: {e}")?;
        }
        Ok(())
    }
}

/// Greedy allocator bound to one portfolio, catalog and set of targets.
///
/// Construction precomputes the best fund for every (account, bucket) pair,
/// so [`Allocator::allocate`] does no catalog scans. The allocator only
/// borrows its inputs and is `Sync`; many threads may call `allocate`
/// concurrently.
#[derive(Debug)]
pub struct Allocator<'a> {
    original: &'a Portfolio,
    exposures: [Exposure; Bucket::COUNT],
    cash: Symbol,
    /// Catalog entry per original position (`None` if unknown).
    held: Vec<Vec<Option<&'a Security>>>,
    /// Best fund per account per bucket.
    best: Vec<[Option<&'a Security>; Bucket::COUNT]>,
    capacity: Vec<Dollars>,
}

impl<'a> Allocator<'a> {
    pub fn new(
        original: &'a Portfolio,
        catalog: &'a SecurityCatalog,
        exposures: [Exposure; Bucket::COUNT],
    ) -> Self {
        let accounts = original.accounts();
        Self {
            original,
            exposures,
            cash: catalog.cash_symbol(),
            held: accounts
                .iter()
                .map(|a| a.positions.iter().map(|p| catalog.get(&p.symbol)).collect())
                .collect(),
            best: accounts
                .iter()
                .map(|a| Bucket::ALL.map(|b| catalog.best_for(&a.brokerage, b)))
                .collect(),
            capacity: accounts.iter().map(Account::total_value).collect(),
        }
    }

    pub fn exposures(&self) -> &[Exposure; Bucket::COUNT] {
        &self.exposures
    }

    /// Fill every exposure for one priority ordering.
    ///
    /// `order` lists buckets in fill priority. `preferences[b.index()]` is the
    /// account-type order used for bucket `b`. Buckets missing from `order`
    /// are not filled.
    pub fn allocate(
        &self,
        order: &[Bucket],
        preferences: &[&[AccountType]; Bucket::COUNT],
    ) -> Allocation {
        let accounts = self.original.accounts();
        let mut capacity = self.capacity.clone();
        let mut need: [Dollars; Bucket::COUNT] = self.exposures.map(|e| e.target);
        let mut holdings: Vec<Vec<Position>> = vec![Vec::new(); accounts.len()];
        let mut errors = Vec::new();

        // Held positions are committed before anything is bought.
        for (i, account) in accounts.iter().enumerate() {
            for (p, security) in account.positions.iter().zip(&self.held[i]) {
                if !p.hold {
                    continue;
                }
                capacity[i] -= p.value;
                if let Some(security) = security {
                    for b in Bucket::ALL {
                        need[b.index()] -= p.exposure(security, b);
                    }
                }
                holdings[i].push(p.clone());
            }
        }

        for &bucket in order {
            let bi = bucket.index();
            if need[bi] <= DUST {
                continue;
            }

            let reachable =
                (0..accounts.len()).any(|i| capacity[i] > DUST && self.best[i][bi].is_some());
            if !reachable {
                errors.push(AllocationError::Unreachable(bucket));
                continue;
            }

            'types: for &ty in preferences[bi] {
                for (i, account) in accounts.iter().enumerate() {
                    if account.account_type != ty || capacity[i] <= DUST {
                        continue;
                    }
                    let Some(security) = self.best[i][bi] else {
                        continue;
                    };

                    let amount = capacity[i].min(need[bi] / security.coverage(bucket));
                    capacity[i] -= amount;
                    for b in Bucket::ALL {
                        need[b.index()] -= amount * security.coverage(b);
                    }
                    buy(&mut holdings[i], security.symbol, amount);

                    if need[bi] <= DUST {
                        break 'types;
                    }
                }
            }
        }

        for (i, account) in accounts.iter().enumerate() {
            if capacity[i] > DUST {
                buy(&mut holdings[i], self.cash, capacity[i]);
            } else if capacity[i] < -DUST {
                errors.push(AllocationError::Overdraft {
                    account: account.name.clone(),
                    amount: -capacity[i],
                });
            }
        }

        let accounts = accounts
            .iter()
            .zip(holdings)
            .map(|(account, mut positions)| {
                positions.sort_by_key(|p| p.symbol);
                Account::new(
                    account.name.clone(),
                    account.brokerage.clone(),
                    account.account_type,
                    positions,
                )
            })
            .collect();

        Allocation {
            portfolio: Portfolio::new(accounts),
            errors,
        }
    }

    /// Allocate using every bucket's default preference, in bucket order.
    pub fn allocate_default(&self) -> Allocation {
        let prefs = self.exposures.each_ref().map(|e| e.preference.as_slice());
        self.allocate(&Bucket::ALL, &prefs)
    }
}

/// Add `amount` of `symbol`, merging into an existing position.
fn buy(positions: &mut Vec<Position>, symbol: Symbol, amount: Dollars) {
    match positions.iter_mut().find(|p| p.symbol == symbol) {
        Some(p) => p.value += amount,
        None => positions.push(Position::new(symbol, amount)),
    }
}
