//! ORIGINAL→TARGET diff engine.
//!
//! Computes the buy and sell orders that turn one portfolio into another,
//! account by account and symbol by symbol.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::portfolio::{Account, AccountKey, Portfolio};
use crate::types::{Dollars, Symbol, sum_dollars};

/// Net changes smaller than this (half a cent) produce no order.
pub const MIN_ORDER_VALUE: Dollars = 0.005;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Action {
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
        })
    }
}

/// A single rebalance order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    pub account: AccountKey,
    pub symbol: Symbol,
    pub action: Action,
    /// Dollar magnitude, always positive.
    pub amount: Dollars,
}

impl Order {
    /// Amount with sells negative.
    pub fn signed_amount(&self) -> Dollars {
        match self.action {
            Action::Buy => self.amount,
            Action::Sell => -self.amount,
        }
    }

    /// Whether this order sells inside a taxable account.
    pub fn is_taxable_sale(&self) -> bool {
        self.action == Action::Sell && self.account.account_type.is_taxable()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<4} {:<8} ${:>14.2}  {}",
            self.action, self.symbol, self.amount, self.account
        )
    }
}

/// Compute the orders that move `original` to `target`.
///
/// Accounts are matched by identity (name, brokerage and type). Accounts
/// only in `original` are sold off entirely; accounts only in `target` are
/// bought entirely. Orders follow `original`'s account order, then accounts
/// new in `target`; within an account they are sorted by symbol.
pub fn compute_orders(original: &Portfolio, target: &Portfolio) -> Vec<Order> {
    let mut orders = Vec::new();

    for old in original.accounts() {
        let key = old.key();
        let new = target.account(&key);
        diff_account(&key, Some(old), new, &mut orders);
    }

    for new in target.accounts() {
        let key = new.key();
        if original.account(&key).is_none() {
            diff_account(&key, None, Some(new), &mut orders);
        }
    }

    orders
}

fn diff_account(
    key: &AccountKey,
    old: Option<&Account>,
    new: Option<&Account>,
    orders: &mut Vec<Order>,
) {
    let mut deltas: FxHashMap<Symbol, Dollars> = FxHashMap::default();
    for p in old.into_iter().flat_map(|a| &a.positions) {
        *deltas.entry(p.symbol).or_default() -= p.value;
    }
    for p in new.into_iter().flat_map(|a| &a.positions) {
        *deltas.entry(p.symbol).or_default() += p.value;
    }

    let mut deltas: Vec<(Symbol, Dollars)> = deltas
        .into_iter()
        .filter(|(_, d)| d.abs() >= MIN_ORDER_VALUE)
        .collect();
    deltas.sort_by_key(|(sym, _)| *sym);

    orders.extend(deltas.into_iter().map(|(symbol, delta)| Order {
        account: key.clone(),
        symbol,
        action: if delta > 0.0 { Action::Buy } else { Action::Sell },
        amount: delta.abs(),
    }));
}

/// Dollars sold inside taxable accounts.
pub fn taxable_sales(orders: &[Order]) -> Dollars {
    sum_dollars(
        orders
            .iter()
            .filter(|o| o.is_taxable_sale())
            .map(|o| o.amount),
    )
}

/// Total dollars bought (equal to dollars sold when money is conserved).
pub fn turnover(orders: &[Order]) -> Dollars {
    sum_dollars(
        orders
            .iter()
            .filter(|o| o.action == Action::Buy)
            .map(|o| o.amount),
    )
}
