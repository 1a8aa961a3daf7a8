// Cryptax
// Written in 2024 by
//   Andrew Poelstra <tradetracker@wpsoftware.net>
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication
// along with this software.
// If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.
//

//! Unrealized Cost Basis
//!
//! Summarizes the coins each account still holds: how much was paid for
//! them, split by holding period, and the average cost per coin.
//!

use super::{GainEntry, Term};
use crate::units::{div, Decimal};
use std::collections::BTreeMap;

/// Unrealized cost basis of a single account
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct AccountCostBasis {
    pub short_term: Option<Decimal>,
    pub long_term: Option<Decimal>,
    /// Total cost basis divided by total coins held
    pub average: Option<Decimal>,
}

/// Unrealized cost basis of every account
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct UnrealizedCostBasis {
    accounts: BTreeMap<String, AccountCostBasis>,
}

impl UnrealizedCostBasis {
    /// Sums up the unrealized entries of every account's gain list
    ///
    /// Each entry's holding period is measured to the date it was aged at.
    pub fn from_gains(gains: &BTreeMap<String, Vec<GainEntry>>) -> Self {
        let mut accounts = BTreeMap::new();
        for (account, list) in gains.iter().filter(|(_, list)| !list.is_empty()) {
            let mut cb = AccountCostBasis::default();
            let mut coins = Decimal::zero();
            for entry in list.iter().filter(|entry| !entry.is_realized()) {
                let sum = match entry.term() {
                    Term::ShortTerm => &mut cb.short_term,
                    Term::LongTerm => &mut cb.long_term,
                };
                *sum = Some(sum.take().unwrap_or_default() + &entry.cost_basis);
                coins += &entry.amount;
            }
            if cb.short_term.is_some() || cb.long_term.is_some() {
                let total = cb.short_term.clone().unwrap_or_default()
                    + cb.long_term.clone().unwrap_or_default();
                cb.average = div(&total, &coins);
            }
            accounts.insert(account.clone(), cb);
        }
        UnrealizedCostBasis { accounts }
    }

    /// The summary for a single account, if it had any transactions
    pub fn account(&self, account: &str) -> Option<&AccountCostBasis> {
        self.accounts.get(account)
    }

    /// Iterates over all accounts in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AccountCostBasis)> {
        self.accounts.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal;
    use crate::tax::compute_gains;
    use crate::transaction::test_util::*;
    use crate::transaction::TransactionType;
    use chrono::NaiveDate;

    #[test]
    fn split_by_term() {
        let now = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
        let mut gains = BTreeMap::new();
        gains.insert(
            "BTC".to_owned(),
            compute_gains(
                "BTC",
                &[
                    trade("BTC", "2020-1-1", TransactionType::Acquire, "1", "100"),
                    trade("BTC", "2021-3-1", TransactionType::Acquire, "1", "300"),
                    trade("BTC", "2021-3-2", TransactionType::Acquire, "2", "500"),
                    trade("BTC", "2021-6-1", TransactionType::Dispose, "0.5", "1000"),
                ],
                now,
            )
            .unwrap(),
        );
        gains.insert(
            "ETH".to_owned(),
            compute_gains(
                "ETH",
                &[
                    trade("ETH", "2021-1-1", TransactionType::Acquire, "1", "10"),
                    trade("ETH", "2021-2-1", TransactionType::Dispose, "1", "20"),
                ],
                now,
            )
            .unwrap(),
        );
        gains.insert("USDC".to_owned(), vec![]);

        let ucb = UnrealizedCostBasis::from_gains(&gains);
        let btc = ucb.account("BTC").unwrap();
        // Half of the first lot, and the lot bought exactly a year ago
        assert_eq!(btc.long_term, Some(decimal!(50)));
        assert_eq!(btc.short_term, Some(decimal!(800)));
        let avg = btc.average.clone().unwrap();
        assert!((avg - decimal!(850) / decimal!(3.5)).abs() < decimal!(0.0000000001));

        // Everything was sold
        let eth = ucb.account("ETH").unwrap();
        assert_eq!(*eth, AccountCostBasis::default());

        assert!(ucb.account("USDC").is_none());
        let names: Vec<&str> = ucb.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["BTC", "ETH"]);
    }
}
