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

//! Income and Expense Allocation
//!
//! Walks all transactions in time order and buckets ordinary income, mining
//! income and mining expense by calendar year and account. Mining contracts
//! are also amortized across the years they cover, and realized capital
//! gains are folded in per year. Years are produced densely from the first
//! year with any activity to the last.
//!

use super::{amortize, AccountMap, Error, GainEntry, Term, YearMap};
use crate::transaction::{self, Transaction, TransactionType};
use log::debug;
use std::collections::BTreeMap;
use std::mem;

/// Per-account income and expense totals for one calendar year
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct IncomeYearEntry {
    pub year: i32,
    pub ordinary_income: AccountMap,
    pub short_term_gain: AccountMap,
    pub long_term_gain: AccountMap,
    pub mining_income: AccountMap,
    pub mining_expense: AccountMap,
    pub mining_amortized_expense: AccountMap,
}

/// The running state of the allocator
///
/// Folded over the chronologically sorted transaction stream with
/// [YearAllocationState::push]; [YearAllocationState::finish] drains
/// whatever is still pending. The cursor only ever moves forward, and every
/// year it passes is emitted exactly once.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct YearAllocationState {
    /// The year currently being accumulated, once any income-type transaction
    /// has been seen
    cursor: Option<i32>,
    ordinary_income: AccountMap,
    mining_income: AccountMap,
    mining_expense: AccountMap,
    amortized: YearMap,
    short_term: YearMap,
    long_term: YearMap,
    entries: Vec<IncomeYearEntry>,
}

impl YearAllocationState {
    /// Creates a new state, pre-loaded with the realized capital gains of
    /// every account
    pub fn new(gains: &BTreeMap<String, Vec<GainEntry>>) -> Self {
        let mut ret = YearAllocationState::default();
        for (account, list) in gains {
            for gain in list {
                let (year, amount) = match (gain.tax_year(), gain.gain()) {
                    (Some(year), Some(amount)) => (year, amount),
                    _ => continue,
                };
                let map = match gain.term() {
                    Term::ShortTerm => &mut ret.short_term,
                    Term::LongTerm => &mut ret.long_term,
                };
                *map.entry(year)
                    .or_default()
                    .entry(account.clone())
                    .or_default() += amount;
            }
        }
        ret
    }

    fn earliest_gain_year(&self) -> Option<i32> {
        let st = self.short_term.keys().next().copied();
        let lt = self.long_term.keys().next().copied();
        match (st, lt) {
            (Some(st), Some(lt)) => Some(st.min(lt)),
            (st, lt) => st.or(lt),
        }
    }

    /// Emits the entry for the cursor year and moves on to the next one
    fn flush_year(&mut self, year: i32) {
        let entry = IncomeYearEntry {
            year,
            ordinary_income: mem::take(&mut self.ordinary_income),
            short_term_gain: self.short_term.remove(&year).unwrap_or_default(),
            long_term_gain: self.long_term.remove(&year).unwrap_or_default(),
            mining_income: mem::take(&mut self.mining_income),
            mining_expense: mem::take(&mut self.mining_expense),
            mining_amortized_expense: self.amortized.remove(&year).unwrap_or_default(),
        };
        debug!("flushing income year {}: {:?}", year, entry);
        self.entries.push(entry);
        self.cursor = Some(year + 1);
    }

    /// Whether there is anything left to flush at or after the cursor
    fn has_pending(&self, year: i32) -> bool {
        !self.ordinary_income.is_empty()
            || !self.mining_income.is_empty()
            || !self.mining_expense.is_empty()
            || self.amortized.range(year..).next().is_some()
            || self.short_term.range(year..).next().is_some()
            || self.long_term.range(year..).next().is_some()
    }

    /// Accumulates a single transaction
    ///
    /// Only income and mining transactions are allocated here; everything
    /// else reaches the allocator through its realized gains.
    pub fn push(mut self, tx: &Transaction) -> Result<Self, Error> {
        let ty = tx.ty();
        if !matches!(
            ty,
            TransactionType::Income
                | TransactionType::MiningIncome
                | TransactionType::MiningPurchase
                | TransactionType::MiningReinvest
        ) {
            return Ok(self);
        }

        let year = tx.year();
        let mut cursor = match self.cursor {
            Some(cursor) => cursor,
            // Years with capital gains but no income come first
            None => self.earliest_gain_year().map_or(year, |gy| gy.min(year)),
        };
        if year < cursor {
            return Err(Error::OrderingViolation {
                time: tx.time(),
                year: cursor,
            });
        }
        while cursor < year {
            self.flush_year(cursor);
            cursor += 1;
        }
        self.cursor = Some(cursor);

        let usd = tx.usd_value().ok_or(Error::MissingPricingData {
            time: tx.time(),
            ty,
        })?;
        let bucket = match ty {
            TransactionType::Income => &mut self.ordinary_income,
            TransactionType::MiningIncome => &mut self.mining_income,
            _ => &mut self.mining_expense,
        };
        *bucket.entry(tx.account().to_owned()).or_default() += &usd;

        if ty.is_mining_contract() {
            let term_months = tx.term_months().unwrap_or(0);
            amortize::accumulate(
                &mut self.amortized,
                tx.account(),
                tx.time().date(),
                term_months,
                usd,
            )
            .ok_or(Error::ContractTerm {
                time: tx.time(),
                term_months,
            })?;
        }
        Ok(self)
    }

    /// Flushes every remaining year with pending data and returns the entries
    pub fn finish(mut self) -> Vec<IncomeYearEntry> {
        let mut year = match self.cursor.or_else(|| self.earliest_gain_year()) {
            Some(year) => year,
            None => return self.entries,
        };
        while self.has_pending(year) {
            self.flush_year(year);
            year += 1;
        }
        self.entries
    }
}

/// Allocates the income and expenses of all accounts to calendar years
pub fn allocate(
    accounts: &BTreeMap<String, Vec<Transaction>>,
    gains: &BTreeMap<String, Vec<GainEntry>>,
) -> Result<Vec<IncomeYearEntry>, Error> {
    transaction::chronological(accounts.values().flatten())
        .into_iter()
        .try_fold(YearAllocationState::new(gains), YearAllocationState::push)
        .map(YearAllocationState::finish)
}
