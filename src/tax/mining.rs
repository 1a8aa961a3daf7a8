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

//! Mining Economics
//!
//! Reconstructs a dense, day-by-day view of a cloud-mining operation from
//! sparse contract purchases and income payouts. Every contract's cost is
//! spread evenly over the days it is active, and each day's income is
//! compared against the cost basis allocated to that day.
//!

use super::{amortize, Error};
use crate::transaction::{self, Transaction, TransactionType};
use crate::units::{div, Decimal, Hashrate};
use chrono::{Datelike as _, Duration, NaiveDate};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;

/// Conversion factor from GH/s to EH/s
const GH_PER_EH: u64 = 1_000_000_000;

/// How a mining contract was paid for
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum ContractType {
    /// Paid for with new money
    Purchase,
    /// Paid for out of mining proceeds
    Reinvestment,
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ContractType::Purchase => f.write_str("purchase"),
            ContractType::Reinvestment => f.write_str("reinvestment"),
        }
    }
}

/// A cloud-mining contract, with its cost spread evenly over its term
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MiningContract {
    pub ty: ContractType,
    /// The day the contract was bought
    pub acquired: NaiveDate,
    /// First day the contract is active (the day after it was bought)
    pub start: NaiveDate,
    /// Last day the contract is active
    pub end: NaiveDate,
    pub total_usd: Decimal,
    /// Cost allocated to each day from acquisition to end
    pub per_day_usd: Decimal,
}

impl MiningContract {
    /// Builds a contract from a mining purchase or reinvestment transaction
    ///
    /// Returns `Ok(None)` for any other kind of transaction.
    pub fn from_transaction(tx: &Transaction) -> Result<Option<Self>, Error> {
        let ty = match tx.ty() {
            TransactionType::MiningPurchase => ContractType::Purchase,
            TransactionType::MiningReinvest => ContractType::Reinvestment,
            _ => return Ok(None),
        };
        let term_months = tx.term_months().unwrap_or(0);
        let term_err = Error::ContractTerm {
            time: tx.time(),
            term_months,
        };

        let acquired = tx.time().date();
        let end = amortize::end_date(acquired, term_months).ok_or(term_err.clone())?;
        let total_usd = tx.usd_value().ok_or(Error::MissingPricingData {
            time: tx.time(),
            ty: tx.ty(),
        })?;
        let days = Decimal::from((end - acquired).num_days());
        let per_day_usd = div(&total_usd, &days).ok_or(term_err)?;

        Ok(Some(MiningContract {
            ty,
            acquired,
            start: acquired + Duration::days(1),
            end,
            total_usd,
            per_day_usd,
        }))
    }

    /// Whether the contract is active on the given day (inclusive at both ends)
    pub fn is_active(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Mining income received on a single day
#[derive(Clone, PartialEq, Eq, Debug, Default)]
struct DayIncome {
    usd: Decimal,
    coin: Decimal,
    hashrate: Option<Hashrate>,
}

/// One day of mining economics
///
/// A `None` field means there was no data for it on this day, which is
/// different from a zero.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MiningDayEntry {
    pub date: NaiveDate,
    /// Purchase contracts bought today
    pub purchase: Option<Decimal>,
    /// Reinvestment contracts bought today
    pub reinvestment: Option<Decimal>,
    /// Today's share of the cost of active purchase contracts
    pub basis_purchase: Option<Decimal>,
    pub cum_basis_purchase: Option<Decimal>,
    /// Today's share of the cost of all active contracts
    pub basis_purchase_and_reinvest: Option<Decimal>,
    pub income: Option<Decimal>,
    pub cum_income: Option<Decimal>,
    pub hashrate: Option<Hashrate>,
    pub usd_per_coin: Option<Decimal>,
    /// Coins mined per EH/s
    pub coin_yield: Option<Decimal>,
    pub day_rate_purchase_and_reinvest: Option<Decimal>,
    /// Income-weighted average of `day_rate_purchase_and_reinvest` so far
    pub avg_day_rate_purchase_and_reinvest: Option<Decimal>,
    pub day_rate_purchase: Option<Decimal>,
}

impl MiningDayEntry {
    /// The calendar year of this entry
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Adds `x` to an optional running sum, starting it if necessary
fn add_opt(sum: &mut Option<Decimal>, x: &Decimal) {
    *sum = Some(sum.take().unwrap_or_default() + x);
}

/// Builds the daily mining series for one account
///
/// The series runs from the day of the first purchase contract to the end of
/// the last contract of any kind. Without any purchase contract it is empty.
pub fn generate(account: &str, txs: &[Transaction]) -> Result<Vec<MiningDayEntry>, Error> {
    let mut contracts = vec![];
    let mut incomes = BTreeMap::<NaiveDate, DayIncome>::new();
    let mut first_purchase: Option<NaiveDate> = None;
    let mut last_end: Option<NaiveDate> = None;

    for tx in transaction::chronological(txs) {
        if let Some(contract) = MiningContract::from_transaction(tx)? {
            if contract.ty == ContractType::Purchase && first_purchase.is_none() {
                first_purchase = Some(contract.acquired);
            }
            last_end = Some(last_end.map_or(contract.end, |end| end.max(contract.end)));
            debug!(
                "[{}] {} contract {} to {}: ${} (${}/day)",
                account,
                contract.ty,
                contract.start,
                contract.end,
                contract.total_usd,
                contract.per_day_usd,
            );
            contracts.push(contract);
        } else if tx.ty() == TransactionType::MiningIncome {
            let usd = tx.usd_value().ok_or(Error::MissingPricingData {
                time: tx.time(),
                ty: tx.ty(),
            })?;
            let day = incomes.entry(tx.time().date()).or_default();
            day.usd += usd;
            day.coin += tx.coin_amount().unwrap_or_default();
            if let Some(hashrate) = tx.hashrate() {
                day.hashrate = Some(day.hashrate.unwrap_or_default() + hashrate);
            }
        }
    }

    let (start, end) = match (first_purchase, last_end) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            if !contracts.is_empty() || !incomes.is_empty() {
                info!(
                    "[{}] no mining purchase contracts; skipping mining series",
                    account
                );
            }
            return Ok(vec![]);
        }
    };

    let mut ret = vec![];
    let mut cum_basis_purchase = None;
    let mut cum_income = None;
    let mut weighted_rate_sum = Decimal::zero();
    let mut weight_sum = Decimal::zero();
    for date in start.iter_days().take_while(|d| *d <= end) {
        let mut entry = MiningDayEntry {
            date,
            purchase: None,
            reinvestment: None,
            basis_purchase: None,
            cum_basis_purchase: None,
            basis_purchase_and_reinvest: None,
            income: None,
            cum_income: None,
            hashrate: None,
            usd_per_coin: None,
            coin_yield: None,
            day_rate_purchase_and_reinvest: None,
            avg_day_rate_purchase_and_reinvest: None,
            day_rate_purchase: None,
        };

        for contract in &contracts {
            if contract.acquired == date {
                match contract.ty {
                    ContractType::Purchase => add_opt(&mut entry.purchase, &contract.total_usd),
                    ContractType::Reinvestment => {
                        add_opt(&mut entry.reinvestment, &contract.total_usd)
                    }
                }
            }
            if contract.is_active(date) {
                add_opt(&mut entry.basis_purchase_and_reinvest, &contract.per_day_usd);
                if contract.ty == ContractType::Purchase {
                    add_opt(&mut entry.basis_purchase, &contract.per_day_usd);
                }
            }
        }
        if let Some(basis) = &entry.basis_purchase {
            add_opt(&mut cum_basis_purchase, basis);
        }
        entry.cum_basis_purchase = cum_basis_purchase.clone();

        if let Some(day) = incomes.get(&date) {
            entry.income = Some(day.usd.clone());
            add_opt(&mut cum_income, &day.usd);
            entry.hashrate = day.hashrate;
            entry.usd_per_coin = div(&day.usd, &day.coin);
            entry.coin_yield = day
                .hashrate
                .and_then(|h| div(&(&day.coin * Decimal::from(GH_PER_EH)), &h.to_decimal()));

            if let Some(basis) = &entry.basis_purchase_and_reinvest {
                if let Some(ratio) = div(&day.usd, basis) {
                    let rate = ratio - Decimal::one();
                    weighted_rate_sum += &rate * &day.usd;
                    weight_sum += &day.usd;
                    entry.day_rate_purchase_and_reinvest = Some(rate);
                    entry.avg_day_rate_purchase_and_reinvest =
                        div(&weighted_rate_sum, &weight_sum);
                }
            }
            entry.day_rate_purchase = entry
                .basis_purchase
                .as_ref()
                .and_then(|basis| div(&day.usd, basis))
                .map(|ratio| ratio - Decimal::one());
        }
        entry.cum_income = cum_income.clone();

        ret.push(entry);
    }
    Ok(ret)
}
