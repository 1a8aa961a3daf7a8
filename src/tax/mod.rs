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

//! Tax Engine
//!
//! Turns per-account transaction lists into realized and unrealized gains,
//! per-year income and expense totals, and daily mining economics.
//!
//! A run is all-or-nothing: any error aborts the whole run and no partial
//! report is produced.
//!

pub mod amortize;
pub mod income;
pub mod lot;
pub mod mining;
pub mod unrealized;

use crate::transaction::{Transaction, TransactionType};
use crate::units::{Decimal, UtcTime};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str};

pub use income::{allocate, IncomeYearEntry, YearAllocationState};
pub use lot::{compute_gains, GainEntry, GainKind, LotLedger, Term};
pub use mining::{ContractType, MiningContract, MiningDayEntry};
pub use unrealized::{AccountCostBasis, UnrealizedCostBasis};

/// An amount per account
pub type AccountMap = BTreeMap<String, Decimal>;
/// An amount per account, per year
pub type YearMap = BTreeMap<i32, AccountMap>;

/// Fatal engine error
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// There were no transactions to process
    EmptyInput,
    /// A cost basis method other than FIFO was requested
    UnsupportedCostBasisMethod(CostBasisMethod),
    /// A disposal needed more coins than the account's open lots hold
    InsufficientLots {
        account: String,
        time: UtcTime,
        remaining: Decimal,
    },
    /// A transaction was dated before the year currently being allocated
    OrderingViolation { time: UtcTime, year: i32 },
    /// A transaction had no way to compute its USD value
    MissingPricingData { time: UtcTime, ty: TransactionType },
    /// A mining contract's term could not be placed on the calendar
    ContractTerm { time: UtcTime, term_months: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::EmptyInput => f.write_str("no transactions to process"),
            Error::UnsupportedCostBasisMethod(method) => write!(
                f,
                "unsupported cost basis method {method}; only fifo is supported"
            ),
            Error::InsufficientLots {
                ref account,
                time,
                ref remaining,
            } => write!(
                f,
                "account \"{account}\" disposed of {remaining} more coin than it acquired at {time}"
            ),
            Error::OrderingViolation { time, year } => write!(
                f,
                "transaction at {time} is out of order (already allocating {year})"
            ),
            Error::MissingPricingData { time, ty } => {
                write!(f, "{ty} transaction at {time} has no USD amount or USD/unit")
            }
            Error::ContractTerm { time, term_months } => write!(
                f,
                "mining contract at {time} has an unusable term of {term_months} months"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// How disposals are matched against open lots
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CostBasisMethod {
    /// First in, first out
    #[default]
    Fifo,
    /// Last in, first out
    Lifo,
    /// Highest cost first
    Hifo,
    /// Average cost
    #[serde(rename = "average")]
    AverageCost,
}

impl fmt::Display for CostBasisMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CostBasisMethod::Fifo => f.write_str("fifo"),
            CostBasisMethod::Lifo => f.write_str("lifo"),
            CostBasisMethod::Hifo => f.write_str("hifo"),
            CostBasisMethod::AverageCost => f.write_str("average"),
        }
    }
}

impl str::FromStr for CostBasisMethod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.trim().to_lowercase() {
            "fifo" => Ok(CostBasisMethod::Fifo),
            "lifo" => Ok(CostBasisMethod::Lifo),
            "hifo" => Ok(CostBasisMethod::Hifo),
            "average" => Ok(CostBasisMethod::AverageCost),
            other => Err(format!("unknown cost basis method \"{other}\"")),
        }
    }
}

/// Everything computed by a single engine run
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Report {
    /// Per account: realized gains in match order, then unrealized gains
    pub gains: BTreeMap<String, Vec<GainEntry>>,
    /// Unrealized cost basis summary across all accounts
    pub unrealized: UnrealizedCostBasis,
    /// One entry per calendar year, with no gaps
    pub income: Vec<IncomeYearEntry>,
    /// Per account: daily mining economics
    pub mining: BTreeMap<String, Vec<MiningDayEntry>>,
}

/// Runs the whole engine over a set of per-account transaction lists
///
/// `now` is the reference date used to age lots which are still open.
pub fn run(
    accounts: &BTreeMap<String, Vec<Transaction>>,
    method: CostBasisMethod,
    now: NaiveDate,
) -> Result<Report, Error> {
    if method != CostBasisMethod::Fifo {
        return Err(Error::UnsupportedCostBasisMethod(method));
    }
    if accounts.values().all(Vec::is_empty) {
        return Err(Error::EmptyInput);
    }

    let mut gains = BTreeMap::new();
    for (account, txs) in accounts.iter().filter(|(_, txs)| !txs.is_empty()) {
        gains.insert(account.clone(), compute_gains(account, txs, now)?);
    }
    info!(
        "Computed {} gain entries across {} accounts",
        gains.values().map(Vec::len).sum::<usize>(),
        gains.len(),
    );

    let unrealized = UnrealizedCostBasis::from_gains(&gains);
    let income = allocate(accounts, &gains)?;
    info!("Computed {} income years", income.len());

    let mut mining = BTreeMap::new();
    for (account, txs) in accounts.iter().filter(|(_, txs)| !txs.is_empty()) {
        mining.insert(account.clone(), mining::generate(account, txs)?);
    }
    info!(
        "Computed {} mining days",
        mining.values().map(Vec::len).sum::<usize>()
    );

    Ok(Report {
        gains,
        unrealized,
        income,
        mining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal;
    use crate::transaction::test_util::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn ledger(txs: Vec<Transaction>) -> BTreeMap<String, Vec<Transaction>> {
        let mut ret = BTreeMap::<String, Vec<Transaction>>::new();
        for tx in txs {
            ret.entry(tx.account().to_owned()).or_default().push(tx);
        }
        ret
    }

    #[test]
    fn method_parsing() {
        assert_eq!("FIFO".parse::<CostBasisMethod>(), Ok(CostBasisMethod::Fifo));
        assert_eq!(
            "average".parse::<CostBasisMethod>(),
            Ok(CostBasisMethod::AverageCost)
        );
        assert!("lilo".parse::<CostBasisMethod>().is_err());
        let method: CostBasisMethod = serde_json::from_str("\"hifo\"").unwrap();
        assert_eq!(method, CostBasisMethod::Hifo);
    }

    #[test]
    fn only_fifo() {
        let accounts = ledger(vec![trade(
            "",
            "2021-1-1",
            TransactionType::Acquire,
            "1",
            "100",
        )]);
        for method in [
            CostBasisMethod::Lifo,
            CostBasisMethod::Hifo,
            CostBasisMethod::AverageCost,
        ] {
            assert_eq!(
                run(&accounts, method, today()),
                Err(Error::UnsupportedCostBasisMethod(method))
            );
        }
        assert!(run(&accounts, CostBasisMethod::Fifo, today()).is_ok());
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            run(&BTreeMap::new(), CostBasisMethod::Fifo, today()),
            Err(Error::EmptyInput)
        );
        let mut accounts = BTreeMap::new();
        accounts.insert("BTC".to_owned(), vec![]);
        assert_eq!(
            run(&accounts, CostBasisMethod::Fifo, today()),
            Err(Error::EmptyInput)
        );
    }

    #[test]
    fn insufficient_lots_aborts_everything() {
        let accounts = ledger(vec![
            trade("BTC", "2021-1-1", TransactionType::Acquire, "1", "100"),
            trade("BTC", "2021-2-1", TransactionType::Dispose, "0.5", "100"),
            trade("ETH", "2021-1-1", TransactionType::Acquire, "1", "100"),
            trade("ETH", "2021-2-1", TransactionType::Dispose, "2", "100"),
        ]);
        assert!(matches!(
            run(&accounts, CostBasisMethod::Fifo, today()),
            Err(Error::InsufficientLots { ref account, .. }) if account == "ETH"
        ));
    }

    #[test]
    fn full_run() {
        let accounts = ledger(vec![
            trade("BTC", "2021-1-1", TransactionType::Acquire, "1", "100"),
            trade("BTC", "2021-6-1", TransactionType::Dispose, "0.5", "150"),
            trade("", "2021-3-1", TransactionType::Income, "0.1", "40"),
            contract("", "2021-4-1", TransactionType::MiningPurchase, "300", 1),
            trade("", "2021-4-5", TransactionType::MiningIncome, "0.001", "20"),
        ]);
        let report = run(&accounts, CostBasisMethod::Fifo, today()).unwrap();

        assert_eq!(report.gains.len(), 2);
        assert_eq!(report.gains["BTC"].len(), 2);
        assert_eq!(report.gains["BTC"][0].gain(), Some(decimal!(100)));
        // Income and mining income lots, both unrealized
        assert_eq!(report.gains[""].len(), 2);

        assert_eq!(report.income.len(), 1);
        let year = &report.income[0];
        assert_eq!(year.year, 2021);
        assert_eq!(year.ordinary_income[""], decimal!(40));
        assert_eq!(year.short_term_gain["BTC"], decimal!(100));
        assert_eq!(year.mining_income[""], decimal!(20));
        assert_eq!(year.mining_expense[""], decimal!(300));
        assert_eq!(year.mining_amortized_expense[""], decimal!(300));

        assert_eq!(report.mining[""].len(), 31);
        assert!(report.mining["BTC"].is_empty());

        let btc = report.unrealized.account("BTC").unwrap();
        assert_eq!(btc.long_term, Some(decimal!(50)));
        assert_eq!(btc.short_term, None);
        assert_eq!(btc.average, Some(decimal!(100)));
    }
}
