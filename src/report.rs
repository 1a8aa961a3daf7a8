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

//! Reports
//!
//! Writes the engine's output as a set of CSV files next to the input file:
//! realized and unrealized gains per account (`cb`), unrealized cost basis
//! (`ucb`), yearly income (`inc`) and daily mining economics per account
//! (`min`).
//!

use crate::config::Configuration;
use crate::csv::CsvPrinter;
use crate::file::create_text_file;
use crate::tax::{GainEntry, IncomeYearEntry, MiningDayEntry, Report, UnrealizedCostBasis};
use crate::units::{Decimal, UtcTime};
use log::info;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const GAINS_HEADER: [&str; 10] = [
    "Tax Year",
    "Term",
    "Date Acquired",
    "Date Disposed",
    "Broker Acquired",
    "Broker Disposed",
    "Coin Amount",
    "Proceeds",
    "Cost Basis",
    "Gain",
];

const MINING_HEADER: [&str; 15] = [
    "Year",
    "Date",
    "Purchase (P)",
    "Reinvestment (R)",
    "Day Basis (P)",
    "Cum Basis (P)",
    "Day Basis (P&R)",
    "Day Income",
    "Cum Income",
    "Hashrate (GH/s)",
    "USD/Coin",
    "Yield (Coin/EH/s)",
    "Day Rate (P&R)",
    "Avg Rate (P&R)",
    "Day Rate (P)",
];

const COL_ORD_INCOME: &str = "Ord Income";
const COL_SHORT_TERM_GAINS: &str = "Short-Term Cap Gains";
const COL_LONG_TERM_GAINS: &str = "Long-Term Cap Gains";
const COL_MINING_INCOME: &str = "Mining Income";
const COL_MINING_EXPENSE: &str = "Mining Expense";
const COL_MINING_AMORTIZED: &str = "Mining Amortized Expense";

const COL_UCB_SHORT_TERM: &str = "Short-Term Cost Basis";
const COL_UCB_LONG_TERM: &str = "Long-Term Cost Basis";
const COL_UCB_AVERAGE: &str = "Average Cost Basis";

/// Column header for an account-specific column in the income file
fn label(account: &str, column: &str) -> String {
    if account.is_empty() {
        column.to_owned()
    } else {
        format!("[{account}] {column}")
    }
}

/// Names output files after the input file and the time of the run
pub struct OutputFiles {
    dir: PathBuf,
    base: String,
    stamp: String,
}

impl OutputFiles {
    /// Output files for the given input, in `output_dir` if given and next to
    /// the input otherwise
    pub fn new(input: &Path, output_dir: Option<&Path>, now: UtcTime) -> Self {
        let dir = match output_dir {
            Some(dir) => dir.to_owned(),
            None => input
                .parent()
                .map(Path::to_owned)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        OutputFiles {
            dir,
            base: input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            stamp: now.format("%Y%m%d%H%M%S").to_string(),
        }
    }

    /// The path for a given kind of file, for an account ("" for none)
    pub fn path(&self, kind: &str, account: &str) -> PathBuf {
        let name = if account.is_empty() {
            format!("{}_{}_{}.csv", self.base, kind, self.stamp)
        } else {
            format!("{}_{}_{}_{}.csv", self.base, kind, account, self.stamp)
        };
        self.dir.join(name)
    }
}

/// CSV lines for one account's gains
pub fn gains_lines(entries: &[GainEntry]) -> Vec<String> {
    let mut ret = vec![CsvPrinter(&GAINS_HEADER[..]).to_string()];
    ret.extend(entries.iter().map(|entry| {
        CsvPrinter((
            entry.tax_year(),
            entry.term(),
            entry.acquired,
            entry.disposed(),
            entry.broker_acquired.as_deref(),
            entry.broker_disposed(),
            &entry.amount,
            entry.proceeds(),
            &entry.cost_basis,
            entry.gain(),
        ))
        .to_string()
    }));
    ret
}

/// CSV lines for the unrealized cost basis summary, skipping stablecoins
///
/// Every account's columns are prefixed with `[account] `, even the default
/// account's. Returns `None` if there are no accounts left to write.
pub fn unrealized_lines(
    ucb: &UnrealizedCostBasis,
    config: &Configuration,
) -> Option<Vec<String>> {
    let mut header = vec![];
    let mut row = vec![];
    for (account, cb) in ucb.iter().filter(|(acct, _)| !config.is_stablecoin(acct)) {
        for column in [COL_UCB_SHORT_TERM, COL_UCB_LONG_TERM, COL_UCB_AVERAGE] {
            header.push(format!("[{account}] {column}"));
        }
        row.extend([&cb.short_term, &cb.long_term, &cb.average]);
    }
    if header.is_empty() {
        return None;
    }
    Some(vec![
        CsvPrinter(&header).to_string(),
        CsvPrinter(&row).to_string(),
    ])
}

/// Which column groups the income file has for each account
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
struct IncomeColumns {
    ordinary: bool,
    gains: bool,
    mining: bool,
}

/// CSV lines for the yearly income summary
///
/// Accounts only get the columns they have data for.
pub fn income_lines(entries: &[IncomeYearEntry]) -> Vec<String> {
    let accounts: BTreeSet<&str> = entries
        .iter()
        .flat_map(|e| {
            e.ordinary_income
                .keys()
                .chain(e.short_term_gain.keys())
                .chain(e.long_term_gain.keys())
                .chain(e.mining_income.keys())
                .chain(e.mining_expense.keys())
                .chain(e.mining_amortized_expense.keys())
        })
        .map(String::as_str)
        .collect();
    let columns: Vec<(&str, IncomeColumns)> = accounts
        .into_iter()
        .map(|acct| {
            let mut cols = IncomeColumns::default();
            for e in entries {
                cols.ordinary |= e.ordinary_income.contains_key(acct);
                cols.gains |= e.short_term_gain.contains_key(acct)
                    || e.long_term_gain.contains_key(acct);
                cols.mining |= e.mining_income.contains_key(acct)
                    || e.mining_expense.contains_key(acct)
                    || e.mining_amortized_expense.contains_key(acct);
            }
            (acct, cols)
        })
        .collect();

    let mut header = vec!["Tax Year".to_owned()];
    for &(acct, cols) in &columns {
        if cols.ordinary {
            header.push(label(acct, COL_ORD_INCOME));
        }
        if cols.gains {
            header.push(label(acct, COL_SHORT_TERM_GAINS));
            header.push(label(acct, COL_LONG_TERM_GAINS));
        }
        if cols.mining {
            header.push(label(acct, COL_MINING_INCOME));
            header.push(label(acct, COL_MINING_EXPENSE));
            header.push(label(acct, COL_MINING_AMORTIZED));
        }
    }

    let mut ret = vec![CsvPrinter(&header).to_string()];
    for e in entries {
        let mut row: Vec<Option<&Decimal>> = vec![];
        for &(acct, cols) in &columns {
            if cols.ordinary {
                row.push(e.ordinary_income.get(acct));
            }
            if cols.gains {
                row.push(e.short_term_gain.get(acct));
                row.push(e.long_term_gain.get(acct));
            }
            if cols.mining {
                row.push(e.mining_income.get(acct));
                row.push(e.mining_expense.get(acct));
                row.push(e.mining_amortized_expense.get(acct));
            }
        }
        if row.is_empty() {
            ret.push(e.year.to_string());
        } else {
            ret.push(format!("{},{}", e.year, CsvPrinter(&row)));
        }
    }
    ret
}

/// CSV lines for one account's daily mining series
pub fn mining_lines(entries: &[MiningDayEntry]) -> Vec<String> {
    let mut ret = vec![CsvPrinter(&MINING_HEADER[..]).to_string()];
    ret.extend(entries.iter().map(|e| {
        CsvPrinter((
            e.year(),
            e.date,
            &e.purchase,
            &e.reinvestment,
            &e.basis_purchase,
            &e.cum_basis_purchase,
            &e.basis_purchase_and_reinvest,
            &e.income,
            &e.cum_income,
            e.hashrate,
            &e.usd_per_coin,
            &e.coin_yield,
            &e.day_rate_purchase_and_reinvest,
            &e.avg_day_rate_purchase_and_reinvest,
            &e.day_rate_purchase,
        ))
        .to_string()
    }));
    ret
}

/// Writes a set of lines to a new file
fn write_lines(path: PathBuf, reason: &str, lines: &[String]) -> anyhow::Result<PathBuf> {
    let mut file = create_text_file(path, reason)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    file.finish()
}

/// Writes every output file for a report, returning the paths written
pub fn write_report(
    report: &Report,
    files: &OutputFiles,
    config: &Configuration,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = vec![];

    for (account, entries) in &report.gains {
        if entries.is_empty() {
            continue;
        }
        if config.is_stablecoin(account) {
            info!(
                "Skipping gains for account {} since it is a USD stablecoin",
                account
            );
            continue;
        }
        let path = write_lines(
            files.path("cb", account),
            "for gains",
            &gains_lines(entries),
        )?;
        info!("Wrote {} gain entries to {}", entries.len(), path.display());
        written.push(path);
    }

    match unrealized_lines(&report.unrealized, config) {
        Some(lines) => {
            let path = write_lines(files.path("ucb", ""), "for unrealized cost basis", &lines)?;
            info!("Wrote unrealized cost basis to {}", path.display());
            written.push(path);
        }
        None => info!("No unrealized cost basis to write"),
    }

    let path = write_lines(
        files.path("inc", ""),
        "for income",
        &income_lines(&report.income),
    )?;
    info!(
        "Wrote {} income entries to {}",
        report.income.len(),
        path.display()
    );
    written.push(path);

    for (account, entries) in report.mining.iter().filter(|(_, e)| !e.is_empty()) {
        let path = write_lines(
            files.path("min", account),
            "for mining",
            &mining_lines(entries),
        )?;
        info!("Wrote {} mining entries to {}", entries.len(), path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal;
    use crate::tax::{self, CostBasisMethod, GainKind};
    use crate::transaction::test_util::*;
    use crate::transaction::{Transaction, TransactionType};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn file_names() {
        let files = OutputFiles::new(
            Path::new("/data/ledger.csv"),
            None,
            UtcTime::parse_ledger("2024-3-5 14:07").unwrap(),
        );
        assert_eq!(
            files.path("cb", "BTC"),
            PathBuf::from("/data/ledger_cb_BTC_20240305140700.csv")
        );
        assert_eq!(
            files.path("inc", ""),
            PathBuf::from("/data/ledger_inc_20240305140700.csv")
        );

        let files = OutputFiles::new(
            Path::new("ledger.csv"),
            Some(Path::new("/out")),
            UtcTime::parse_ledger("2024-3-5 14:07").unwrap(),
        );
        assert_eq!(
            files.path("min", ""),
            PathBuf::from("/out/ledger_min_20240305140700.csv")
        );
    }

    #[test]
    fn gains_file() {
        let entries = vec![
            GainEntry {
                acquired: date(2020, 1, 1),
                broker_acquired: Some("Coinbase".into()),
                amount: decimal!(1),
                cost_basis: decimal!(100),
                kind: GainKind::Realized {
                    disposed: date(2021, 2, 1),
                    broker_disposed: Some("Kraken".into()),
                    proceeds: decimal!(300),
                },
            },
            GainEntry {
                acquired: date(2021, 1, 1),
                broker_acquired: None,
                amount: decimal!(0.5),
                cost_basis: decimal!(50.00),
                kind: GainKind::Unrealized {
                    as_of: date(2021, 6, 1),
                },
            },
        ];
        let lines = gains_lines(&entries);
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Tax Year,Term,Date Acquired,Date Disposed,Broker Acquired,Broker Disposed,Coin Amount,Proceeds,Cost Basis,Gain"
        );
        assert_eq!(
            lines[1],
            "2021,Long-Term,2020-01-01,2021-02-01,Coinbase,Kraken,1,300,100,200"
        );
        assert_eq!(lines[2], ",Short-Term,2021-01-01,,,,0.5,,50,");
    }

    #[test]
    fn unrealized_file() {
        let mut accounts = BTreeMap::<String, Vec<Transaction>>::new();
        for tx in [
            trade("BTC", "2021-1-1", TransactionType::Acquire, "2", "100"),
            trade("USDC", "2021-1-1", TransactionType::Acquire, "100", "100"),
            trade("ETH", "2021-1-1", TransactionType::Acquire, "1", "10"),
            trade("ETH", "2021-2-1", TransactionType::Dispose, "1", "20"),
        ] {
            accounts.entry(tx.account().to_owned()).or_default().push(tx);
        }
        let report = tax::run(&accounts, CostBasisMethod::Fifo, date(2021, 6, 1)).unwrap();
        let lines = unrealized_lines(&report.unrealized, &Configuration::default()).unwrap();
        assert_eq!(
            lines,
            vec![
                "[BTC] Short-Term Cost Basis,[BTC] Long-Term Cost Basis,[BTC] Average Cost Basis,\
                 [ETH] Short-Term Cost Basis,[ETH] Long-Term Cost Basis,[ETH] Average Cost Basis"
                    .to_owned(),
                "100,,50,,,".to_owned(),
            ]
        );
    }

    #[test]
    fn unrealized_default_account() {
        let mut accounts = BTreeMap::<String, Vec<Transaction>>::new();
        accounts.insert(
            "".to_owned(),
            vec![trade("", "2021-1-1", TransactionType::Acquire, "4", "100")],
        );
        let report = tax::run(&accounts, CostBasisMethod::Fifo, date(2021, 6, 1)).unwrap();
        let lines = unrealized_lines(&report.unrealized, &Configuration::default()).unwrap();
        assert_eq!(
            lines,
            vec![
                "[] Short-Term Cost Basis,[] Long-Term Cost Basis,[] Average Cost Basis"
                    .to_owned(),
                "100,,25".to_owned(),
            ]
        );
    }

    #[test]
    fn income_columns() {
        let mut first = IncomeYearEntry {
            year: 2020,
            ..Default::default()
        };
        first.ordinary_income.insert("".into(), decimal!(100));
        first.short_term_gain.insert("BTC".into(), decimal!(-5));
        let mut second = IncomeYearEntry {
            year: 2021,
            ..Default::default()
        };
        second.mining_expense.insert("".into(), decimal!(1200));
        second
            .mining_amortized_expense
            .insert("".into(), decimal!(604.5));
        let third = IncomeYearEntry {
            year: 2022,
            ..Default::default()
        };

        let lines = income_lines(&[first, second, third]);
        assert_eq!(
            lines,
            vec![
                "Tax Year,Ord Income,Mining Income,Mining Expense,Mining Amortized Expense,\
                 [BTC] Short-Term Cap Gains,[BTC] Long-Term Cap Gains"
                    .to_owned(),
                "2020,100,,,,-5,".to_owned(),
                "2021,,,1200,604.5,,".to_owned(),
                "2022,,,,,,".to_owned(),
            ]
        );
        assert_eq!(income_lines(&[]), vec!["Tax Year".to_owned()]);
    }

    #[test]
    fn mining_file() {
        let txs = vec![
            contract("", "2021-4-1", TransactionType::MiningPurchase, "300", 1),
            trade("", "2021-4-2", TransactionType::MiningIncome, "0.0003", "12"),
        ];
        let series = tax::mining::generate("", &txs).unwrap();
        let lines = mining_lines(&series);
        assert_eq!(lines.len(), 32);
        assert_eq!(lines[0], MINING_HEADER.join(","));
        assert_eq!(lines[1], "2021,2021-04-01,300,,,,,,,,,,,,");
        assert_eq!(lines[2], "2021,2021-04-02,,,10,10,10,12,12,,40000,,0.2,0.2,0.2");
    }
}
