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

//! Ledger Reader
//!
//! Reads the transaction ledger CSV file and groups its records by account.
//! Records which are empty (no recognized transaction type) are skipped
//! quietly; records which are malformed, have the wrong number of fields or
//! are not valid UTF-8 are skipped loudly. Neither stops the read.
//!

use super::{Error, Fields, Transaction, TransactionType};
use crate::units::{Decimal, Hashrate, UtcTime};
use anyhow::Context;
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::io;
use std::str::FromStr;

pub const COL_ACCOUNT: &str = "Acct";
pub const COL_TIME: &str = "UTC Dttm";
pub const COL_TYPE: &str = "Txn Type";
pub const COL_SOURCE: &str = "Src";
pub const COL_DESTINATION: &str = "Dest";
pub const COL_COIN_AMOUNT: &str = "Txn COIN";
pub const COL_USD_AMOUNT: &str = "Txn USD";
pub const COL_USD_PER_UNIT: &str = "Txn USD/COIN";
pub const COL_COIN_FEE: &str = "Txn Fee COIN";
pub const COL_BROKER_FEE: &str = "Brkr Fee USD";
pub const COL_TERM_MONTHS: &str = "Term Months";
pub const COL_HASHRATE: &str = "Hash Rate (GH/s)";

/// All transactions from a ledger file, grouped by account
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Ledger {
    accounts: BTreeMap<String, Vec<Transaction>>,
    skipped_invalid: Vec<u64>,
    skipped_empty: Vec<u64>,
}

impl Ledger {
    /// Construct a new empty ledger
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a transaction to its account's list
    pub fn push(&mut self, tx: Transaction) {
        self.accounts
            .entry(tx.account().to_owned())
            .or_default()
            .push(tx);
    }

    /// Per-account transaction lists, in file order
    pub fn accounts(&self) -> &BTreeMap<String, Vec<Transaction>> {
        &self.accounts
    }

    /// Total number of transactions across all accounts
    pub fn len(&self) -> usize {
        self.accounts.values().map(Vec::len).sum()
    }

    /// Record numbers of malformed records that were skipped
    pub fn skipped_invalid(&self) -> &[u64] {
        &self.skipped_invalid
    }

    /// Record numbers of empty records that were skipped
    pub fn skipped_empty(&self) -> &[u64] {
        &self.skipped_empty
    }
}

/// Column positions, looked up by header name
struct Columns {
    account: Option<usize>,
    time: usize,
    ty: usize,
    source: Option<usize>,
    destination: Option<usize>,
    coin_amount: Option<usize>,
    usd_amount: Option<usize>,
    usd_per_unit: Option<usize>,
    coin_fee: Option<usize>,
    broker_fee: Option<usize>,
    term_months: Option<usize>,
    hashrate: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> anyhow::Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Ok(Columns {
            account: find(COL_ACCOUNT),
            time: find(COL_TIME)
                .with_context(|| format!("ledger has no \"{COL_TIME}\" column"))?,
            ty: find(COL_TYPE).with_context(|| format!("ledger has no \"{COL_TYPE}\" column"))?,
            source: find(COL_SOURCE),
            destination: find(COL_DESTINATION),
            coin_amount: find(COL_COIN_AMOUNT),
            usd_amount: find(COL_USD_AMOUNT),
            usd_per_unit: find(COL_USD_PER_UNIT),
            coin_fee: find(COL_COIN_FEE),
            broker_fee: find(COL_BROKER_FEE),
            term_months: find(COL_TERM_MONTHS),
            hashrate: find(COL_HASHRATE),
        })
    }
}

/// Returns the trimmed cell at the given column, treating blank cells as absent
fn cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn decimal_cell(
    record: &csv::StringRecord,
    idx: Option<usize>,
    column: &'static str,
) -> Result<Option<Decimal>, Error> {
    match cell(record, idx) {
        None => Ok(None),
        Some(s) => Decimal::from_str(s)
            .map(Some)
            .map_err(|error| Error::Number {
                column,
                value: s.to_owned(),
                error,
            }),
    }
}

/// Checks the shape and encoding of a raw CSV record
fn string_record(record: csv::ByteRecord, expected: usize) -> Result<csv::StringRecord, Error> {
    if record.len() != expected {
        return Err(Error::FieldCount {
            expected,
            found: record.len(),
        });
    }
    csv::StringRecord::from_byte_record(record).map_err(Error::Encoding)
}

/// Parses a single CSV record into a transaction
fn parse_record(record: &csv::StringRecord, cols: &Columns) -> Result<Transaction, Error> {
    let ty = TransactionType::from_str(cell(record, Some(cols.ty)).unwrap_or(""))?;
    let time = UtcTime::parse_ledger(cell(record, Some(cols.time)).unwrap_or(""))
        .map_err(Error::Timestamp)?;

    let mut fields = Fields::new(cell(record, cols.account).unwrap_or(""), time, ty);
    // Labels keep empty strings, unlike the numeric columns
    fields.source = cols
        .source
        .and_then(|i| record.get(i))
        .map(|s| s.trim().to_owned());
    fields.destination = cols
        .destination
        .and_then(|i| record.get(i))
        .map(|s| s.trim().to_owned());
    fields.coin_amount = decimal_cell(record, cols.coin_amount, COL_COIN_AMOUNT)?;
    fields.usd_amount = decimal_cell(record, cols.usd_amount, COL_USD_AMOUNT)?;
    fields.usd_per_unit = decimal_cell(record, cols.usd_per_unit, COL_USD_PER_UNIT)?;
    fields.coin_fee = decimal_cell(record, cols.coin_fee, COL_COIN_FEE)?;
    fields.broker_fee_usd = decimal_cell(record, cols.broker_fee, COL_BROKER_FEE)?;
    // Unparsable terms and hash rates count as missing; the type rules decide
    // whether that is a problem.
    fields.term_months = cell(record, cols.term_months).and_then(|s| s.parse().ok());
    fields.hashrate = cell(record, cols.hashrate).and_then(|s| Hashrate::from_str(s).ok());

    Transaction::from_fields(fields)
}

/// Reads a ledger CSV file, with a header row, from a reader
pub fn read_ledger<R: io::Read>(input: R) -> anyhow::Result<Ledger> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    let headers = reader.headers().context("reading ledger header")?.clone();
    let cols = Columns::from_headers(&headers)?;

    let mut ret = Ledger::new();
    for (n, record) in reader.byte_records().enumerate() {
        let record_num = n as u64 + 1;
        let record = record.with_context(|| format!("reading ledger record #{record_num}"))?;
        match string_record(record, headers.len()).and_then(|rec| parse_record(&rec, &cols)) {
            Ok(tx) => {
                debug!("record #{}: {}", record_num, tx);
                ret.push(tx);
            }
            Err(e) if e.is_empty_record() => {
                debug!("record #{}: skipping ({})", record_num, e);
                ret.skipped_empty.push(record_num);
            }
            Err(e) => {
                error!("Skipping invalid ledger record #{}: {}", record_num, e);
                ret.skipped_invalid.push(record_num);
            }
        }
    }

    if !ret.skipped_invalid.is_empty() {
        error!(
            "Skipped {} ledger record(s) with invalid data: #{}",
            ret.skipped_invalid.len(),
            join_nums(&ret.skipped_invalid),
        );
    }
    if !ret.skipped_empty.is_empty() {
        info!(
            "Skipped {} ledger record(s) with no transaction type: #{}",
            ret.skipped_empty.len(),
            join_nums(&ret.skipped_empty),
        );
    }
    Ok(ret)
}

fn join_nums(nums: &[u64]) -> String {
    nums.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(" #")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal;

    const LEDGER: &str = "\
Acct,UTC Dttm,Txn Type,Src,Dest,Txn COIN,Txn USD,Txn USD/COIN,Txn Fee COIN,Brkr Fee USD,Term Months,Hash Rate (GH/s)
BTC,2021-01-01 10:00,acq,,Coinbase,1.5,45000,,,10,,
BTC,1/2/2021 9:30,disp,Coinbase,,0.5,,31000,,,,
,2021-1-3 0:00,mpur,,,,1200,,,,12,5000
ETH,2021-01-04 00:00,,,,,,,,,,
ETH,2021-01-05 00:00,acq,,,2,,,,,,
ETH,not a date,acq,,,2,100,,,,,
BTC,2021-01-06 00:00,inc,,,abc,100,,,,,
BTC,2021-01-07 00:00,mre,,,,300,,,,three,5000
";

    #[test]
    fn read_sample() {
        let ledger = read_ledger(LEDGER.as_bytes()).unwrap();
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.skipped_empty(), &[4]);
        assert_eq!(ledger.skipped_invalid(), &[5, 6, 7, 8]);

        let btc = &ledger.accounts()["BTC"];
        assert_eq!(btc.len(), 2);
        assert_eq!(btc[0].ty(), TransactionType::Acquire);
        assert_eq!(btc[0].coin_amount(), Some(decimal!(1.5)));
        assert_eq!(btc[0].broker_fee_usd(), Some(decimal!(10)));
        assert_eq!(btc[0].destination(), Some("Coinbase"));
        assert_eq!(btc[1].ty(), TransactionType::Dispose);
        assert_eq!(btc[1].usd_value(), Some(decimal!(15500)));
        assert_eq!(btc[1].time().date(), chrono::NaiveDate::from_ymd_opt(2021, 1, 2).unwrap());

        let default = &ledger.accounts()[""];
        assert_eq!(default.len(), 1);
        assert_eq!(default[0].term_months(), Some(12));
        assert_eq!(default[0].hashrate(), Some(Hashrate::from_gh_per_sec(5000)));
        assert!(!ledger.accounts().contains_key("ETH"));
    }

    #[test]
    fn optional_columns() {
        let ledger = read_ledger(
            "UTC Dttm,Txn Type,Txn COIN,Txn USD\n2020-6-1 12:00,inc,0.1,900\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(ledger.len(), 1);
        let tx = &ledger.accounts()[""][0];
        assert_eq!(tx.account(), "");
        assert_eq!(tx.source(), None);
        assert_eq!(tx.ty(), TransactionType::Income);
    }

    #[test]
    fn invalid_utf8_record() {
        let mut input = b"Acct,UTC Dttm,Txn Type,Txn COIN,Txn USD\n".to_vec();
        input.extend_from_slice(b"BTC,2021-01-01 0:00,acq,1,100\n");
        input.extend_from_slice(b"BTC \xff,2021-01-02 0:00,acq,1,100\n");
        input.extend_from_slice(b"BTC,2021-01-03 0:00,disp,1,150\n");

        let ledger = read_ledger(&input[..]).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.skipped_invalid(), &[2]);
        assert!(ledger.skipped_empty().is_empty());
        let btc = &ledger.accounts()["BTC"];
        assert_eq!(btc[1].ty(), TransactionType::Dispose);
    }

    #[test]
    fn wrong_field_count() {
        let ledger = read_ledger(
            "\
UTC Dttm,Txn Type,Txn COIN,Txn USD
2021-01-01 0:00,acq,1,100
2021-01-02 0:00,acq,1,100,extra
2021-01-03 0:00,acq,1
,,,
2021-01-04 0:00,disp,1,150
"
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.skipped_invalid(), &[2, 3]);
        assert_eq!(ledger.skipped_empty(), &[4]);
    }

    #[test]
    fn missing_mandatory_column() {
        assert!(read_ledger("Acct,Txn Type\nBTC,acq\n".as_bytes()).is_err());
    }
}
