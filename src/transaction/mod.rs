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

//! Ledger Transactions
//!
//! A single validated ledger event. Transactions are immutable once
//! constructed; the only way to get one is through [Transaction::from_fields],
//! which enforces the per-type rules about which fields must be present.
//!

pub mod reader;

use crate::units::{self, Decimal, Hashrate, UtcTime};
use std::{fmt, str};

pub use reader::{read_ledger, Ledger};

/// The kind of ledger event
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum TransactionType {
    /// Coins bought for dollars
    Acquire,
    /// Coins sold for dollars
    Dispose,
    /// Coins moved between our own wallets; only the fee is a disposal
    Transfer,
    /// Coins received as ordinary income
    Income,
    /// Coins received as a mining payout
    MiningIncome,
    /// A cloud-mining contract paid for out of pocket
    MiningPurchase,
    /// A cloud-mining contract paid for out of mining proceeds
    MiningReinvest,
}

impl TransactionType {
    /// The code used for this type in the ledger file
    pub fn code(self) -> &'static str {
        match self {
            TransactionType::Acquire => "acq",
            TransactionType::Dispose => "disp",
            TransactionType::Transfer => "tran",
            TransactionType::Income => "inc",
            TransactionType::MiningIncome => "minc",
            TransactionType::MiningPurchase => "mpur",
            TransactionType::MiningReinvest => "mre",
        }
    }

    /// Whether this transaction opens a new tax lot
    pub fn opens_lot(self) -> bool {
        matches!(
            self,
            TransactionType::Acquire | TransactionType::Income | TransactionType::MiningIncome
        )
    }

    /// Whether this is a mining contract purchase or reinvestment
    pub fn is_mining_contract(self) -> bool {
        matches!(
            self,
            TransactionType::MiningPurchase | TransactionType::MiningReinvest
        )
    }
}

impl str::FromStr for TransactionType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(Error::MissingType),
            "acq" => Ok(TransactionType::Acquire),
            "disp" => Ok(TransactionType::Dispose),
            "tran" => Ok(TransactionType::Transfer),
            "inc" => Ok(TransactionType::Income),
            "minc" => Ok(TransactionType::MiningIncome),
            "mpur" => Ok(TransactionType::MiningPurchase),
            "mre" => Ok(TransactionType::MiningReinvest),
            other => Err(Error::UnknownType(other.to_owned())),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Problem constructing a transaction
#[derive(Debug)]
pub enum Error {
    /// No transaction type was given. The record is treated as empty.
    MissingType,
    /// The transaction type was not one we know. The record is treated as empty.
    UnknownType(String),
    /// The timestamp was missing or could not be parsed
    Timestamp(units::TimeError),
    /// A numeric column could not be parsed
    Number {
        column: &'static str,
        value: String,
        error: units::DecimalError,
    },
    /// The record does not have one field per header column
    FieldCount { expected: usize, found: usize },
    /// The record is not valid UTF-8
    Encoding(csv::FromUtf8Error),
    /// The combination of present fields is not allowed for this type
    MissingFields {
        ty: TransactionType,
        reason: &'static str,
    },
}

impl Error {
    /// Whether this error means "empty record" (skip quietly) rather than
    /// "malformed record" (skip loudly)
    pub fn is_empty_record(&self) -> bool {
        matches!(*self, Error::MissingType | Error::UnknownType(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::MissingType => f.write_str("empty transaction type"),
            Error::UnknownType(ref s) => write!(f, "unknown transaction type \"{s}\""),
            Error::Timestamp(ref e) => e.fmt(f),
            Error::Number {
                column,
                ref value,
                ref error,
            } => write!(f, "unparsable {column} \"{value}\": {error}"),
            Error::FieldCount { expected, found } => {
                write!(f, "record has {found} fields, expected {expected}")
            }
            Error::Encoding(ref e) => write!(f, "record is not valid UTF-8: {e}"),
            Error::MissingFields { ty, reason } => {
                write!(f, "{ty} transaction {reason}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::MissingType
            | Error::UnknownType(_)
            | Error::FieldCount { .. }
            | Error::MissingFields { .. } => None,
            Error::Timestamp(ref e) => Some(e),
            Error::Encoding(ref e) => Some(e),
            Error::Number { ref error, .. } => Some(error),
        }
    }
}

/// Unvalidated transaction data, as read from some source
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Fields {
    pub account: String,
    pub time: UtcTime,
    pub ty: TransactionType,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub coin_amount: Option<Decimal>,
    pub usd_amount: Option<Decimal>,
    pub usd_per_unit: Option<Decimal>,
    pub coin_fee: Option<Decimal>,
    pub broker_fee_usd: Option<Decimal>,
    pub term_months: Option<u32>,
    pub hashrate: Option<Hashrate>,
}

impl Fields {
    /// Constructs a field set with only the mandatory data filled in
    pub fn new(account: &str, time: UtcTime, ty: TransactionType) -> Self {
        Fields {
            account: account.trim().to_owned(),
            time,
            ty,
            source: None,
            destination: None,
            coin_amount: None,
            usd_amount: None,
            usd_per_unit: None,
            coin_fee: None,
            broker_fee_usd: None,
            term_months: None,
            hashrate: None,
        }
    }
}

/// A validated ledger event
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transaction {
    fields: Fields,
}

impl Transaction {
    /// Validates a set of fields against the rules for its transaction type
    pub fn from_fields(fields: Fields) -> Result<Self, Error> {
        let ty = fields.ty;
        let missing = |reason| Err(Error::MissingFields { ty, reason });
        let has_coin = fields.coin_amount.is_some();
        let has_price = fields.usd_amount.is_some() || fields.usd_per_unit.is_some();
        let positive_coin = fields.coin_amount.as_ref().map_or(false, Decimal::is_positive);

        match ty {
            TransactionType::Acquire
            | TransactionType::Income
            | TransactionType::Dispose
            | TransactionType::MiningIncome => {
                if !has_coin || !has_price {
                    return missing("needs a coin amount and either a USD amount or USD/unit");
                }
                if !positive_coin {
                    return missing("needs a positive coin amount");
                }
            }
            TransactionType::Transfer => {
                if !has_coin {
                    return missing("needs a coin amount");
                }
                if fields.coin_fee.is_some() && !has_price {
                    return missing("has a coin fee but neither a USD amount nor USD/unit");
                }
            }
            TransactionType::MiningPurchase | TransactionType::MiningReinvest => {
                if fields.term_months.is_none() || fields.hashrate.is_none() {
                    return missing("needs a term in months and a hash rate");
                }
                if fields.term_months == Some(0) {
                    return missing("needs a term of at least one month");
                }
                if !has_coin && fields.usd_amount.is_none() {
                    return missing("needs a coin amount or a USD amount");
                }
                if has_coin && !has_price {
                    return missing("has a coin amount but neither a USD amount nor USD/unit");
                }
                if fields.coin_fee.is_some()
                    && fields.usd_per_unit.is_none()
                    && !(has_coin && fields.usd_amount.is_some())
                {
                    return missing("has a coin fee but no way to price it");
                }
            }
        }
        Ok(Transaction { fields })
    }

    /// The account label ("" for the default account)
    pub fn account(&self) -> &str {
        &self.fields.account
    }

    /// When the transaction happened
    pub fn time(&self) -> UtcTime {
        self.fields.time
    }

    /// The calendar year the transaction happened in
    pub fn year(&self) -> i32 {
        self.fields.time.year()
    }

    /// The kind of transaction
    pub fn ty(&self) -> TransactionType {
        self.fields.ty
    }

    /// Where the coins came from, if recorded
    pub fn source(&self) -> Option<&str> {
        self.fields.source.as_deref()
    }

    /// Where the coins went to, if recorded
    pub fn destination(&self) -> Option<&str> {
        self.fields.destination.as_deref()
    }

    /// Accessor for the coin amount
    pub fn coin_amount(&self) -> Option<Decimal> {
        self.fields.coin_amount.clone()
    }

    /// Accessor for the USD amount
    pub fn usd_amount(&self) -> Option<Decimal> {
        self.fields.usd_amount.clone()
    }

    /// Accessor for the USD per coin rate
    pub fn usd_per_unit(&self) -> Option<Decimal> {
        self.fields.usd_per_unit.clone()
    }

    /// Accessor for the fee paid in coins
    pub fn coin_fee(&self) -> Option<Decimal> {
        self.fields.coin_fee.clone()
    }

    /// Accessor for the broker fee paid in dollars
    pub fn broker_fee_usd(&self) -> Option<Decimal> {
        self.fields.broker_fee_usd.clone()
    }

    /// Accessor for the mining contract term
    pub fn term_months(&self) -> Option<u32> {
        self.fields.term_months
    }

    /// Accessor for the hash rate
    pub fn hashrate(&self) -> Option<Hashrate> {
        self.fields.hashrate
    }

    /// The USD value of the transaction
    ///
    /// This is the USD amount if one was given, otherwise the coin amount
    /// times the USD/unit rate. Returns `None` if neither can be computed.
    pub fn usd_value(&self) -> Option<Decimal> {
        match (
            &self.fields.usd_amount,
            &self.fields.coin_amount,
            &self.fields.usd_per_unit,
        ) {
            (Some(usd), _, _) => Some(usd.clone()),
            (None, Some(coin), Some(rate)) => Some(coin * rate),
            _ => None,
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.fields.time, self.fields.ty)?;
        if !self.fields.account.is_empty() {
            write!(f, " [{}]", self.fields.account)?;
        }
        if let Some(coin) = &self.fields.coin_amount {
            write!(f, " {coin} coin")?;
        }
        if let Some(usd) = &self.fields.usd_amount {
            write!(f, " ${usd}")?;
        }
        if let Some(rate) = &self.fields.usd_per_unit {
            write!(f, " @ ${rate}")?;
        }
        Ok(())
    }
}

/// Sorts transactions into chronological order, keeping input order for
/// equal timestamps
pub fn chronological<'a, I>(txs: I) -> Vec<&'a Transaction>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut ret: Vec<_> = txs.into_iter().collect();
    ret.sort_by_key(|tx| tx.time());
    ret
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use crate::decimal;

    #[test]
    fn type_codes() {
        for ty in [
            TransactionType::Acquire,
            TransactionType::Dispose,
            TransactionType::Transfer,
            TransactionType::Income,
            TransactionType::MiningIncome,
            TransactionType::MiningPurchase,
            TransactionType::MiningReinvest,
        ] {
            assert_eq!(ty.code().parse::<TransactionType>().unwrap(), ty);
        }
        assert!(matches!("".parse::<TransactionType>(), Err(Error::MissingType)));
        assert!(matches!(
            "buy".parse::<TransactionType>(),
            Err(Error::UnknownType(_))
        ));
        assert!("buy".parse::<TransactionType>().unwrap_err().is_empty_record());
    }

    #[test]
    fn acquire_rules() {
        let mut f = fields("2021-1-1", TransactionType::Acquire);
        f.coin_amount = Some(decimal!(1));
        assert!(matches!(
            Transaction::from_fields(f.clone()),
            Err(Error::MissingFields { .. })
        ));

        f.usd_per_unit = Some(decimal!(30000));
        let tx = Transaction::from_fields(f.clone()).unwrap();
        assert_eq!(tx.usd_value(), Some(decimal!(30000)));

        f.coin_amount = Some(Decimal::zero());
        assert!(Transaction::from_fields(f).is_err());
    }

    #[test]
    fn transfer_rules() {
        let mut f = fields("2021-1-1", TransactionType::Transfer);
        assert!(Transaction::from_fields(f.clone()).is_err());

        f.coin_amount = Some(decimal!(1));
        assert!(Transaction::from_fields(f.clone()).is_ok());

        // A fee needs a price so that it can be treated as a disposal
        f.coin_fee = Some(decimal!(0.0001));
        assert!(Transaction::from_fields(f.clone()).is_err());
        f.usd_per_unit = Some(decimal!(50000));
        assert!(Transaction::from_fields(f).is_ok());
    }

    #[test]
    fn mining_contract_rules() {
        let mut f = fields("2021-1-1", TransactionType::MiningPurchase);
        f.usd_amount = Some(decimal!(1000));
        assert!(Transaction::from_fields(f.clone()).is_err());

        f.term_months = Some(12);
        assert!(Transaction::from_fields(f.clone()).is_err());

        f.hashrate = Some(Hashrate::from_gh_per_sec(5000));
        let tx = Transaction::from_fields(f.clone()).unwrap();
        assert_eq!(tx.usd_value(), Some(decimal!(1000)));

        let mut zero_term = f.clone();
        zero_term.term_months = Some(0);
        assert!(Transaction::from_fields(zero_term).is_err());

        // Paid in coin, priced by rate
        let mut coin = f.clone();
        coin.usd_amount = None;
        coin.coin_amount = Some(decimal!(0.02));
        assert!(Transaction::from_fields(coin.clone()).is_err());
        coin.usd_per_unit = Some(decimal!(50000));
        let tx = Transaction::from_fields(coin).unwrap();
        assert_eq!(tx.usd_value(), Some(decimal!(1000)));

        // Neither coin nor USD
        let mut neither = f;
        neither.usd_amount = None;
        neither.usd_per_unit = Some(decimal!(50000));
        assert!(Transaction::from_fields(neither).is_err());
    }

    #[test]
    fn sort_is_stable() {
        let a = trade("", "2021-2-1", TransactionType::Acquire, "1", "10");
        let b = trade("", "2021-1-1", TransactionType::Acquire, "2", "20");
        let c = trade("", "2021-2-1", TransactionType::Acquire, "3", "30");
        let txs = [a.clone(), b.clone(), c.clone()];
        let sorted = chronological(&txs);
        assert_eq!(sorted, vec![&b, &a, &c]);
    }
}
