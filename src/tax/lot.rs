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

//! Lot Ledger
//!
//! Per-account FIFO queue of open tax lots. Acquisitions push lots onto the
//! back; disposals eat lots from the front, producing one realized gain per
//! (partially) consumed lot. Whatever is left at the end becomes unrealized.
//!

use super::Error;
use crate::timemap::TimeMap;
use crate::transaction::{Transaction, TransactionType};
use crate::units::{div, is_negligible, Decimal, UtcTime};
use chrono::{Datelike as _, Months, NaiveDate};
use log::{debug, info};
use std::{cmp, fmt};

/// Holding-period classification of a gain
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Term {
    ShortTerm,
    LongTerm,
}

impl Term {
    /// Classifies the holding period from `start` to `end`
    ///
    /// Long-term requires strictly more than one year; a holding of exactly
    /// one year is short-term.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Term {
        match end.checked_sub_months(Months::new(12)) {
            Some(year_before) if year_before > start => Term::LongTerm,
            _ => Term::ShortTerm,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Term::ShortTerm => f.write_str("Short-Term"),
            Term::LongTerm => f.write_str("Long-Term"),
        }
    }
}

/// The part of a gain entry which differs between realized and unrealized gains
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GainKind {
    /// Coins that were disposed of
    Realized {
        disposed: NaiveDate,
        broker_disposed: Option<String>,
        proceeds: Decimal,
    },
    /// Coins still held, aged relative to a reference date
    Unrealized { as_of: NaiveDate },
}

/// A realized or unrealized gain on some amount of coins from a single lot
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GainEntry {
    pub acquired: NaiveDate,
    pub broker_acquired: Option<String>,
    pub amount: Decimal,
    pub cost_basis: Decimal,
    pub kind: GainKind,
}

impl GainEntry {
    /// Whether this gain was realized by a disposal
    pub fn is_realized(&self) -> bool {
        matches!(self.kind, GainKind::Realized { .. })
    }

    /// The date the coins were disposed of, if they were
    pub fn disposed(&self) -> Option<NaiveDate> {
        match self.kind {
            GainKind::Realized { disposed, .. } => Some(disposed),
            GainKind::Unrealized { .. } => None,
        }
    }

    /// Where the coins went when disposed of, if recorded
    pub fn broker_disposed(&self) -> Option<&str> {
        match self.kind {
            GainKind::Realized {
                ref broker_disposed,
                ..
            } => broker_disposed.as_deref(),
            GainKind::Unrealized { .. } => None,
        }
    }

    /// Proceeds of the disposal, if any
    pub fn proceeds(&self) -> Option<Decimal> {
        match self.kind {
            GainKind::Realized { ref proceeds, .. } => Some(proceeds.clone()),
            GainKind::Unrealized { .. } => None,
        }
    }

    /// Realized gain (proceeds minus cost basis), if any
    pub fn gain(&self) -> Option<Decimal> {
        self.proceeds().map(|proceeds| proceeds - &self.cost_basis)
    }

    /// The tax year the gain was realized in
    pub fn tax_year(&self) -> Option<i32> {
        self.disposed().map(|date| date.year())
    }

    /// Holding period, measured to the disposal date or the reference date
    pub fn term(&self) -> Term {
        match self.kind {
            GainKind::Realized { disposed, .. } => Term::between(self.acquired, disposed),
            GainKind::Unrealized { as_of } => Term::between(self.acquired, as_of),
        }
    }
}

impl fmt::Display for GainEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} coin acquired {} basis ${}",
            self.amount, self.acquired, self.cost_basis
        )?;
        match self.kind {
            GainKind::Realized {
                disposed,
                ref proceeds,
                ..
            } => write!(
                f,
                "; disposed {} for ${} ({})",
                disposed,
                proceeds,
                self.term()
            ),
            GainKind::Unrealized { as_of } => write!(f, "; unrealized as of {as_of}"),
        }
    }
}

/// An open acquisition
#[derive(Clone, PartialEq, Eq, Debug)]
struct Lot {
    acquired: UtcTime,
    remaining: Decimal,
    unit_basis: Decimal,
    source: Option<String>,
    destination: Option<String>,
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ {} @ {} on {} }}",
            self.remaining, self.unit_basis, self.acquired
        )
    }
}

/// The FIFO lot queue for a single account, along with the gains realized so far
#[derive(Clone, Debug, Default)]
pub struct LotLedger {
    account: String,
    fifo: TimeMap<Lot>,
    gains: Vec<GainEntry>,
}

impl LotLedger {
    /// Creates a new empty ledger for the given account
    pub fn new(account: &str) -> Self {
        LotLedger {
            account: account.to_owned(),
            ..Default::default()
        }
    }

    /// The total coin amount in open lots
    pub fn open_amount(&self) -> Decimal {
        self.fifo.values().map(|lot| &lot.remaining).sum()
    }

    /// The number of open lots
    pub fn n_open_lots(&self) -> usize {
        self.fifo.len()
    }

    /// Gains realized so far
    pub fn realized(&self) -> &[GainEntry] {
        &self.gains
    }

    /// Processes a single transaction
    ///
    /// Transactions must be pushed in chronological order.
    pub fn push(&mut self, tx: &Transaction) -> Result<(), Error> {
        if tx.ty().opens_lot() {
            self.open_lot(tx)
        } else {
            self.dispose(tx)
        }
    }

    fn open_lot(&mut self, tx: &Transaction) -> Result<(), Error> {
        let missing = || Error::MissingPricingData {
            time: tx.time(),
            ty: tx.ty(),
        };
        let coin = tx.coin_amount().ok_or_else(missing)?;
        let unit_basis = match (tx.usd_amount(), tx.usd_per_unit(), tx.broker_fee_usd()) {
            (Some(usd), _, fee) => div(&(usd + fee.unwrap_or_default()), &coin),
            (None, Some(rate), Some(fee)) => div(&(&coin * rate + fee), &coin),
            (None, Some(rate), None) => Some(rate),
            (None, None, _) => None,
        }
        .ok_or_else(missing)?;

        let lot = Lot {
            acquired: tx.time(),
            remaining: coin,
            unit_basis,
            source: tx.source().map(str::to_owned),
            destination: tx.destination().map(str::to_owned),
        };
        debug!("[{}] opening lot {}", self.account, lot);
        self.fifo.insert(tx.time(), lot);
        Ok(())
    }

    fn dispose(&mut self, tx: &Transaction) -> Result<(), Error> {
        let principal = match tx.ty() {
            // Moving coins between our own wallets only disposes of the fee
            TransactionType::Transfer => Decimal::zero(),
            _ => tx.coin_amount().unwrap_or_default(),
        };
        let mut to_dispose = principal + tx.coin_fee().unwrap_or_default();
        if is_negligible(&to_dispose) {
            info!("Skipping non-taxable transaction {}", tx);
            return Ok(());
        }

        let rate = match (tx.usd_amount(), tx.coin_amount(), tx.usd_per_unit()) {
            (Some(usd), Some(coin), _) => div(&usd, &coin),
            (_, _, Some(rate)) => Some(rate),
            _ => None,
        }
        .ok_or(Error::MissingPricingData {
            time: tx.time(),
            ty: tx.ty(),
        })?;

        let disposed = tx.time().date();
        while !is_negligible(&to_dispose) {
            let (_, front) = self.fifo.first_mut().ok_or_else(|| Error::InsufficientLots {
                account: self.account.clone(),
                time: tx.time(),
                remaining: to_dispose.clone(),
            })?;

            let consumed = cmp::min(&to_dispose, &front.remaining).clone();
            let proceeds = &consumed * &rate;
            let cost_basis = &consumed * &front.unit_basis;
            debug!(
                "[{}] {} consuming {} from lot {}",
                self.account, tx, consumed, front
            );
            // Pass-throughs at cost produce no gain and are not recorded
            if !is_negligible(&(&proceeds - &cost_basis)) {
                self.gains.push(GainEntry {
                    acquired: front.acquired.date(),
                    broker_acquired: front.destination.clone(),
                    amount: consumed.clone(),
                    cost_basis,
                    kind: GainKind::Realized {
                        disposed,
                        broker_disposed: tx.source().map(str::to_owned),
                        proceeds,
                    },
                });
            }

            to_dispose -= &consumed;
            front.remaining -= &consumed;
            if is_negligible(&front.remaining) {
                self.fifo.pop_first();
            }
        }
        Ok(())
    }

    /// Closes out the ledger, returning the realized gains followed by one
    /// unrealized entry per open lot, aged as of `now`
    pub fn finish(self, now: NaiveDate) -> Vec<GainEntry> {
        let mut ret = self.gains;
        ret.extend(self.fifo.into_iter().map(|(_, lot)| GainEntry {
            acquired: lot.acquired.date(),
            broker_acquired: lot.source,
            cost_basis: &lot.remaining * &lot.unit_basis,
            amount: lot.remaining,
            kind: GainKind::Unrealized { as_of: now },
        }));
        ret
    }
}

/// Runs a single account's transactions through a fresh lot ledger
///
/// The transactions are sorted chronologically first, so they may be passed
/// in any order.
pub fn compute_gains(
    account: &str,
    txs: &[Transaction],
    now: NaiveDate,
) -> Result<Vec<GainEntry>, Error> {
    let mut ledger = LotLedger::new(account);
    for tx in crate::transaction::chronological(txs) {
        ledger.push(tx)?;
    }
    debug!(
        "[{}] {} realized gains, {} open lots totalling {}",
        account,
        ledger.realized().len(),
        ledger.n_open_lots(),
        ledger.open_amount(),
    );
    Ok(ledger.finish(now))
}
