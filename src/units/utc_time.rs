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

//! UTC Time
//!
//! UTC timestamps. This is a thin wrapper around `chrono::DateTime<chrono::offset::Utc>`.
//!

use chrono::offset::Utc;
use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime, ParseError};
use core::fmt;

/// Ledger timestamp with dashes, e.g. 2021-7-1 9:30
const DASH_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Ledger timestamp with slashes, e.g. 7/1/2021 9:30
const SLASH_FORMAT: &str = "%m/%d/%Y %H:%M";

#[derive(Debug)]
pub enum Error {
    ParseError(String, ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::ParseError(ref s, ref e) => write!(f, "parsing timestamp \"{s}\": {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::ParseError(_, ref e) => Some(e),
        }
    }
}

/// A timestamp fixed to the UTC timezone. This is a thin wrapper around
/// `chrono::DateTime<Utc>`. If you find you need conversions from other
/// timezones please add an explicit conversion function.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct UtcTime {
    inner: DateTime<Utc>,
}

impl UtcTime {
    /// Returns the current time
    pub fn now() -> Self {
        UtcTime { inner: Utc::now() }
    }

    /// Parses a ledger timestamp
    ///
    /// Accepts `yyyy-M-d H:mm` and `M/d/yyyy H:mm`; which one is tried depends
    /// on whether the string contains a dash.
    pub fn parse_ledger(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        let format = if s.contains('-') {
            DASH_FORMAT
        } else {
            SLASH_FORMAT
        };
        let naive = NaiveDateTime::parse_from_str(s, format)
            .map_err(|e| Error::ParseError(s.to_owned(), e))?;
        Ok(UtcTime {
            inner: naive.and_utc(),
        })
    }

    /// Creates an object which can be given to a formatter
    pub fn format<'s>(&self, s: &'s str) -> impl fmt::Display + 's {
        self.inner.format(s)
    }

    /// The calendar date, dropping the time of day
    pub fn date(&self) -> NaiveDate {
        self.inner.date_naive()
    }

    /// Accessor for the year
    pub fn year(&self) -> i32 {
        self.inner.year()
    }
}

impl fmt::Display for UtcTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.inner.format("%F %H:%M"), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_both_formats() {
        let dash = UtcTime::parse_ledger("2021-7-1 9:05").unwrap();
        let slash = UtcTime::parse_ledger("7/1/2021 9:05").unwrap();
        assert_eq!(dash, slash);
        assert_eq!(dash.year(), 2021);
        assert_eq!(dash.date(), NaiveDate::from_ymd_opt(2021, 7, 1).unwrap());
        assert_eq!(format!("{}", dash), "2021-07-01 09:05");

        let padded = UtcTime::parse_ledger(" 2021-07-01 09:05 ").unwrap();
        assert_eq!(dash, padded);
    }

    #[test]
    fn parse_garbage() {
        assert!(UtcTime::parse_ledger("").is_err());
        assert!(UtcTime::parse_ledger("2021-13-01 00:00").is_err());
        assert!(UtcTime::parse_ledger("yesterday").is_err());
        assert!(UtcTime::parse_ledger("2021-07-01").is_err());
    }
}
