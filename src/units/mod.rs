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

//! Units
//!
//! Data structures representing the various fundamental units used throughout
//! the codebase, along with the shared numeric policy: how we divide, and what
//! we consider to be "effectively zero".
//!

mod decimal;
mod hashrate;
mod numeric;
mod utc_time;

pub use decimal::{Decimal, ParseError as DecimalError};
pub use hashrate::Hashrate;
pub use numeric::{div, is_negligible};
pub use utc_time::{Error as TimeError, UtcTime};
