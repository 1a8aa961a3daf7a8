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

//! Numeric Policy
//!
//! Every amount in the engine is a [Decimal]. All divisions go through [div] so
//! that a zero divisor surfaces as a missing value rather than a panic, and all
//! "is this used up?" decisions go through [is_negligible] so that the lot
//! ledger and the income allocator agree on what zero means.
//!

use super::Decimal;
use std::sync::OnceLock;

/// Power of ten below which magnitudes are treated as zero
pub const EPSILON_EXPONENT: u32 = 24;

/// Anything whose magnitude is at most this (1e-24) is treated as zero
pub fn epsilon() -> &'static Decimal {
    static EPSILON: OnceLock<Decimal> = OnceLock::new();
    EPSILON.get_or_init(|| {
        let ten = Decimal::from(10u64);
        (0..EPSILON_EXPONENT).fold(Decimal::one(), |acc, _| acc / &ten)
    })
}

/// Whether a value is small enough to be treated as zero
pub fn is_negligible(x: &Decimal) -> bool {
    x.abs() <= *epsilon()
}

/// Divides two decimals, returning `None` if the divisor is zero
pub fn div(num: &Decimal, den: &Decimal) -> Option<Decimal> {
    num.checked_div(den)
}

/// Construct a decimal from a literal, e.g. decimal!(100.25) or decimal!(3)
#[macro_export]
macro_rules! decimal {
    ($num:expr) => {
        $num.to_string()
            .parse::<$crate::units::Decimal>()
            .unwrap()
    };
}
