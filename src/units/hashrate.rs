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

//! Hash Rate
//!
//! Mining hash rates, in whole GH/s
//!

use super::Decimal;
use std::{fmt, ops, str};

/// A mining hash rate, in GH/s
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Hashrate(u64);

impl Hashrate {
    /// Constructs a hash rate from a number of GH/s
    pub fn from_gh_per_sec(n: u64) -> Self {
        Hashrate(n)
    }

    /// The hash rate in GH/s, as a decimal
    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl str::FromStr for Hashrate {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str(s.trim()).map(Hashrate::from_gh_per_sec)
    }
}

impl fmt::Display for Hashrate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Sums saturate at the largest representable rate
impl ops::Add for Hashrate {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Hashrate(self.0.saturating_add(other.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_add() {
        let a: Hashrate = " 400 ".parse().unwrap();
        let b: Hashrate = "600".parse().unwrap();
        assert_eq!(a + b, Hashrate::from_gh_per_sec(1000));
        assert_eq!((a + b).to_string(), "1000");
        assert_eq!((a + b).to_decimal(), Decimal::from(1000u64));
        assert!("1.5".parse::<Hashrate>().is_err());
        assert!("-3".parse::<Hashrate>().is_err());
    }

    #[test]
    fn add_saturates() {
        let max: Hashrate = u64::MAX.to_string().parse().unwrap();
        assert_eq!(max + Hashrate::from_gh_per_sec(1), max);
        assert_eq!(max + max, Hashrate::from_gh_per_sec(u64::MAX));
    }
}
