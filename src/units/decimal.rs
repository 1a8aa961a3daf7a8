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

//! Decimals
//!
//! Fixed-precision decimal numbers. The result of every arithmetic operation
//! is rounded to [PRECISION] significant digits, with ties rounded away from
//! zero, and has its trailing zeros stripped. Values always display in plain
//! notation, never with an exponent.
//!

use bigdecimal::{BigDecimal, One as _, RoundingMode, Zero as _};
use std::num::NonZeroU64;
use std::{fmt, iter, ops, str};

/// Number of significant digits kept by every operation
pub const PRECISION: u64 = 34;

const NONZERO_PRECISION: NonZeroU64 = match NonZeroU64::new(PRECISION) {
    Some(n) => n,
    None => panic!("precision must be nonzero"),
};

/// Error parsing a decimal
pub type ParseError = bigdecimal::ParseBigDecimalError;

/// A decimal amount of coins, dollars, or anything else
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Decimal(BigDecimal);

/// Applies the rounding policy to a freshly computed value
fn rounded(x: BigDecimal) -> Decimal {
    Decimal(
        x.with_precision_round(NONZERO_PRECISION, RoundingMode::HalfUp)
            .normalized(),
    )
}

impl Decimal {
    /// Zero
    pub fn zero() -> Self {
        Decimal(BigDecimal::zero())
    }

    /// One
    pub fn one() -> Self {
        Decimal(BigDecimal::one())
    }

    /// Whether this is exactly zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether this is strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > BigDecimal::zero()
    }

    /// The absolute value
    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// Divides two decimals, returning `None` if the divisor is zero
    pub fn checked_div(&self, other: &Decimal) -> Option<Self> {
        if other.is_zero() {
            None
        } else {
            Some(rounded(&self.0 / &other.0))
        }
    }
}

impl From<i64> for Decimal {
    fn from(n: i64) -> Self {
        rounded(BigDecimal::from(n))
    }
}

impl From<u64> for Decimal {
    fn from(n: u64) -> Self {
        rounded(BigDecimal::from(n))
    }
}

impl str::FromStr for Decimal {
    type Err = ParseError;
    /// Parses plain or exponent notation, e.g. `1.25` or `1e-8`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<BigDecimal>().map(rounded)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (int, scale) = self.0.as_bigint_and_exponent();
        let int = int.to_string();
        let (sign, digits) = match int.strip_prefix('-') {
            Some(digits) => ("-", digits),
            None => ("", &int[..]),
        };
        f.write_str(sign)?;
        if scale <= 0 {
            f.write_str(digits)?;
            for _ in scale..0 {
                f.write_str("0")?;
            }
            return Ok(());
        }

        let scale = scale as usize;
        if digits.len() > scale {
            let (whole, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{whole}.{frac}")
        } else {
            f.write_str("0.")?;
            for _ in digits.len()..scale {
                f.write_str("0")?;
            }
            f.write_str(digits)
        }
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

macro_rules! impl_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident) => {
        impl<'a, 'b> ops::$trait<&'b Decimal> for &'a Decimal {
            type Output = Decimal;
            fn $method(self, other: &'b Decimal) -> Decimal {
                rounded(ops::$trait::$method(&self.0, &other.0))
            }
        }

        impl<'b> ops::$trait<&'b Decimal> for Decimal {
            type Output = Decimal;
            fn $method(self, other: &'b Decimal) -> Decimal {
                ops::$trait::$method(&self, other)
            }
        }

        impl<'a> ops::$trait<Decimal> for &'a Decimal {
            type Output = Decimal;
            fn $method(self, other: Decimal) -> Decimal {
                ops::$trait::$method(self, &other)
            }
        }

        impl ops::$trait for Decimal {
            type Output = Decimal;
            fn $method(self, other: Decimal) -> Decimal {
                ops::$trait::$method(&self, &other)
            }
        }

        impl<'b> ops::$assign_trait<&'b Decimal> for Decimal {
            fn $assign_method(&mut self, other: &'b Decimal) {
                *self = ops::$trait::$method(&*self, other);
            }
        }

        impl ops::$assign_trait for Decimal {
            fn $assign_method(&mut self, other: Decimal) {
                *self = ops::$trait::$method(&*self, &other);
            }
        }
    };
}

impl_op!(Add, add, AddAssign, add_assign);
impl_op!(Sub, sub, SubAssign, sub_assign);
impl_op!(Mul, mul, MulAssign, mul_assign);
// Panics on a zero divisor, like integer division. Use [Decimal::checked_div]
// (or [super::div]) where the divisor comes from data.
impl_op!(Div, div, DivAssign, div_assign);

impl ops::Neg for Decimal {
    type Output = Decimal;
    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |acc, x| acc + x)
    }
}

impl<'a> iter::Sum<&'a Decimal> for Decimal {
    fn sum<I: Iterator<Item = &'a Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn display() {
        assert_eq!(dec("100").to_string(), "100");
        assert_eq!(dec("1.500").to_string(), "1.5");
        assert_eq!(dec("-0.0025").to_string(), "-0.0025");
        assert_eq!(dec("1e-24").to_string(), "0.000000000000000000000001");
        assert_eq!(dec("1.5E+3").to_string(), "1500");
        assert_eq!(dec("-12e2").to_string(), "-1200");
        assert_eq!(Decimal::zero().to_string(), "0");
        assert_eq!(format!("{:?}", dec("0.10")), "0.1");
    }

    #[test]
    fn thirty_four_digits() {
        let third = dec("1") / dec("3");
        assert_eq!(third.to_string(), format!("0.{}", "3".repeat(34)));
        let two_thirds = dec("2") / dec("3");
        assert_eq!(two_thirds.to_string(), format!("0.{}7", "6".repeat(33)));

        // 29 significant digits survive a division exactly
        assert_eq!(
            dec("17.000000000000000000000000001") / dec("2"),
            dec("8.5000000000000000000000000005")
        );
    }

    #[test]
    fn ties_round_up() {
        // 1.000...0025 has 35 digits; the tie goes away from zero
        let x = dec(&format!("1.{}2", "0".repeat(32)));
        let half = dec(&format!("0.{}5", "0".repeat(33)));
        assert_eq!(&x + &half, dec(&format!("1.{}3", "0".repeat(32))));
        assert_eq!(-x - half, dec(&format!("-1.{}3", "0".repeat(32))));

        let y = dec(&format!("1.{}4", "0".repeat(32)));
        let half = dec(&format!("0.{}5", "0".repeat(33)));
        assert_eq!(y + half, dec(&format!("1.{}5", "0".repeat(32))));
    }

    #[test]
    fn arithmetic() {
        let mut x = dec("1.5");
        x += dec("2.25");
        x -= &dec("0.75");
        assert_eq!(x, dec("3"));
        assert_eq!(&x * &dec("0.5"), dec("1.5"));
        assert_eq!(dec("10").checked_div(&Decimal::zero()), None);
        assert_eq!(dec("10").checked_div(&dec("4")), Some(dec("2.5")));
        assert_eq!(dec("-3").abs(), dec("3"));
        assert!(dec("0.1").is_positive());
        assert!(!Decimal::zero().is_positive());
        let total: Decimal = [dec("1"), dec("2.5"), dec("-0.5")].iter().sum();
        assert_eq!(total, dec("3"));
        assert_eq!(Decimal::from(7u64) - Decimal::from(9i64), dec("-2"));
    }
}
