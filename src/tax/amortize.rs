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

//! Calendar Amortizer
//!
//! Spreads the cost of a mining contract over the calendar years its term
//! covers, in proportion to the number of days it is active in each year.
//!

use super::YearMap;
use crate::units::{div, Decimal};
use chrono::{Datelike as _, Months, NaiveDate};

/// The date a contract starting at `start` with a term of `term_months` ends
///
/// Month arithmetic clamps to the end of the month, so a one-month contract
/// bought on January 31 ends on the last day of February.
pub fn end_date(start: NaiveDate, term_months: u32) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(term_months))
}

/// Splits `total` into per-year shares
///
/// Each year's segment runs from the later of the contract start and January 1
/// up to (but not including) the earlier of the following January 1 and the
/// contract end. The final segment takes whatever is left so that the shares
/// always sum to exactly `total`.
///
/// Returns `None` if the end date is not representable.
pub fn amortize(start: NaiveDate, term_months: u32, total: Decimal) -> Option<Vec<(i32, Decimal)>> {
    let end = end_date(start, term_months)?;
    let total_days = Decimal::from((end - start).num_days());

    let mut ret = vec![];
    let mut allocated = Decimal::zero();
    let mut seg_start = start;
    while seg_start < end {
        let next_year = NaiveDate::from_ymd_opt(seg_start.year() + 1, 1, 1)?;
        let seg_end = next_year.min(end);
        let share = if seg_end == end {
            &total - &allocated
        } else {
            let days = Decimal::from((seg_end - seg_start).num_days());
            div(&(&total * days), &total_days)?
        };
        allocated += &share;
        ret.push((seg_start.year(), share));
        seg_start = seg_end;
    }
    Some(ret)
}

/// Amortizes a contract and adds each year's share to the account's entry
/// in `map`
pub fn accumulate(
    map: &mut YearMap,
    account: &str,
    start: NaiveDate,
    term_months: u32,
    total: Decimal,
) -> Option<()> {
    for (year, share) in amortize(start, term_months, total)? {
        *map.entry(year)
            .or_default()
            .entry(account.to_owned())
            .or_default() += share;
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_year() {
        let shares = amortize(date(2021, 2, 1), 3, decimal!(300)).unwrap();
        assert_eq!(shares, vec![(2021, decimal!(300))]);

        // Ending exactly on January 1 is still a single segment
        let shares = amortize(date(2021, 12, 1), 1, decimal!(31)).unwrap();
        assert_eq!(shares, vec![(2021, decimal!(31))]);
    }

    #[test]
    fn half_and_half() {
        let shares = amortize(date(2021, 7, 1), 12, decimal!(1200)).unwrap();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].0, 2021);
        assert_eq!(shares[1].0, 2022);
        // 184 of 365 days
        let expected = decimal!(1200) * decimal!(184) / decimal!(365);
        assert_eq!(shares[0].1, expected);
        assert!((&shares[0].1 - decimal!(604.9315068493)).abs() < decimal!(0.0000001));
        assert_eq!(&shares[0].1 + &shares[1].1, decimal!(1200));
    }

    #[test]
    fn many_years() {
        let total = decimal!(1000);
        let shares = amortize(date(2020, 11, 15), 36, total.clone()).unwrap();
        let years: Vec<i32> = shares.iter().map(|s| s.0).collect();
        assert_eq!(years, vec![2020, 2021, 2022, 2023]);
        // 47 + 365 + 365 + 318 = 1095 days
        assert_eq!(shares[0].1, &total * decimal!(47) / decimal!(1095));
        assert_eq!(shares[1].1, &total * decimal!(365) / decimal!(1095));
        assert_eq!(shares.iter().map(|s| &s.1).sum::<Decimal>(), total);
    }

    #[test]
    fn month_end_clamping() {
        assert_eq!(end_date(date(2021, 1, 31), 1), Some(date(2021, 2, 28)));
        assert_eq!(end_date(date(2020, 1, 31), 1), Some(date(2020, 2, 29)));
    }

    #[test]
    fn accumulate_by_account() {
        let mut map = YearMap::new();
        accumulate(&mut map, "", date(2021, 7, 1), 12, decimal!(1200)).unwrap();
        accumulate(&mut map, "", date(2022, 3, 1), 2, decimal!(50)).unwrap();
        accumulate(&mut map, "BTC", date(2022, 3, 1), 2, decimal!(70)).unwrap();

        assert_eq!(map.len(), 2);
        let y2022 = &map[&2022];
        assert_eq!(y2022[""], decimal!(1200) - &map[&2021][""] + decimal!(50));
        assert_eq!(y2022["BTC"], decimal!(70));
        assert!(!map[&2021].contains_key("BTC"));
    }
}
