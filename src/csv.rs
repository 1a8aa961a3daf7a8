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

//! CSV
//!
//! Basic support for printing data in comma-separated-value format
//!

use crate::tax::Term;
use crate::units::{Decimal, Hashrate};
use chrono::NaiveDate;
use std::fmt;

/// Trait for objects that can be printed in CSV format
pub trait PrintCsv {
    fn print(&self, f: &mut fmt::Formatter) -> fmt::Result;
}

/// Wrapper around a `PrintCsv` used for println! etc
pub struct CsvPrinter<P: PrintCsv>(pub P);

impl<P: PrintCsv> fmt::Display for CsvPrinter<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.print(f)
    }
}

impl PrintCsv for NaiveDate {
    fn print(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.format("%F"))
    }
}

macro_rules! impl_display {
    ($ty:ty) => {
        impl PrintCsv for $ty {
            fn print(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }
    };
}

impl_display!(Decimal);
impl_display!(usize);
impl_display!(i32);
impl_display!(u32);
impl_display!(u64);
impl_display!(Hashrate);
impl_display!(Term);

/// Quotes a text field if it needs it, by having the csv crate write it
fn escape_field(field: &str) -> Result<String, fmt::Error> {
    let mut writer = csv::WriterBuilder::new().from_writer(vec![]);
    writer.write_field(field).map_err(|_| fmt::Error)?;
    let bytes = writer.into_inner().map_err(|_| fmt::Error)?;
    String::from_utf8(bytes).map_err(|_| fmt::Error)
}

macro_rules! impl_string {
    ($ty:ty) => {
        impl PrintCsv for $ty {
            fn print(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(&escape_field(self)?)
            }
        }
    };
}

impl_string!(String);
impl_string!(str);

macro_rules! impl_tuple {
    ($($ty:ident $idx:tt)*) => {
        impl<$($ty: PrintCsv,)*> PrintCsv for ($($ty,)*) {
            #[allow(unused_assignments)]
            fn print(&self, f: &mut fmt::Formatter) -> fmt::Result {
                let mut comma = false;
                $(
                    if comma {
                        f.write_str(",")?;
                    }
                    self.$idx.print(f)?;
                    comma = true;
                )*
                Ok(())
            }
        }
    }
}

impl_tuple!(A 0 B 1);
impl_tuple!(A 0 B 1 C 2);
impl_tuple!(A 0 B 1 C 2 D 3);
impl_tuple!(A 0 B 1 C 2 D 3 E 4);
impl_tuple!(A 0 B 1 C 2 D 3 E 4 F 5);
impl_tuple!(A 0 B 1 C 2 D 3 E 4 F 5 G 6);
impl_tuple!(A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7);
impl_tuple!(A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8);
impl_tuple!(A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8 J 9);
impl_tuple!(A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8 J 9 K 10);
impl_tuple!(A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8 J 9 K 10 L 11);
impl_tuple!(A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8 J 9 K 10 L 11 M 12);
impl_tuple!(A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8 J 9 K 10 L 11 M 12 N 13);
impl_tuple!(A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8 J 9 K 10 L 11 M 12 N 13 O 14);

/// A row whose number of columns is only known at runtime
impl<P: PrintCsv> PrintCsv for [P] {
    fn print(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (n, cell) in self.iter().enumerate() {
            if n > 0 {
                f.write_str(",")?;
            }
            cell.print(f)?;
        }
        Ok(())
    }
}

impl<P: PrintCsv> PrintCsv for Vec<P> {
    fn print(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self[..].print(f)
    }
}

impl<P: PrintCsv> PrintCsv for Option<P> {
    fn print(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Some(p) => p.print(f),
            None => Ok(()), // "write the empty string"
        }
    }
}

impl<'a, P: PrintCsv + ?Sized> PrintCsv for &'a P {
    fn print(&self, f: &mut fmt::Formatter) -> fmt::Result {
        (*self).print(f)
    }
}
