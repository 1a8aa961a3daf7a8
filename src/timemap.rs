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

//! Time Map
//!
//! An ordered set of elements, indexed by timestamp but where duplicate
//! timestamps are allowed (in which case the first-inserted ones will come
//! first).
//!
//! Supports iteration over values, popping from the front, and in-place
//! modification of the front element, but otherwise does not support direct
//! indexing or random access. This makes it a FIFO queue which stays in time order even
//! if things are pushed out of order.
//!

use crate::units::UtcTime;
use std::collections::{btree_map, BTreeMap};
use std::iter;

/// A time-indexed map
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TimeMap<V> {
    map: BTreeMap<(UtcTime, usize), V>,
    next_idx: usize,
}

// Cannot be derived because the #derive logic is dumb and wants a
// Default bound on V even though we do not need one
impl<V> Default for TimeMap<V> {
    fn default() -> Self {
        TimeMap {
            map: Default::default(),
            next_idx: Default::default(),
        }
    }
}

impl<V> TimeMap<V> {
    /// Constructs a new empty time map
    pub fn new() -> Self {
        Default::default()
    }

    /// Computes the number of stored entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Pops the first element from the map, if one exists
    pub fn pop_first(&mut self) -> Option<(UtcTime, V)> {
        self.map.pop_first().map(|((time, _), v)| (time, v))
    }

    /// Mutable access to the first element, if one exists
    ///
    /// The timestamp cannot be changed, so the element keeps its place in line.
    pub fn first_mut(&mut self) -> Option<(UtcTime, &mut V)> {
        self.map
            .iter_mut()
            .next()
            .map(|((time, _), v)| (*time, v))
    }

    /// Inserts a new element. Allows duplicates.
    ///
    /// If you insert an element twice, even with the same timestamp, it will
    /// just be in the map twice.
    pub fn insert(&mut self, time: UtcTime, item: V) {
        let idx = self.next_idx;
        // If this assertion fails it means we somehow used `idx` twice
        assert!(self.map.insert((time, idx), item).is_none());
        self.next_idx += 1;
    }

    /// Constructs a borrowed iterator over values in the map
    pub fn values(&self) -> Values<'_, V> {
        Values {
            iter: self.map.values(),
        }
    }
}

impl<V> iter::FromIterator<(UtcTime, V)> for TimeMap<V> {
    fn from_iter<I: IntoIterator<Item = (UtcTime, V)>>(iter: I) -> Self {
        let mut ret = TimeMap::new();
        for (time, v) in iter {
            ret.insert(time, v);
        }
        ret
    }
}

// Iterators

/// Borrowed iterator over entries
pub struct Values<'a, V> {
    iter: btree_map::Values<'a, (UtcTime, usize), V>,
}
impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

/// Owned iterator over (timestamp, entry) pairs
pub struct IntoIter<V> {
    iter: btree_map::IntoIter<(UtcTime, usize), V>,
}

impl<V> Iterator for IntoIter<V> {
    type Item = (UtcTime, V);
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|((time, _), v)| (time, v))
    }
}

impl<V> iter::IntoIterator for TimeMap<V> {
    type Item = (UtcTime, V);
    type IntoIter = IntoIter<V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            iter: self.map.into_iter(),
        }
    }
}
