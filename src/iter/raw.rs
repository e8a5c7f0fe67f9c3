//! Raw source adapters (spec.md §2 "Raw Sources"): iterators produced by
//! shards, plus the unsorted-to-sorted adapter every other layer assumes is
//! already in place on its upstream.
//!
//! Modeled on the simplest `OrderedKeyStream` producer, a `Vec`-backed
//! fixture stream used ahead of any storage-backed implementation
//! (`db/executor/mod.rs` test doubles).

use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::point::{compare_order_key, Point};
use std::error::Error as StdError;
use std::fmt;

/// A raw iterator error, carried alongside the terminal marker (spec.md §7
/// "Runtime I/O"). Shard implementations outside this crate produce these;
/// `BufferedIterator` never does, since it is handed an already-materialized
/// `Vec`.
#[derive(Debug)]
pub struct RawSourceError(pub String);

impl fmt::Display for RawSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for RawSourceError {}

///
/// BufferedIterator
///
/// Wraps an already-materialized `Vec<Point<V>>` as a `PointIter<V>`,
/// sorting it once up front by the declared `(name, tags, time)` order
/// (spec.md §2 "unsorted-to-sorted adapters"). This is what a shard group's
/// `CreateIterator` collaborator (§6) is modeled as returning in this
/// crate's test fixtures; real shard-backed sources implement `PointIter<V>`
/// directly and skip the up-front sort when they can already stream in
/// order.
///

pub struct BufferedIterator<V> {
    points: std::vec::IntoIter<Point<V>>,
    stats: IteratorStats,
    closed: bool,
}

impl<V> BufferedIterator<V> {
    /// Sort `points` into the order this pipeline requires and wrap them.
    #[must_use]
    pub fn new(mut points: Vec<Point<V>>, ascending: bool) -> Self {
        points.sort_by(|a, b| compare_order_key(a.order_key(), b.order_key(), ascending));
        Self {
            points: points.into_iter(),
            stats: IteratorStats::new(),
            closed: false,
        }
    }

    /// Wrap `points` as-is, trusting the caller that they are already in
    /// the declared order (the common case for a real shard-backed source).
    #[must_use]
    pub fn pre_sorted(points: Vec<Point<V>>) -> Self {
        Self {
            points: points.into_iter(),
            stats: IteratorStats::new(),
            closed: false,
        }
    }
}

impl<V> PointIter<V> for BufferedIterator<V> {
    fn next(&mut self) -> Result<Option<Point<V>>, crate::error::ExecError> {
        if self.closed {
            return Ok(None);
        }
        let next = self.points.next();
        if next.is_some() {
            self.stats.record_emitted(1);
            self.stats.record_scanned(1);
        }
        Ok(next)
    }

    fn stats(&self) -> IteratorStats {
        self.stats
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Tags;

    fn point(name: &str, host: &str, time: i64, value: f64) -> Point<f64> {
        Point::new(name, Tags::new([("host", host)]), time, value)
    }

    #[test]
    fn buffered_iterator_sorts_into_declared_order() {
        let points = vec![
            point("cpu", "A", 10, 1.0),
            point("cpu", "A", 0, 2.0),
            point("cpu", "B", 5, 3.0),
        ];
        let mut it = BufferedIterator::new(points, true);
        let first = it.next().unwrap().unwrap();
        let second = it.next().unwrap().unwrap();
        let third = it.next().unwrap().unwrap();
        assert_eq!((first.tags.get("host"), first.time), (Some("A"), 0));
        assert_eq!((second.tags.get("host"), second.time), (Some("A"), 10));
        assert_eq!((third.tags.get("host"), third.time), (Some("B"), 5));
        assert!(it.next().unwrap().is_none());
    }

    #[test]
    fn close_makes_next_terminal_even_with_points_left() {
        let mut it = BufferedIterator::new(vec![point("cpu", "A", 0, 1.0)], true);
        it.close();
        assert!(it.next().unwrap().is_none());
    }

    #[test]
    fn descending_option_reverses_time_within_series() {
        let points = vec![point("cpu", "A", 0, 1.0), point("cpu", "A", 10, 2.0)];
        let mut it = BufferedIterator::new(points, false);
        assert_eq!(it.next().unwrap().unwrap().time, 10);
        assert_eq!(it.next().unwrap().unwrap().time, 0);
    }
}
