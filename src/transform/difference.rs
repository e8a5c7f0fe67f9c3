//! `difference` / `non_negative_difference` (spec.md §4.4).

use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::point::{Point, Tags};
use num_traits::Signed as NumSigned;
use std::ops::Sub;

/// Numeric types `difference` is meaningful over: `f64`/`i64` (spec.md §4.4
/// "output type matches input" — the function is not defined on
/// string/boolean streams). `num_traits::Signed` already supplies
/// `is_negative` for both.
pub trait Signed: Copy + Sub<Output = Self> + NumSigned {}

impl Signed for f64 {}
impl Signed for i64 {}

struct Prior<V> {
    time: i64,
    value: V,
}

///
/// DifferenceIterator
///
/// For consecutive points `(t0,v0),(t1,v1)` in the same series, emits
/// `(t1, v1-v0)`, input type preserved (spec.md §4.4). With
/// `non_negative`, negative results are suppressed entirely.
///

pub struct DifferenceIterator<V> {
    upstream: Box<dyn PointIter<V> + Send>,
    non_negative: bool,
    prior: Option<Prior<V>>,
    current_series: Option<(String, Tags)>,
    stats: IteratorStats,
    closed: bool,
}

impl<V> DifferenceIterator<V> {
    #[must_use]
    pub fn new(upstream: Box<dyn PointIter<V> + Send>, non_negative: bool) -> Self {
        Self {
            upstream,
            non_negative,
            prior: None,
            current_series: None,
            stats: IteratorStats::new(),
            closed: false,
        }
    }
}

impl<V: Clone + Signed> PointIter<V> for DifferenceIterator<V> {
    fn next(&mut self) -> Result<Option<Point<V>>, ExecError> {
        if self.closed {
            return Ok(None);
        }
        loop {
            let Some(point) = self.upstream.next()? else {
                return Ok(None);
            };
            self.stats.record_scanned(1);
            let series_key = (point.name.clone(), point.tags.clone());
            let same_series = self.current_series.as_ref() == Some(&series_key);
            if !same_series {
                self.current_series = Some(series_key);
                self.prior = None;
            }
            let Some(prior) = &self.prior else {
                self.prior = Some(Prior {
                    time: point.time,
                    value: point.value.clone(),
                });
                continue;
            };
            if point.time == prior.time {
                continue;
            }
            let delta = point.value.clone() - prior.value;
            self.prior = Some(Prior {
                time: point.time,
                value: point.value.clone(),
            });
            if self.non_negative && delta.is_negative() {
                continue;
            }
            self.stats.record_emitted(1);
            let out = Point::new(point.name, point.tags, point.time, delta);
            return Ok(Some(out));
        }
    }

    fn stats(&self) -> IteratorStats {
        let mut total = self.stats;
        total.absorb(self.upstream.stats());
        total
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.upstream.close();
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::BufferedIterator;
    use crate::point::IntegerPoint;

    fn point(time: i64, value: i64) -> IntegerPoint {
        IntegerPoint::new("cpu", Tags::empty(), time, value)
    }

    #[test]
    fn difference_emits_consecutive_deltas() {
        let points = vec![point(0, 10), point(10, 4), point(20, 9)];
        let up: Box<dyn PointIter<i64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = DifferenceIterator::new(up, false);
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push((p.time, p.value));
        }
        assert_eq!(out, vec![(10, -6), (20, 5)]);
    }

    #[test]
    fn non_negative_difference_suppresses_negative_results() {
        let points = vec![point(0, 10), point(10, 4), point(20, 9)];
        let up: Box<dyn PointIter<i64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = DifferenceIterator::new(up, true);
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push(p.time);
        }
        assert_eq!(out, vec![20]);
    }

    #[test]
    fn duplicate_timestamps_collapse_to_first_occurrence() {
        let points = vec![point(0, 1), point(0, 5), point(10, 8)];
        let up: Box<dyn PointIter<i64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = DifferenceIterator::new(up, false);
        let first = it.next().unwrap().unwrap();
        assert_eq!((first.time, first.value), (10, 7));
        assert!(it.next().unwrap().is_none());
    }
}
