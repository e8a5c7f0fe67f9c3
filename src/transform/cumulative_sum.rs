//! `cumulative_sum` (spec.md §4.4).

use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::point::{Point, Tags};
use std::ops::Add;

///
/// CumulativeSumIterator
///
/// Emits `(ti, sum_{j<=i} vj)` per series, input type preserved
/// (spec.md §4.4). A series change resets the running sum.
///

pub struct CumulativeSumIterator<V> {
    upstream: Box<dyn PointIter<V> + Send>,
    running: Option<V>,
    current_series: Option<(String, Tags)>,
    stats: IteratorStats,
    closed: bool,
}

impl<V> CumulativeSumIterator<V> {
    #[must_use]
    pub fn new(upstream: Box<dyn PointIter<V> + Send>) -> Self {
        Self {
            upstream,
            running: None,
            current_series: None,
            stats: IteratorStats::new(),
            closed: false,
        }
    }
}

impl<V: Copy + Add<Output = V> + Default> PointIter<V> for CumulativeSumIterator<V> {
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
                self.running = None;
            }
            if point.nil {
                continue;
            }
            let running = self.running.unwrap_or_default() + point.value;
            self.running = Some(running);
            self.stats.record_emitted(1);
            let out = Point::new(point.name, point.tags, point.time, running);
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
    fn emits_running_sum_per_series() {
        let points = vec![point(0, 1), point(1, 2), point(2, 3)];
        let up: Box<dyn PointIter<i64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = CumulativeSumIterator::new(up);
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push((p.time, p.value));
        }
        assert_eq!(out, vec![(0, 1), (1, 3), (2, 6)]);
    }

    #[test]
    fn series_change_resets_running_sum() {
        use crate::point::Tags as T;
        let mut a = point(0, 10);
        a.tags = T::new([("host", "A")]);
        let mut b = point(0, 1);
        b.tags = T::new([("host", "B")]);
        let up: Box<dyn PointIter<i64> + Send> =
            Box::new(BufferedIterator::pre_sorted(vec![a, b]));
        let mut it = CumulativeSumIterator::new(up);
        let first = it.next().unwrap().unwrap();
        let second = it.next().unwrap().unwrap();
        assert_eq!(first.value, 10);
        assert_eq!(second.value, 1);
    }
}
