//! `moving_average` (spec.md §4.4).

use crate::call::reducers::AsF64;
use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::point::{FloatPoint, Point, Tags};
use std::collections::VecDeque;

///
/// MovingAverageIterator
///
/// Emits the running mean of the last `n` points, at the current point's
/// time, with `aggregated = n` (spec.md §4.4). No output until `n` points
/// of the current series have been seen; a series change resets the
/// window entirely.
///

pub struct MovingAverageIterator<V> {
    upstream: Box<dyn PointIter<V> + Send>,
    n: usize,
    window: VecDeque<f64>,
    sum: f64,
    current_series: Option<(String, Tags)>,
    stats: IteratorStats,
    closed: bool,
}

impl<V> MovingAverageIterator<V> {
    #[must_use]
    pub fn new(upstream: Box<dyn PointIter<V> + Send>, n: usize) -> Self {
        Self {
            upstream,
            n,
            window: VecDeque::with_capacity(n),
            sum: 0.0,
            current_series: None,
            stats: IteratorStats::new(),
            closed: false,
        }
    }
}

impl<V: AsF64> PointIter<f64> for MovingAverageIterator<V> {
    fn next(&mut self) -> Result<Option<FloatPoint>, ExecError> {
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
                self.window.clear();
                self.sum = 0.0;
            }
            if point.nil {
                continue;
            }
            self.window.push_back(point.value.as_f64());
            self.sum += point.value.as_f64();
            if self.window.len() > self.n {
                let dropped = self.window.pop_front().unwrap_or(0.0);
                self.sum -= dropped;
            }
            if self.window.len() < self.n || self.n == 0 {
                continue;
            }
            self.stats.record_emitted(1);
            let mean = self.sum / self.n as f64;
            let out = Point::new(point.name, point.tags, point.time, mean)
                .with_aggregated(u32::try_from(self.n).unwrap_or(u32::MAX));
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
    use crate::point::FloatPoint as InFloat;

    fn point(time: i64, value: f64) -> InFloat {
        InFloat::new("cpu", Tags::empty(), time, value)
    }

    #[test]
    fn no_emission_before_n_points_seen() {
        let points = vec![point(0, 1.0), point(1, 2.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = MovingAverageIterator::new(up, 3);
        assert!(it.next().unwrap().is_none());
    }

    #[test]
    fn emits_running_mean_of_last_n_at_current_time() {
        let points = vec![point(0, 1.0), point(1, 2.0), point(2, 3.0), point(3, 5.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = MovingAverageIterator::new(up, 2);
        let first = it.next().unwrap().unwrap();
        assert_eq!((first.time, first.value, first.aggregated), (1, 1.5, 2));
        let second = it.next().unwrap().unwrap();
        assert_eq!((second.time, second.value), (2, 2.5));
        let third = it.next().unwrap().unwrap();
        assert_eq!((third.time, third.value), (3, 4.0));
    }
}
