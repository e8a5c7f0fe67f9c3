//! `integral` (spec.md §4.4): trapezoidal integration over time, optionally
//! windowed by `options.interval`. Each bucket boundary the series crosses
//! is interpolated between the last-seen and first-next value so the area
//! on either side of the boundary is attributed to the correct window
//! (spec.md §4.4 "per-window emission interpolates at window boundaries
//! using the last seen and first next value").

use crate::call::reducers::AsF64;
use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::options::Interval;
use crate::point::{FloatPoint, Point, Tags};
use std::collections::VecDeque;

struct Prior {
    time: i64,
    value: f64,
}

///
/// IntegralIterator
///
/// Accumulates trapezoid area (`(v0+v1)/2 * (t1-t0)`, scaled by `unit`) per
/// series. Without windowing the whole series accumulates into a single
/// emission at series end; with windowing, crossing a bucket boundary
/// closes the current window's emission and opens the next, interpolating
/// the value at the boundary time (spec.md §4.4). Duplicate timestamps use
/// the first value and are skipped (spec.md §4.4).
///

pub struct IntegralIterator<V> {
    upstream: Box<dyn PointIter<V> + Send>,
    interval: Interval,
    unit_nanos: i64,
    prior: Option<Prior>,
    current_series: Option<(String, Tags)>,
    window_bucket: i64,
    window_area: f64,
    window_count: u32,
    has_window: bool,
    pending: VecDeque<Point<f64>>,
    upstream_exhausted: bool,
    stats: IteratorStats,
    closed: bool,
}

impl<V> IntegralIterator<V> {
    #[must_use]
    pub fn new(upstream: Box<dyn PointIter<V> + Send>, interval: Interval, unit_nanos: i64) -> Self {
        Self {
            upstream,
            interval,
            unit_nanos,
            prior: None,
            current_series: None,
            window_bucket: 0,
            window_area: 0.0,
            window_count: 0,
            has_window: false,
            pending: VecDeque::new(),
            upstream_exhausted: false,
            stats: IteratorStats::new(),
            closed: false,
        }
    }

    fn bucket_of(&self, time: i64) -> i64 {
        if self.interval.is_windowed() {
            self.interval.bucket(time)
        } else {
            0
        }
    }

    fn segment_area(&self, t0: i64, v0: f64, t1: i64, v1: f64) -> f64 {
        (v0 + v1) / 2.0 * ((t1 - t0) as f64) / (self.unit_nanos as f64)
    }

    fn emit_window(&mut self, name: &str, tags: &Tags, time: i64) {
        if self.has_window {
            let mut point = Point::new(name, tags.clone(), time, self.window_area);
            point.aggregated = self.window_count;
            self.pending.push_back(point);
        }
        self.window_area = 0.0;
        self.window_count = 0;
        self.has_window = false;
    }

    fn reset_series(&mut self) {
        self.prior = None;
        self.window_area = 0.0;
        self.window_count = 0;
        self.has_window = false;
    }

    /// Fold one value into the open accumulator, stepping across any bucket
    /// boundaries between `prior` and `(time, value)` when windowed.
    fn fold_point(&mut self, name: &str, tags: &Tags, time: i64, value: f64) {
        let Some(prior) = self.prior.take() else {
            self.prior = Some(Prior { time, value });
            self.window_bucket = self.bucket_of(time);
            return;
        };
        if time == prior.time {
            // Duplicate timestamp: keep the first value, skip this point.
            self.prior = Some(prior);
            return;
        }
        if self.interval.is_windowed() {
            let mut seg_start_time = prior.time;
            let mut seg_start_value = prior.value;
            let mut bucket = self.bucket_of(prior.time);
            let target_bucket = self.bucket_of(time);
            while bucket < target_bucket {
                let boundary_time = bucket + self.interval.every;
                let frac = (boundary_time - prior.time) as f64 / (time - prior.time) as f64;
                let boundary_value = prior.value + (value - prior.value) * frac;
                self.window_area +=
                    self.segment_area(seg_start_time, seg_start_value, boundary_time, boundary_value);
                self.window_count += 1;
                self.has_window = true;
                self.emit_window(name, tags, bucket);
                self.window_bucket = bucket + self.interval.every;
                seg_start_time = boundary_time;
                seg_start_value = boundary_value;
                bucket += self.interval.every;
            }
            self.window_area += self.segment_area(seg_start_time, seg_start_value, time, value);
            self.window_count += 1;
            self.has_window = true;
            self.window_bucket = target_bucket;
        } else {
            self.window_area += self.segment_area(prior.time, prior.value, time, value);
            self.window_count += 1;
            self.has_window = true;
        }
        self.prior = Some(Prior { time, value });
    }

    fn pull_upstream(&mut self) -> Result<Option<Point<V>>, ExecError> {
        if self.upstream_exhausted {
            return Ok(None);
        }
        match self.upstream.next()? {
            Some(p) => {
                self.stats.record_scanned(1);
                Ok(Some(p))
            }
            None => {
                self.upstream_exhausted = true;
                Ok(None)
            }
        }
    }
}

impl<V: AsF64> IntegralIterator<V> {
    fn ensure_pending(&mut self) -> Result<(), ExecError> {
        while self.pending.is_empty() {
            let Some(point) = self.pull_upstream()? else {
                if let Some((name, tags)) = self.current_series.clone() {
                    let time = self.window_bucket;
                    self.emit_window(&name, &tags, time);
                }
                self.current_series = None;
                break;
            };
            let series_key = (point.name.clone(), point.tags.clone());
            let same_series = self.current_series.as_ref() == Some(&series_key);
            if !same_series {
                if let Some((name, tags)) = self.current_series.take() {
                    let time = self.window_bucket;
                    self.emit_window(&name, &tags, time);
                }
                self.reset_series();
                self.current_series = Some(series_key);
            }
            if point.nil {
                continue;
            }
            let (name, tags) = self.current_series.clone().unwrap();
            self.fold_point(&name, &tags, point.time, point.value.as_f64());
        }
        Ok(())
    }
}

impl<V: AsF64> PointIter<f64> for IntegralIterator<V> {
    fn next(&mut self) -> Result<Option<FloatPoint>, ExecError> {
        if self.closed {
            return Ok(None);
        }
        self.ensure_pending()?;
        if let Some(point) = self.pending.pop_front() {
            self.stats.record_emitted(1);
            return Ok(Some(point));
        }
        Ok(None)
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
    fn ungrouped_integral_sums_trapezoids_over_whole_series() {
        // (0,0) -> (2,4): area = (0+4)/2*2 = 4; (2,4)->(4,0): area = (4+0)/2*2 = 4.
        let points = vec![point(0, 0.0), point(2, 4.0), point(4, 0.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = IntegralIterator::new(up, Interval::none(), 1);
        let out = it.next().unwrap().unwrap();
        assert!((out.value - 8.0).abs() < 1e-9);
        assert!(it.next().unwrap().is_none());
    }

    #[test]
    fn duplicate_timestamp_uses_first_value_and_skips() {
        let points = vec![point(0, 1.0), point(0, 99.0), point(10, 1.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = IntegralIterator::new(up, Interval::none(), 1);
        let out = it.next().unwrap().unwrap();
        // Rectangle at height 1 over [0,10]: area 10, not influenced by 99.
        assert!((out.value - 10.0).abs() < 1e-9);
    }

    #[test]
    fn windowed_integral_interpolates_at_bucket_boundary() {
        // Linear ramp 0 at t=0 to 20 at t=20, window = 10: first window
        // [0,10) area under 0..10 (value 0 to 10) = 50; second window area
        // under 10..20 (10 to 20) = 150.
        let points = vec![point(0, 0.0), point(20, 20.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = IntegralIterator::new(up, Interval::every(10), 1);
        let first = it.next().unwrap().unwrap();
        assert!((first.value - 50.0).abs() < 1e-9);
        let second = it.next().unwrap().unwrap();
        assert!((second.value - 150.0).abs() < 1e-9);
    }
}
