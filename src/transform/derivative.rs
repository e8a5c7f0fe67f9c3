//! `derivative` / `non_negative_derivative` (spec.md §4.4).

use crate::call::reducers::AsF64;
use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::point::{FloatPoint, Point, Tags};

struct Prior<V> {
    time: i64,
    value: V,
}

///
/// DerivativeIterator
///
/// For consecutive non-duplicate points `(t0,v0),(t1,v1)` in the same
/// series, emits `(t1, (v1-v0) * unit / (t1-t0))`. Duplicate timestamps
/// within a series collapse to the first occurrence and emit nothing for
/// that adjacency (spec.md §4.4, §8 "Derivative idempotence").
///

pub struct DerivativeIterator<V> {
    upstream: Box<dyn PointIter<V> + Send>,
    unit_nanos: i64,
    non_negative: bool,
    prior: Option<Prior<V>>,
    current_series: Option<(String, Tags)>,
    stats: IteratorStats,
    closed: bool,
}

impl<V> DerivativeIterator<V> {
    #[must_use]
    pub fn new(upstream: Box<dyn PointIter<V> + Send>, unit_nanos: i64, non_negative: bool) -> Self {
        Self {
            upstream,
            unit_nanos,
            non_negative,
            prior: None,
            current_series: None,
            stats: IteratorStats::new(),
            closed: false,
        }
    }
}

impl<V: Clone + AsF64> PointIter<f64> for DerivativeIterator<V> {
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
                self.prior = None;
            }
            let Some(prior) = &self.prior else {
                self.prior = Some(Prior {
                    time: point.time,
                    value: point.value,
                });
                continue;
            };
            if point.time == prior.time {
                // Duplicate timestamp: collapse to the first occurrence,
                // emit nothing for this adjacency.
                continue;
            }
            let dt = (point.time - prior.time) as f64;
            let dv = point.value.clone().as_f64() - prior.value.as_f64();
            let derivative = dv * (self.unit_nanos as f64) / dt;
            self.prior = Some(Prior {
                time: point.time,
                value: point.value,
            });
            if self.non_negative && derivative < 0.0 {
                continue;
            }
            self.stats.record_emitted(1);
            let out = Point::new(point.name, point.tags, point.time, derivative);
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
    use proptest::prelude::*;

    fn point(time: i64, value: f64) -> FloatPoint {
        FloatPoint::new("cpu", Tags::empty(), time, value)
    }

    /// spec.md §8 scenario 4: derivative(value, 1s) on
    /// {(0,20),(4,10),(8,19),(12,3)} yields {(4,-2.5),(8,2.25),(12,-4)}.
    #[test]
    fn derivative_matches_seeded_scenario() {
        let points = vec![point(0, 20.0), point(4, 10.0), point(8, 19.0), point(12, 3.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = DerivativeIterator::new(up, 1_000_000_000, false);
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push((p.time, p.value));
        }
        assert_eq!(out, vec![(4, -2.5), (8, 2.25), (12, -4.0)]);
    }

    #[test]
    fn duplicate_timestamps_collapse_to_first_occurrence_and_emit_nothing() {
        let points = vec![point(0, 1.0), point(0, 2.0), point(10, 3.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = DerivativeIterator::new(up, 1_000_000_000, false);
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push(p.time);
        }
        assert_eq!(out, vec![10]);
    }

    #[test]
    fn non_negative_suppresses_negative_results() {
        let points = vec![point(0, 20.0), point(4, 10.0), point(8, 19.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = DerivativeIterator::new(up, 1_000_000_000, true);
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push(p.time);
        }
        assert_eq!(out, vec![8]);
    }

    proptest! {
        /// spec.md §8 "Derivative idempotence": whatever duplicate
        /// timestamps appear in the input, at most one output point ever
        /// lands on a given time.
        #[test]
        fn derivative_never_emits_two_points_at_the_same_time(
            times in prop::collection::vec(0i64..30, 2..20),
            values in prop::collection::vec(-100.0f64..100.0, 2..20),
        ) {
            let mut times = times;
            times.sort_unstable();
            let points: Vec<_> = times
                .into_iter()
                .zip(values)
                .map(|(t, v)| point(t, v))
                .collect();
            let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
            let mut it = DerivativeIterator::new(up, 1_000_000_000, false);
            let mut seen = std::collections::HashSet::new();
            while let Some(p) = it.next().unwrap() {
                prop_assert!(seen.insert(p.time), "duplicate emission at time {}", p.time);
            }
        }
    }
}
