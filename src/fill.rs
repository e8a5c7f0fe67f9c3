//! Module: fill
//! Responsibility: gap-filling over the enumerated window buckets of a
//! series (spec.md §4.5) — the `none/null/number/previous/linear` policies.
//! Does not own: bucketing (call::window opens/closes buckets; fill only
//! ever sees buckets the upstream aggregator already emits, plus the
//! `[start_time, end_time)` range it must enumerate against).
//! Boundary: applied after aggregation whenever `interval.every > 0`
//! (spec.md §4.5 "Applied after aggregation when `interval.every > 0`");
//! buffers one series at a time, so memory is bounded by one series'
//! window count, not the whole result set.

use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::options::{Fill, Interval};
use crate::point::{Point, Tags};
use std::collections::VecDeque;

/// Conversion/interpolation hooks each of the four point scalar types needs
/// to support every fill mode (spec.md §9 "Aux field threading" sibling
/// note: model per-kind behavior behind a small trait rather than
/// reflection). Non-numeric kinds (`String`/`Boolean`) degrade gracefully
/// on `number`/`linear` rather than being rejected at construction, mirroring
/// `elapsed`'s "defined for all four input types" stance elsewhere in this
/// crate.
pub trait FillValue: Clone {
    /// Value used for a `Fill::Null` bucket or as a placeholder alongside
    /// `nil = true`; never read by a consumer that checks `nil` first.
    fn nil_placeholder() -> Self;
    /// Materialize `Fill::Number(v)` for this scalar kind.
    fn from_number(v: f64) -> Self;
    /// Linear interpolation between two non-nil endpoints at fraction
    /// `frac` in `(0, 1)` across the gap (spec.md §4.5 linear formula).
    fn interpolate(left: &Self, right: &Self, frac: f64) -> Self;
}

impl FillValue for f64 {
    fn nil_placeholder() -> Self {
        0.0
    }

    fn from_number(v: f64) -> Self {
        v
    }

    fn interpolate(left: &Self, right: &Self, frac: f64) -> Self {
        left + (right - left) * frac
    }
}

impl FillValue for i64 {
    fn nil_placeholder() -> Self {
        0
    }

    fn from_number(v: f64) -> Self {
        // Integer outputs truncate toward zero after computing in float
        // (spec.md §4.5).
        v.trunc() as i64
    }

    fn interpolate(left: &Self, right: &Self, frac: f64) -> Self {
        let value = (*left as f64) + ((*right - *left) as f64) * frac;
        value.trunc() as i64
    }
}

impl FillValue for String {
    fn nil_placeholder() -> Self {
        String::new()
    }

    fn from_number(v: f64) -> Self {
        v.to_string()
    }

    fn interpolate(left: &Self, _right: &Self, frac: f64) -> Self {
        // No arithmetic meaning for strings; hold the left endpoint until
        // the gap is closer to the right one.
        if frac < 0.5 {
            left.clone()
        } else {
            _right.clone()
        }
    }
}

impl FillValue for bool {
    fn nil_placeholder() -> Self {
        false
    }

    fn from_number(v: f64) -> Self {
        v != 0.0
    }

    fn interpolate(left: &Self, right: &Self, frac: f64) -> Self {
        if frac < 0.5 {
            *left
        } else {
            *right
        }
    }
}

struct Slot<V> {
    time: i64,
    /// Every actual point whose bucket is `time`, in arrival order. Most
    /// aggregates emit at most one per bucket, but `distinct`/`sample`/
    /// `top`/`bottom` can emit several points in the same window, each at
    /// its own original time (spec.md §4.2/§4.3) — fill must preserve all
    /// of them rather than matching a single exact-time slot.
    actuals: Vec<(i64, V, bool)>,
}

///
/// FillIterator
///
/// Buffers one series' actual windowed points at a time, enumerates every
/// bucket in `[start_time, end_time)`, and applies the configured `Fill`
/// policy to buckets with no actual point (spec.md §4.5). Series
/// boundaries reset all fill state (left anchor, previous value).
///

pub struct FillIterator<V> {
    upstream: Box<dyn PointIter<V> + Send>,
    start_time: i64,
    end_time: i64,
    interval: Interval,
    fill: Fill,
    peeked: Option<Point<V>>,
    upstream_exhausted: bool,
    pending: VecDeque<Point<V>>,
    stats: IteratorStats,
    closed: bool,
}

impl<V> FillIterator<V> {
    #[must_use]
    pub fn new(
        upstream: Box<dyn PointIter<V> + Send>,
        start_time: i64,
        end_time: i64,
        interval: Interval,
        fill: Fill,
    ) -> Self {
        Self {
            upstream,
            start_time,
            end_time,
            interval,
            fill,
            peeked: None,
            upstream_exhausted: false,
            pending: VecDeque::new(),
            stats: IteratorStats::new(),
            closed: false,
        }
    }

    fn pull(&mut self) -> Result<Option<Point<V>>, ExecError> {
        if let Some(p) = self.peeked.take() {
            return Ok(Some(p));
        }
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

    fn buckets(&self) -> Vec<i64> {
        if !self.interval.is_windowed() {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut b = self.start_time;
        // Align the first bucket to the interval grid, matching call::window's
        // bucket_of formula so enumeration and actual points agree.
        b = self.interval.bucket(b);
        while b < self.end_time {
            if b >= self.start_time {
                out.push(b);
            }
            b += self.interval.every;
        }
        out
    }
}

impl<V: FillValue> FillIterator<V> {
    /// Pull every point belonging to the series starting at `first`,
    /// leaving the first point of the next series (if any) in `peeked`.
    fn collect_series(&mut self, first: Point<V>) -> Result<(String, Tags, Vec<Slot<V>>), ExecError> {
        let name = first.name.clone();
        let tags = first.tags.clone();
        let mut actuals: Vec<(i64, V, bool)> = vec![(first.time, first.value, first.nil)];
        loop {
            let Some(point) = self.pull()? else { break };
            if point.name != name || point.tags != tags {
                self.peeked = Some(point);
                break;
            }
            actuals.push((point.time, point.value, point.nil));
        }
        let buckets = self.buckets();
        let slots = if buckets.is_empty() {
            // Ungrouped input reaching fill (e.g. a planner that still
            // stacks fill with no interval): pass every actual through.
            actuals
                .into_iter()
                .map(|(t, v, nil)| Slot { time: t, actuals: vec![(t, v, nil)] })
                .collect()
        } else {
            // Group every actual by the bucket its own time falls into
            // (not by exact equality with the bucket start), so a bucket
            // can hold zero, one, or many actuals.
            let first_bucket = buckets[0];
            let every = self.interval.every;
            let mut grouped: Vec<Vec<(i64, V, bool)>> = buckets.iter().map(|_| Vec::new()).collect();
            for (t, v, nil) in actuals {
                let bucket = self.interval.bucket(t);
                let idx = (bucket - first_bucket) / every;
                if idx >= 0 && (idx as usize) < grouped.len() {
                    grouped[idx as usize].push((t, v, nil));
                }
            }
            buckets
                .into_iter()
                .zip(grouped)
                .map(|(b, actuals)| Slot { time: b, actuals })
                .collect()
        };
        Ok((name, tags, slots))
    }

    fn apply_fill(&self, name: &str, tags: &Tags, slots: Vec<Slot<V>>) -> Vec<Point<V>> {
        match &self.fill {
            Fill::None => {
                let mut out = Vec::new();
                for Slot { actuals, .. } in slots {
                    for (t, v, nil) in actuals {
                        out.push(make_point(name, tags, t, v, nil));
                    }
                }
                out
            }
            Fill::Null => {
                let mut out = Vec::new();
                for Slot { time, actuals } in slots {
                    if actuals.is_empty() {
                        out.push(make_point(name, tags, time, V::nil_placeholder(), true));
                    } else {
                        for (t, v, nil) in actuals {
                            out.push(make_point(name, tags, t, v, nil));
                        }
                    }
                }
                out
            }
            Fill::Number(n) => {
                let mut out = Vec::new();
                for Slot { time, actuals } in slots {
                    if actuals.is_empty() {
                        out.push(make_point(name, tags, time, V::from_number(*n), false));
                    } else {
                        for (t, v, nil) in actuals {
                            out.push(make_point(name, tags, t, v, nil));
                        }
                    }
                }
                out
            }
            Fill::Previous => {
                let mut last: Option<V> = None;
                let mut out = Vec::new();
                for Slot { time, actuals } in slots {
                    if actuals.is_empty() {
                        out.push(match &last {
                            Some(v) => make_point(name, tags, time, v.clone(), false),
                            None => make_point(name, tags, time, V::nil_placeholder(), true),
                        });
                        continue;
                    }
                    for (t, v, nil) in actuals {
                        if !nil {
                            last = Some(v.clone());
                        }
                        out.push(make_point(name, tags, t, v, nil));
                    }
                }
                out
            }
            Fill::Linear => fill_linear(name, tags, slots),
        }
    }
}

fn make_point<V>(name: &str, tags: &Tags, time: i64, value: V, nil: bool) -> Point<V> {
    let mut point = Point::new(name, tags.clone(), time, value);
    point.nil = nil;
    point
}

/// Linear-fill one series' slots: each maximal run of empty buckets is
/// interpolated between the nearest non-nil actual values on either side, or
/// emitted nil if there is no right endpoint (spec.md §4.5 "if no right
/// endpoint exists, emit nil"). A populated bucket passes all of its
/// actuals through unchanged; the interpolation anchor for such a bucket is
/// its last non-nil actual.
fn fill_linear<V: FillValue>(name: &str, tags: &Tags, slots: Vec<Slot<V>>) -> Vec<Point<V>> {
    let n = slots.len();
    // The value a populated bucket contributes as a left/right interpolation
    // anchor: its last non-nil actual, or `None` if every actual in it is nil.
    let anchors: Vec<Option<V>> = slots
        .iter()
        .map(|slot| slot.actuals.iter().rev().find(|(_, _, nil)| !nil).map(|(_, v, _)| v.clone()))
        .collect();

    let mut out: Vec<Vec<Point<V>>> = (0..n).map(|_| Vec::new()).collect();
    let mut i = 0;
    let mut last_known: Option<V> = None;
    while i < n {
        if !slots[i].actuals.is_empty() {
            for (t, v, nil) in &slots[i].actuals {
                out[i].push(make_point(name, tags, *t, v.clone(), *nil));
            }
            if let Some(v) = &anchors[i] {
                last_known = Some(v.clone());
            }
            i += 1;
        } else {
            let gap_start = i;
            let mut j = i;
            while j < n && slots[j].actuals.is_empty() {
                j += 1;
            }
            let right = if j < n { anchors[j].clone() } else { None };
            let k = j - gap_start;
            for (offset, slot) in slots[gap_start..j].iter().enumerate() {
                let value = match (&last_known, &right) {
                    (Some(left), Some(right)) => {
                        let frac = (offset as f64 + 1.0) / (k as f64 + 1.0);
                        Some(V::interpolate(left, right, frac))
                    }
                    _ => None,
                };
                out[gap_start + offset].push(match value {
                    Some(v) => make_point(name, tags, slot.time, v, false),
                    None => make_point(name, tags, slot.time, V::nil_placeholder(), true),
                });
            }
            i = j;
        }
    }
    out.into_iter().flatten().collect()
}

impl<V: FillValue> PointIter<V> for FillIterator<V> {
    fn next(&mut self) -> Result<Option<Point<V>>, ExecError> {
        if self.closed {
            return Ok(None);
        }
        while self.pending.is_empty() {
            let Some(first) = self.pull()? else { return Ok(None) };
            let (name, tags, slots) = self.collect_series(first)?;
            let points = self.apply_fill(&name, &tags, slots);
            self.pending.extend(points);
        }
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
    use crate::point::FloatPoint;
    use proptest::prelude::*;

    fn point(time: i64, value: f64) -> FloatPoint {
        FloatPoint::new("cpu", Tags::empty(), time, value)
    }

    /// spec.md §8 scenario 3: fill(linear) over mean(value) GROUP BY
    /// time(10s) with only t=12(ignored by upstream; already bucketed to
    /// t=10? here we feed already-bucketed actual points at t=10 value 2,
    /// t=60 value 7) over [0,60s) produces 0:nil,10:2,20:3,...,60:7.
    #[test]
    fn fill_linear_matches_seeded_scenario() {
        let points = vec![point(10, 2.0), point(60, 7.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = FillIterator::new(up, 0, 70, Interval::every(10), Fill::Linear);
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push((p.time, p.nil, p.value));
        }
        assert_eq!(out[0], (0, true, 0.0));
        assert_eq!(out[1], (10, false, 2.0));
        assert_eq!(out[2], (20, false, 3.0));
        assert_eq!(out[3], (30, false, 4.0));
        assert_eq!(out[4], (40, false, 5.0));
        assert_eq!(out[5], (50, false, 6.0));
        assert_eq!(out[6], (60, false, 7.0));
    }

    #[test]
    fn fill_none_omits_empty_buckets() {
        let points = vec![point(0, 1.0), point(20, 2.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = FillIterator::new(up, 0, 30, Interval::every(10), Fill::None);
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push(p.time);
        }
        assert_eq!(out, vec![0, 20]);
    }

    #[test]
    fn fill_previous_carries_last_non_nil_value() {
        let points = vec![point(0, 1.0), point(20, 2.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = FillIterator::new(up, 0, 30, Interval::every(10), Fill::Previous);
        let out: Vec<_> = std::iter::from_fn(|| it.next().unwrap()).collect();
        assert_eq!(out[1].value, 1.0);
        assert!(!out[1].nil);
    }

    #[test]
    fn fill_previous_emits_nil_with_no_prior_value() {
        let points = vec![point(10, 1.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = FillIterator::new(up, 0, 20, Interval::every(10), Fill::Previous);
        let first = it.next().unwrap().unwrap();
        assert!(first.nil);
    }

    #[test]
    fn fill_none_is_identity_on_already_dense_windows() {
        // spec.md §8: "fill(none) is the identity on already-dense windows".
        let points = vec![point(0, 1.0), point(10, 2.0), point(20, 3.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = FillIterator::new(up, 0, 30, Interval::every(10), Fill::None);
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push((p.time, p.value));
        }
        assert_eq!(out, vec![(0, 1.0), (10, 2.0), (20, 3.0)]);
    }

    proptest! {
        /// spec.md §8: `fill(none)` is the identity on a series that already
        /// has one non-nil actual point per window bucket, for any window
        /// count.
        #[test]
        fn fill_none_is_identity_on_arbitrary_dense_windows(n in 1usize..20) {
            let points: Vec<_> = (0..n).map(|i| point((i as i64) * 10, i as f64)).collect();
            let expected: Vec<_> = points.iter().map(|p| (p.time, p.value)).collect();
            let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
            let mut it = FillIterator::new(up, 0, (n as i64) * 10, Interval::every(10), Fill::None);
            let mut out = Vec::new();
            while let Some(p) = it.next().unwrap() {
                out.push((p.time, p.value));
            }
            prop_assert_eq!(out, expected);
        }
    }
}
