//! Module: selector
//! Responsibility: `top`/`bottom` selector iterators with optional tag
//! carry-over (spec.md §4.3).
//! Does not own: windowing/bucketing (call::window — selectors reuse the
//! same bucket-key tracking rather than a second implementation).
//! Boundary: operates on an already-typed upstream and always emits the
//! same point kind it was given; tag carry-over promotes a grouping tag
//! into an `aux` string, it never changes the emitted value's type.

use crate::call::reducers::WindowOrd;
use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::options::Interval;
use crate::point::{AuxValue, Point, Tags};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectorKind {
    Top,
    Bottom,
}

impl SelectorKind {
    const fn keep(self, candidate_better: Ordering) -> bool {
        match self {
            Self::Top => matches!(candidate_better, Ordering::Greater),
            Self::Bottom => matches!(candidate_better, Ordering::Less),
        }
    }
}

struct Candidate<V> {
    time: i64,
    value: V,
    tags: Tags,
    carry_tag_value: Option<String>,
}

struct BucketKey {
    name: String,
    tags: Tags,
    bucket: i64,
}

impl BucketKey {
    fn matches(&self, name: &str, tags: &Tags, bucket: i64) -> bool {
        self.name == name && &self.tags == tags && self.bucket == bucket
    }
}

///
/// SelectorIterator
///
/// Implements `top(value, N)` / `bottom(value, N)`, with the tag
/// carry-over form `top(value, host, N)` (spec.md §4.3): when
/// `carry_tag` is set, ranking happens across every point in the window
/// regardless of the carried tag's value, the carried tag is dropped from
/// the emitted series' grouping tags, and its original value surfaces as an
/// `aux` string on the emitted point.
///

pub struct SelectorIterator<V> {
    upstream: Box<dyn PointIter<V> + Send>,
    kind: SelectorKind,
    n: usize,
    carry_tag: Option<String>,
    interval: Interval,
    key: Option<BucketKey>,
    candidates: Vec<Candidate<V>>,
    pending: std::collections::VecDeque<Point<V>>,
    upstream_exhausted: bool,
    stats: IteratorStats,
    closed: bool,
}

impl<V> SelectorIterator<V> {
    #[must_use]
    pub fn new(
        upstream: Box<dyn PointIter<V> + Send>,
        kind: SelectorKind,
        n: usize,
        carry_tag: Option<String>,
        interval: Interval,
    ) -> Self {
        Self {
            upstream,
            kind,
            n,
            carry_tag,
            interval,
            key: None,
            candidates: Vec::new(),
            pending: std::collections::VecDeque::new(),
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

impl<V: Clone + WindowOrd> SelectorIterator<V> {
    /// Insert `candidate` into the bounded ranked set, keeping only the `n`
    /// selected extremes (spec.md §4.3 "Ties on value: break by ascending
    /// time").
    fn offer(&mut self, candidate: Candidate<V>) {
        if self.candidates.len() < self.n {
            self.candidates.push(candidate);
            return;
        }
        let Some((worst_idx, _)) = self
            .candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| rank_order(self.kind, a, b))
        else {
            return;
        };
        if rank_order(self.kind, &candidate, &self.candidates[worst_idx]) == Ordering::Greater {
            self.candidates[worst_idx] = candidate;
        }
    }

    fn close_window(&mut self) {
        let Some(key) = self.key.take() else { return };
        let mut selected = std::mem::take(&mut self.candidates);
        // Output order within a window: ascending time, not value
        // (spec.md §4.3).
        selected.sort_by(|a, b| a.time.cmp(&b.time));
        for candidate in selected {
            let tags = candidate.tags.clone();
            let mut point = Point::new(key.name.clone(), tags, candidate.time, candidate.value);
            if let Some(tag_value) = candidate.carry_tag_value {
                point.aux.push(AuxValue::String(tag_value));
            }
            self.pending.push_back(point);
        }
    }

    fn ensure_pending(&mut self) -> Result<(), ExecError> {
        while self.pending.is_empty() {
            let Some(point) = self.pull_upstream()? else {
                self.close_window();
                break;
            };
            let bucket = self.bucket_of(point.time);
            let group_tags = match &self.carry_tag {
                Some(tag) => point.tags.without(tag),
                None => point.tags.clone(),
            };
            let same_window = self
                .key
                .as_ref()
                .is_some_and(|k| k.matches(&point.name, &group_tags, bucket));
            if !same_window {
                self.close_window();
                self.key = Some(BucketKey {
                    name: point.name.clone(),
                    tags: group_tags.clone(),
                    bucket,
                });
            }
            if !point.nil {
                let carry_tag_value = self
                    .carry_tag
                    .as_ref()
                    .and_then(|tag| point.tags.get(tag))
                    .map(str::to_string);
                self.offer(Candidate {
                    time: point.time,
                    value: point.value,
                    tags: group_tags,
                    carry_tag_value,
                });
            }
        }
        Ok(())
    }
}

fn rank_order<V: WindowOrd>(kind: SelectorKind, a: &Candidate<V>, b: &Candidate<V>) -> Ordering {
    // "Better" candidate for the bounded set: for `top`, larger value wins,
    // ties broken toward the later time so the earlier time is evicted
    // first (symmetric rule for `bottom`).
    let value_order = a.value.cmp_value(&b.value);
    let value_order = match kind {
        SelectorKind::Top => value_order,
        SelectorKind::Bottom => value_order.reverse(),
    };
    value_order.then_with(|| b.time.cmp(&a.time))
}

impl<V: Clone + WindowOrd> PointIter<V> for SelectorIterator<V> {
    fn next(&mut self) -> Result<Option<Point<V>>, ExecError> {
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
    use crate::point::FloatPoint;

    fn point(host: &str, time: i64, value: f64) -> FloatPoint {
        FloatPoint::new("cpu", Tags::new([("host", host)]), time, value)
    }

    /// spec.md §8 scenario 2: `top(value, host, 2) GROUP BY time(30s)
    /// fill(none)` emits four rows at times 0,5,31,53 with values
    /// 20,10,100,5 and aux "A","A","B" (carried host values).
    #[test]
    fn top_with_tag_carry_over_ranks_across_window_and_drops_grouping_tag() {
        let points = vec![
            point("A", 0, 20.0),
            point("B", 5, 10.0),
            point("A", 31, 100.0),
            point("B", 53, 5.0),
        ];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = SelectorIterator::new(
            up,
            SelectorKind::Top,
            2,
            Some("host".to_string()),
            Interval::every(30),
        );
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push((p.time, p.value, p.tags.is_empty()));
        }
        assert_eq!(
            out,
            vec![
                (0, 20.0, true),
                (5, 10.0, true),
                (31, 100.0, true),
                (53, 5.0, true),
            ]
        );
    }

    #[test]
    fn ties_on_value_break_by_ascending_time() {
        let points = vec![point("A", 10, 5.0), point("A", 0, 5.0), point("A", 20, 1.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = SelectorIterator::new(up, SelectorKind::Top, 1, None, Interval::none());
        let first = it.next().unwrap().unwrap();
        assert_eq!(first.time, 0);
        assert!(it.next().unwrap().is_none());
    }
}
