//! The windowed-aggregation driver (spec.md §4.2): opens a bucket on the
//! first point of a new `(name, tags, bucket)` key, closes it when a point
//! from a different key arrives or the upstream ends, and asks a
//! `WindowReducer` to produce the bucket's emission(s).
//!
//! Modeled on `WindowCursorContract` (`db/executor/kernel/window.rs`): a
//! windowed state machine constructed from an immutable options packet,
//! generalized here from entity-row windows to point-stream time buckets.

use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::options::Interval;
use crate::point::{Point, Tags};
use std::collections::VecDeque;

/// The per-window reduction contract every `call` function implements.
/// `Output` is the emitted point's value type, which may differ from the
/// input `V` (e.g. `count` always emits `i64`, `mean` always emits `f64`).
pub trait WindowReducer<V> {
    type Output;

    /// Absorb one point already known to belong to the open window.
    fn push(&mut self, time: i64, value: &V, nil: bool);

    /// Number of points absorbed so far (becomes the emitted point's
    /// `aggregated` counter).
    fn count(&self) -> u32;

    /// Produce the bucket's emission(s): `(time, value, nil)` triples.
    /// Most functions emit exactly one point at the bucket start; `distinct`
    /// and `sample` may emit several at their own times (spec.md §4.2).
    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, Self::Output, bool)>;
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
/// CallIterator
///
/// Wraps a raw or already-aggregated upstream with a windowed reduction
/// (spec.md §4.2's "Call Iterator"). One instance performs either the
/// pre-merge (per-shard, emits partials) or post-merge (re-applies the
/// reduction over already-emitted partials within the same bucket) stage —
/// both are the same state machine over different upstreams (spec.md §4.2
/// "a second-layer merge aggregator combines partials by re-applying the
/// same reduction").
///

pub struct CallIterator<V, R: WindowReducer<V>> {
    upstream: Box<dyn PointIter<V> + Send>,
    interval: Interval,
    reducer_factory: Box<dyn Fn() -> R + Send>,
    reducer: Option<R>,
    key: Option<BucketKey>,
    pending: VecDeque<Point<R::Output>>,
    upstream_exhausted: bool,
    stats: IteratorStats,
    closed: bool,
}

impl<V, R: WindowReducer<V>> CallIterator<V, R> {
    #[must_use]
    pub fn new(
        upstream: Box<dyn PointIter<V> + Send>,
        interval: Interval,
        reducer_factory: Box<dyn Fn() -> R + Send>,
    ) -> Self {
        Self {
            upstream,
            interval,
            reducer_factory,
            reducer: None,
            key: None,
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

    /// Close out the current window, queueing its emission(s).
    fn close_window(&mut self) {
        let Some(key) = self.key.take() else { return };
        let Some(mut reducer) = self.reducer.take() else { return };
        let aggregated = reducer.count();
        for (time, value, nil) in reducer.finish(key.bucket) {
            let mut point = Point::new(key.name.clone(), key.tags.clone(), time, value);
            point.nil = nil;
            point = point.with_aggregated(aggregated);
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
            let same_window = self
                .key
                .as_ref()
                .is_some_and(|k| k.matches(&point.name, &point.tags, bucket));
            if !same_window {
                self.close_window();
                self.key = Some(BucketKey {
                    name: point.name.clone(),
                    tags: point.tags.clone(),
                    bucket,
                });
                self.reducer = Some((self.reducer_factory)());
            }
            if let Some(reducer) = self.reducer.as_mut() {
                reducer.push(point.time, &point.value, point.nil);
            }
        }
        Ok(())
    }
}

impl<V, R: WindowReducer<V>> PointIter<R::Output> for CallIterator<V, R> {
    fn next(&mut self) -> Result<Option<Point<R::Output>>, ExecError> {
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
