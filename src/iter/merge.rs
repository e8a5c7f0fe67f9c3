//! K-way merge over N same-kind iterators (spec.md §4.1 "Merge / Sort").
//!
//! Follows the ordering-key comparator of `db/cursor/order.rs` and
//! `db/executor/kernel/post_access/order_cursor.rs`, generalized from a
//! single cursor's order-by key to an N-way merge keyed on
//! `(name, tags, time)`.

use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::point::{compare_order_key, Point};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct HeapSlot<V> {
    point: Point<V>,
    source: usize,
    /// Strictly increasing per push; breaks ties in arrival order so equal
    /// keys from different upstreams come out stable (spec.md §4.1 "Equal-
    /// key ties from different upstreams are emitted in arrival order").
    seq: u64,
    ascending: bool,
}

impl<V> PartialEq for HeapSlot<V> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<V> Eq for HeapSlot<V> {}

impl<V> PartialOrd for HeapSlot<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V> Ord for HeapSlot<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        // `BinaryHeap` is a max-heap; reverse so the smallest declared-order
        // key (the next point to emit) sits at the top.
        compare_order_key(self.point.order_key(), other.point.order_key(), self.ascending)
            .reverse()
            .then_with(|| self.seq.cmp(&other.seq).reverse())
    }
}

///
/// MergeIterator
///
/// Maintains a min-heap of "next candidate from each upstream" and always
/// emits the smallest under the declared direction, pulling a replacement
/// from whichever upstream just yielded (spec.md §4.1). Assumes each
/// upstream is already individually ordered; this is the simple K-way
/// selection case (the sort-merge case — unordered upstreams — is handled
/// by buffering with `raw::BufferedIterator` ahead of the merge instead of
/// duplicating that logic here).
///

pub struct MergeIterator<V> {
    upstreams: Vec<Box<dyn PointIter<V> + Send>>,
    heap: BinaryHeap<HeapSlot<V>>,
    ascending: bool,
    next_seq: u64,
    started: bool,
    stats: IteratorStats,
    closed: bool,
}

impl<V> MergeIterator<V> {
    #[must_use]
    pub fn new(upstreams: Vec<Box<dyn PointIter<V> + Send>>, ascending: bool) -> Self {
        Self {
            upstreams,
            heap: BinaryHeap::new(),
            ascending,
            next_seq: 0,
            started: false,
            stats: IteratorStats::new(),
            closed: false,
        }
    }

    fn fill_initial(&mut self) -> Result<(), ExecError> {
        for idx in 0..self.upstreams.len() {
            self.pull_one(idx)?;
        }
        self.started = true;
        Ok(())
    }

    fn pull_one(&mut self, source: usize) -> Result<(), ExecError> {
        if let Some(point) = self.upstreams[source].next()? {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.heap.push(HeapSlot {
                point,
                source,
                seq,
                ascending: self.ascending,
            });
        }
        Ok(())
    }
}

impl<V> PointIter<V> for MergeIterator<V> {
    fn next(&mut self) -> Result<Option<Point<V>>, ExecError> {
        if self.closed {
            return Ok(None);
        }
        if !self.started {
            self.fill_initial()?;
        }
        let Some(slot) = self.heap.pop() else {
            return Ok(None);
        };
        self.pull_one(slot.source)?;
        self.stats.record_emitted(1);
        Ok(Some(slot.point))
    }

    fn stats(&self) -> IteratorStats {
        let mut total = self.stats;
        for up in &self.upstreams {
            total.absorb(up.stats());
        }
        total
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        for up in &mut self.upstreams {
            up.close();
        }
        self.heap.clear();
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::raw::BufferedIterator;
    use crate::point::Tags;
    use proptest::prelude::*;

    fn point(host: &str, time: i64, value: f64) -> Point<f64> {
        Point::new("cpu", Tags::new([("host", host)]), time, value)
    }

    #[test]
    fn merges_two_ordered_shards_preserving_global_order() {
        let a: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(
            vec![point("A", 0, 1.0), point("A", 10, 2.0)],
            true,
        ));
        let b: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(
            vec![point("B", 5, 3.0), point("B", 15, 4.0)],
            true,
        ));
        let mut merged = MergeIterator::new(vec![a, b], true);
        let mut times = Vec::new();
        while let Some(p) = merged.next().unwrap() {
            times.push((p.tags.get("host").unwrap().to_string(), p.time));
        }
        assert_eq!(
            times,
            vec![
                ("A".to_string(), 0),
                ("B".to_string(), 5),
                ("A".to_string(), 10),
                ("B".to_string(), 15),
            ]
        );
    }

    #[test]
    fn equal_keys_from_different_upstreams_emit_in_arrival_order() {
        let a: Box<dyn PointIter<f64> + Send> =
            Box::new(BufferedIterator::new(vec![point("A", 0, 1.0)], true));
        let b: Box<dyn PointIter<f64> + Send> =
            Box::new(BufferedIterator::new(vec![point("A", 0, 2.0)], true));
        let mut merged = MergeIterator::new(vec![a, b], true);
        let first = merged.next().unwrap().unwrap();
        let second = merged.next().unwrap().unwrap();
        assert_eq!(first.value, 1.0);
        assert_eq!(second.value, 2.0);
    }

    #[test]
    fn close_propagates_to_every_upstream_exactly_once() {
        let a: Box<dyn PointIter<f64> + Send> =
            Box::new(BufferedIterator::new(vec![point("A", 0, 1.0)], true));
        let mut merged = MergeIterator::new(vec![a], true);
        merged.close();
        merged.close();
        assert!(merged.next().unwrap().is_none());
    }

    /// A handful of `(host, time)` pairs per shard, pre-sorted within the
    /// shard so the merge receives well-formed upstreams.
    fn arb_shard(host: &'static str) -> impl Strategy<Value = Vec<Point<f64>>> {
        prop::collection::vec(0i64..200, 0..12).prop_map(move |mut times| {
            times.sort_unstable();
            times.dedup();
            times
                .into_iter()
                .enumerate()
                .map(|(i, t)| point(host, t, i as f64))
                .collect()
        })
    }

    proptest! {
        /// spec.md §8 order invariant: the concatenation of a merge's output
        /// is non-decreasing by `(name, tags, time)` under ascending order.
        #[test]
        fn merge_output_is_globally_non_decreasing(
            shard_a in arb_shard("A"),
            shard_b in arb_shard("B"),
            shard_c in arb_shard("C"),
        ) {
            let a: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(shard_a, true));
            let b: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(shard_b, true));
            let c: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(shard_c, true));
            let mut merged = MergeIterator::new(vec![a, b, c], true);

            let mut prev: Option<(String, Tags, i64)> = None;
            while let Some(p) = merged.next().unwrap() {
                let key = (p.name.clone(), p.tags.clone(), p.time);
                if let Some(prev_key) = &prev {
                    prop_assert!(*prev_key <= key);
                }
                prev = Some(key);
            }
        }
    }
}
