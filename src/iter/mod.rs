//! Module: iter
//! Responsibility: the polymorphic pull-based iterator protocol (spec.md
//! §3/§4.1/§5) and the concrete-kind dispatch wrapper used to hand callers
//! one value without committing them to a generic parameter.
//! Does not own: series identity or ordering policy (point.rs), windowing
//! (options.rs/call), merge strategy (iter::merge).
//! Boundary: every producer/transform/filter in this crate implements
//! `PointIter<V>` for exactly one of the four scalar kinds and is exposed to
//! callers only behind `AnyIterator`.

// 1️⃣ Module declarations

pub mod merge;
pub mod raw;

// 2️⃣ Re-exports

pub use merge::MergeIterator;
pub use raw::BufferedIterator;

// 3️⃣ Protocol

use crate::error::ExecError;
use crate::obs::IteratorStats;
use crate::point::{AnyPoint, BooleanPoint, FloatPoint, IntegerPoint, Point, StringPoint};

///
/// PointIter
///
/// The narrow pull trait every iterator kind implements (spec.md §3
/// "Iterator"): `next()` / `stats()` / `close()`. Modeled on the
/// `OrderedKeyStream` narrow-trait shape, generalized from entity keys to
/// typed points.
///

pub trait PointIter<V> {
    /// Pull the next point. `Ok(None)` is the terminal marker. A runtime I/O
    /// error from an upstream shard iterator is surfaced here alongside (or
    /// instead of) the terminal marker (spec.md §7 "Runtime I/O").
    fn next(&mut self) -> Result<Option<Point<V>>, ExecError>;

    /// Counters accumulated so far. Safe to read for live totals, but only
    /// authoritative once `close()` has run (spec.md §5).
    fn stats(&self) -> IteratorStats;

    /// Idempotent release. Implementations must tolerate repeated calls and
    /// must propagate `close()` to any upstream they own exactly once.
    fn close(&mut self);
}

pub type BoxIter<V> = Box<dyn PointIter<V> + Send>;
pub type FloatIter = BoxIter<f64>;
pub type IntegerIter = BoxIter<i64>;
pub type StringIter = BoxIter<String>;
pub type BooleanIter = BoxIter<bool>;

///
/// AnyIterator
///
/// The generic abstract iterator form named by spec.md §3: wraps one of the
/// four concrete polymorphic kinds behind a single value callers can hold
/// without a generic parameter, preferring a closed dispatch enum over
/// trait objects at the outermost API boundary (`db/executor/mod.rs`'s
/// `AnyCursor`).
///

pub enum AnyIterator {
    Float(FloatIter),
    Integer(IntegerIter),
    String(StringIter),
    Boolean(BooleanIter),
}

impl AnyIterator {
    #[must_use]
    pub const fn kind(&self) -> crate::point::PointKind {
        use crate::point::PointKind;
        match self {
            Self::Float(_) => PointKind::Float,
            Self::Integer(_) => PointKind::Integer,
            Self::String(_) => PointKind::String,
            Self::Boolean(_) => PointKind::Boolean,
        }
    }

    pub fn next(&mut self) -> Result<Option<AnyPoint>, ExecError> {
        Ok(match self {
            Self::Float(it) => it.next()?.map(AnyPoint::Float),
            Self::Integer(it) => it.next()?.map(AnyPoint::Integer),
            Self::String(it) => it.next()?.map(AnyPoint::String),
            Self::Boolean(it) => it.next()?.map(AnyPoint::Boolean),
        })
    }

    #[must_use]
    pub fn stats(&self) -> IteratorStats {
        match self {
            Self::Float(it) => it.stats(),
            Self::Integer(it) => it.stats(),
            Self::String(it) => it.stats(),
            Self::Boolean(it) => it.stats(),
        }
    }

    pub fn close(&mut self) {
        match self {
            Self::Float(it) => it.close(),
            Self::Integer(it) => it.close(),
            Self::String(it) => it.close(),
            Self::Boolean(it) => it.close(),
        }
    }
}

impl From<FloatIter> for AnyIterator {
    fn from(it: FloatIter) -> Self {
        Self::Float(it)
    }
}

impl From<IntegerIter> for AnyIterator {
    fn from(it: IntegerIter) -> Self {
        Self::Integer(it)
    }
}

impl From<StringIter> for AnyIterator {
    fn from(it: StringIter) -> Self {
        Self::String(it)
    }
}

impl From<BooleanIter> for AnyIterator {
    fn from(it: BooleanIter) -> Self {
        Self::Boolean(it)
    }
}

/// Exhaust and discard every iterator, closing each exactly once and summing
/// their counters (spec.md §6 `DrainIterators`).
pub fn drain_iterators(iterators: &mut [AnyIterator]) -> Result<IteratorStats, ExecError> {
    let mut total = IteratorStats::new();
    for it in iterators {
        loop {
            match it.next()? {
                Some(_) => {}
                None => break,
            }
        }
        it.close();
        total.absorb(it.stats());
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Tags;

    struct OnceIter<V> {
        point: Option<Point<V>>,
        stats: IteratorStats,
        closed: bool,
    }

    impl<V> PointIter<V> for OnceIter<V> {
        fn next(&mut self) -> Result<Option<Point<V>>, ExecError> {
            let out = self.point.take();
            if out.is_some() {
                self.stats.record_emitted(1);
            }
            Ok(out)
        }

        fn stats(&self) -> IteratorStats {
            self.stats
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    #[test]
    fn any_iterator_dispatches_by_kind() {
        let p = FloatPoint::new("cpu", Tags::empty(), 0, 1.5);
        let inner: FloatIter = Box::new(OnceIter {
            point: Some(p),
            stats: IteratorStats::new(),
            closed: false,
        });
        let mut any: AnyIterator = inner.into();
        assert_eq!(any.kind(), crate::point::PointKind::Float);
        let first = any.next().unwrap();
        assert!(matches!(first, Some(AnyPoint::Float(_))));
        assert!(any.next().unwrap().is_none());
    }

    #[test]
    fn drain_iterators_closes_and_sums_stats() {
        let mut stats = IteratorStats::new();
        stats.record_emitted(1);
        let inner: IntegerIter = Box::new(OnceIter {
            point: Some(IntegerPoint::new("cpu", Tags::empty(), 0, 1)),
            stats: IteratorStats::new(),
            closed: false,
        });
        let mut iterators = vec![AnyIterator::from(inner)];
        let total = drain_iterators(&mut iterators).unwrap();
        assert_eq!(total.points_emitted, 1);
    }

    #[allow(dead_code)]
    fn exercise_other_kinds(_: StringPoint, _: BooleanPoint) {}
}
