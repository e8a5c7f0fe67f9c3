//! `elapsed` (spec.md §4.4): defined for all four point kinds, always emits
//! an Integer point — unlike `derivative`/`difference` it does not read
//! the value at all, only the time delta, so it has no type restriction
//! (spec.md §9 open question: "elapsed on strings/booleans is defined").

use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::point::{IntegerPoint, Point, Tags};

struct Prior {
    time: i64,
}

///
/// ElapsedIterator
///
/// For consecutive points `(t0,_),(t1,_)` in the same series, emits
/// `(t1, (t1-t0)/unit)` as an integer (spec.md §4.4).
///

pub struct ElapsedIterator<V> {
    upstream: Box<dyn PointIter<V> + Send>,
    unit_nanos: i64,
    prior: Option<Prior>,
    current_series: Option<(String, Tags)>,
    stats: IteratorStats,
    closed: bool,
}

impl<V> ElapsedIterator<V> {
    #[must_use]
    pub fn new(upstream: Box<dyn PointIter<V> + Send>, unit_nanos: i64) -> Self {
        Self {
            upstream,
            unit_nanos,
            prior: None,
            current_series: None,
            stats: IteratorStats::new(),
            closed: false,
        }
    }
}

impl<V> PointIter<i64> for ElapsedIterator<V> {
    fn next(&mut self) -> Result<Option<IntegerPoint>, ExecError> {
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
                self.prior = Some(Prior { time: point.time });
                continue;
            };
            let elapsed = (point.time - prior.time) / self.unit_nanos;
            self.prior = Some(Prior { time: point.time });
            self.stats.record_emitted(1);
            let out = Point::new(point.name, point.tags, point.time, elapsed);
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
    use crate::point::StringPoint;

    fn point(time: i64, value: &str) -> StringPoint {
        StringPoint::new("cpu", Tags::empty(), time, value.to_string())
    }

    /// spec.md §9 open question: `elapsed` is defined on string/boolean
    /// streams and returns an Integer point type regardless of input kind.
    #[test]
    fn elapsed_on_string_stream_returns_integer_seconds() {
        let points = vec![point(0, "a"), point(5_000_000_000, "b")];
        let up: Box<dyn PointIter<String> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = ElapsedIterator::new(up, 1_000_000_000);
        let first = it.next().unwrap().unwrap();
        assert_eq!((first.time, first.value), (5_000_000_000, 5));
        assert!(it.next().unwrap().is_none());
    }

    #[test]
    fn no_emission_until_second_point_seen() {
        let points = vec![point(0, "a")];
        let up: Box<dyn PointIter<String> + Send> = Box::new(BufferedIterator::new(points, true));
        let mut it = ElapsedIterator::new(up, 1_000_000_000);
        assert!(it.next().unwrap().is_none());
    }
}
