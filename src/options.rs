//! The `IteratorOptions` control packet (spec.md §3) and its builder
//! ergonomics (SPEC_FULL.md §C), modeled after the plan/spec-builder shape
//! of `db/query/plan/mod.rs`'s `LoadSpec`/`QueryMode`.

use crate::error::ExecError;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Parse an RFC 3339 timestamp into nanoseconds since the Unix epoch
/// (spec.md §6 "Epoch is Unix nanoseconds"). Mirrors the
/// `DateTime::parse_from_rfc3339` use in `types/timestamp.rs`; callers
/// building `start_time`/`end_time` from human-readable bounds (tests,
/// debug tooling) go through this rather than hand-computing nanoseconds.
pub fn parse_rfc3339_nanos(s: &str) -> Result<i64, ExecError> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| ExecError::invalid_options(format!("timestamp parse error: {e}")))?
        .timestamp_nanos_opt()
        .ok_or_else(|| ExecError::invalid_options("timestamp out of range for i64 nanoseconds"))
}

///
/// Interval
///
/// Window width/offset in nanoseconds. `every == 0` disables windowing
/// (spec.md §6 "A zero `interval.every` disables windowing").
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub every: i64,
    pub offset: i64,
}

impl Interval {
    #[must_use]
    pub const fn none() -> Self {
        Self { every: 0, offset: 0 }
    }

    #[must_use]
    pub const fn every(every: i64) -> Self {
        Self { every, offset: 0 }
    }

    #[must_use]
    pub const fn is_windowed(&self) -> bool {
        self.every > 0
    }

    /// Window bucket start for time `t` (spec.md §4.2):
    /// `floor((t - offset) / every) * every + offset`.
    #[must_use]
    pub fn bucket(&self, t: i64) -> i64 {
        debug_assert!(self.every > 0, "bucket() requires a windowed interval");
        div_floor(t - self.offset, self.every) * self.every + self.offset
    }
}

/// Integer division that rounds toward negative infinity, unlike `/` which
/// truncates toward zero; needed so negative timestamps bucket correctly.
const fn div_floor(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if (r != 0) && ((r < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

///
/// Fill
///
/// Gap-filling policy applied by the fill iterator (spec.md §4.5).
///

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    /// Omit empty windows entirely.
    None,
    /// Emit a nil point for empty windows.
    #[default]
    Null,
    /// Emit a point with this fixed float value for empty windows.
    Number(f64),
    /// Carry forward the last non-nil value seen.
    Previous,
    /// Linearly interpolate between surrounding non-nil buckets.
    Linear,
}

///
/// IteratorOptions
///
/// The control packet threaded through every iterator constructor
/// (spec.md §3).
///

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IteratorOptions {
    pub expr: Option<String>,
    pub aux: Vec<String>,
    pub sources: Vec<String>,
    pub interval: Interval,
    pub dimensions: Vec<String>,
    pub group_by: BTreeSet<String>,
    pub fill: Fill,
    pub condition: Option<String>,
    pub start_time: i64,
    pub end_time: i64,
    pub limit: Option<usize>,
    pub offset: usize,
    pub slimit: Option<usize>,
    pub soffset: usize,
    pub ascending: bool,
    pub dedupe: bool,
}

impl IteratorOptions {
    #[must_use]
    pub fn builder() -> IteratorOptionsBuilder {
        IteratorOptionsBuilder::new()
    }
}

///
/// IteratorOptionsBuilder
///
/// Chained setters over `IteratorOptions`, applying the same defaulting the
/// planner applies (ascending by default, `Fill::Null` default, empty
/// dimensions), returning `ExecError` on contradictory input.
///

#[derive(Clone, Debug, Default)]
pub struct IteratorOptionsBuilder {
    inner: IteratorOptions,
}

impl IteratorOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: IteratorOptions {
                ascending: true,
                ..IteratorOptions::default()
            },
        }
    }

    #[must_use]
    pub fn expr(mut self, expr: impl Into<String>) -> Self {
        self.inner.expr = Some(expr.into());
        self
    }

    #[must_use]
    pub fn aux(mut self, aux: Vec<String>) -> Self {
        self.inner.aux = aux;
        self
    }

    #[must_use]
    pub fn sources(mut self, sources: Vec<String>) -> Self {
        self.inner.sources = sources;
        self
    }

    #[must_use]
    pub const fn interval(mut self, interval: Interval) -> Self {
        self.inner.interval = interval;
        self
    }

    #[must_use]
    pub fn dimensions(mut self, dimensions: Vec<String>) -> Self {
        self.inner.dimensions = dimensions;
        self
    }

    #[must_use]
    pub fn group_by(mut self, group_by: BTreeSet<String>) -> Self {
        self.inner.group_by = group_by;
        self
    }

    #[must_use]
    pub fn fill(mut self, fill: Fill) -> Self {
        self.inner.fill = fill;
        self
    }

    #[must_use]
    pub const fn time_range(mut self, start_time: i64, end_time: i64) -> Self {
        self.inner.start_time = start_time;
        self.inner.end_time = end_time;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.inner.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.inner.offset = offset;
        self
    }

    #[must_use]
    pub const fn series_limit(mut self, slimit: usize) -> Self {
        self.inner.slimit = Some(slimit);
        self
    }

    #[must_use]
    pub const fn series_offset(mut self, soffset: usize) -> Self {
        self.inner.soffset = soffset;
        self
    }

    #[must_use]
    pub const fn ascending(mut self, ascending: bool) -> Self {
        self.inner.ascending = ascending;
        self
    }

    #[must_use]
    pub const fn dedupe(mut self, dedupe: bool) -> Self {
        self.inner.dedupe = dedupe;
        self
    }

    pub fn build(self) -> Result<IteratorOptions, ExecError> {
        let opts = self.inner;
        if opts.soffset > 0 && opts.slimit.is_none() {
            return Err(ExecError::invalid_options(
                "series offset set without a series limit",
            ));
        }
        if opts.end_time < opts.start_time {
            return Err(ExecError::invalid_options("end_time precedes start_time"));
        }
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_aligns_on_every_with_zero_offset() {
        let iv = Interval::every(10);
        assert_eq!(iv.bucket(0), 0);
        assert_eq!(iv.bucket(9), 0);
        assert_eq!(iv.bucket(11), 10);
        assert_eq!(iv.bucket(31), 30);
    }

    #[test]
    fn bucket_floors_negative_times_correctly() {
        let iv = Interval::every(10);
        assert_eq!(iv.bucket(-1), -10);
        assert_eq!(iv.bucket(-10), -10);
    }

    #[test]
    fn builder_defaults_ascending_true_and_fill_null() {
        let opts = IteratorOptions::builder().build().unwrap();
        assert!(opts.ascending);
        assert_eq!(opts.fill, Fill::Null);
    }

    #[test]
    fn builder_rejects_series_offset_without_limit() {
        let err = IteratorOptions::builder().series_offset(2).build();
        assert!(err.is_err());
    }

    #[test]
    fn time_range_accepts_rfc3339_bounds() {
        let start = parse_rfc3339_nanos("2024-01-01T00:00:00Z").unwrap();
        let end = parse_rfc3339_nanos("2024-01-01T00:00:10Z").unwrap();
        assert_eq!(end - start, 10_000_000_000);
        let opts = IteratorOptions::builder().time_range(start, end).build().unwrap();
        assert_eq!(opts.start_time, start);
        assert_eq!(opts.end_time, end);
    }

    #[test]
    fn parse_rfc3339_nanos_rejects_malformed_input() {
        assert!(parse_rfc3339_nanos("not-a-timestamp").is_err());
    }
}
