//! Concrete per-function window reducers (spec.md §4.2's table), following
//! the per-function adapter-struct pattern of `db/executor/kernel/reducer.rs`
//! (`CountExistsReducer`, `ExtremumFoldReducer`, `FirstLastReducer`) and the
//! tie-break-by-key comparator from `db/executor/aggregate/field_extrema.rs`.

use crate::call::window::WindowReducer;
use std::cmp::Ordering;

/// Total ordering used by `min`/`max`/`mode`/`percentile`/`distinct` across
/// all four point kinds (spec.md §4.2 lists these as defined on every type).
/// Floats compare via `total_cmp` so NaN/Inf never panics a sort.
pub trait WindowOrd {
    fn cmp_value(&self, other: &Self) -> Ordering;
}

impl WindowOrd for f64 {
    fn cmp_value(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl WindowOrd for i64 {
    fn cmp_value(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl WindowOrd for String {
    fn cmp_value(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl WindowOrd for bool {
    fn cmp_value(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// Convert a point's scalar value to `f64` for the numeric-only reducers
/// (`mean`, `stddev`, `spread`, `median`, `percentile`); these reducers are
/// only ever constructed after `CallFunction::check_supported` has already
/// rejected String/Boolean inputs. Built on `num_traits::ToPrimitive`, the
/// same conversion trait used elsewhere in this crate as `NumToPrimitive`.
pub trait AsF64: Copy {
    fn as_f64(self) -> f64;
}

impl<T> AsF64 for T
where
    T: num_traits::ToPrimitive + Copy,
{
    fn as_f64(self) -> f64 {
        self.to_f64().expect("f64/i64 point scalars always convert to f64")
    }
}

// --- count ------------------------------------------------------------

#[derive(Default)]
pub struct CountReducer {
    count: u32,
}

impl<V> WindowReducer<V> for CountReducer {
    type Output = i64;

    fn push(&mut self, _time: i64, _value: &V, nil: bool) {
        if !nil {
            self.count += 1;
        }
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, i64, bool)> {
        vec![(bucket_start, i64::from(self.count), false)]
    }
}

// --- sum ----------------------------------------------------------------

pub struct SumReducer<V> {
    sum: Option<V>,
    count: u32,
}

impl<V> Default for SumReducer<V> {
    fn default() -> Self {
        Self { sum: None, count: 0 }
    }
}

impl WindowReducer<f64> for SumReducer<f64> {
    type Output = f64;

    fn push(&mut self, _time: i64, value: &f64, nil: bool) {
        if nil {
            return;
        }
        self.sum = Some(self.sum.unwrap_or(0.0) + value);
        self.count += 1;
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, f64, bool)> {
        vec![(bucket_start, self.sum.unwrap_or(0.0), self.count == 0)]
    }
}

impl WindowReducer<i64> for SumReducer<i64> {
    type Output = i64;

    fn push(&mut self, _time: i64, value: &i64, nil: bool) {
        if nil {
            return;
        }
        self.sum = Some(self.sum.unwrap_or(0) + value);
        self.count += 1;
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, i64, bool)> {
        vec![(bucket_start, self.sum.unwrap_or(0), self.count == 0)]
    }
}

// --- min / max ------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

/// Tracks the running extreme with "earliest time wins ties"
/// (spec.md §4.2 `min`/`max` row), grounded on
/// `field_extrema.rs`'s tie-break-by-earliest-time fold.
pub struct ExtremumReducer<V> {
    which: Extremum,
    best: Option<(i64, V)>,
    count: u32,
}

impl<V> ExtremumReducer<V> {
    #[must_use]
    pub const fn new(which: Extremum) -> Self {
        Self {
            which,
            best: None,
            count: 0,
        }
    }
}

impl<V: Clone + WindowOrd> WindowReducer<V> for ExtremumReducer<V> {
    type Output = V;

    fn push(&mut self, time: i64, value: &V, nil: bool) {
        if nil {
            return;
        }
        self.count += 1;
        let better = match &self.best {
            None => true,
            Some((_, current)) => match (self.which, value.cmp_value(current)) {
                (Extremum::Min, Ordering::Less) | (Extremum::Max, Ordering::Greater) => true,
                _ => false,
            },
        };
        if better {
            self.best = Some((time, value.clone()));
        }
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, V, bool)> {
        match self.best.take() {
            // Emission is stamped with the bucket start, not the source
            // point's own time (spec.md §8 scenario 1: a value at t=9 in the
            // [0,10) bucket emits at t=0).
            Some((_, value)) => vec![(bucket_start, value, false)],
            None => vec![(bucket_start, unsafe_nil_default(), true)],
        }
    }
}

// --- first / last -----------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    First,
    Last,
}

pub struct FirstLastReducer<V> {
    which: Edge,
    current: Option<(i64, V)>,
    count: u32,
}

impl<V> FirstLastReducer<V> {
    #[must_use]
    pub const fn new(which: Edge) -> Self {
        Self {
            which,
            current: None,
            count: 0,
        }
    }
}

impl<V: Clone> WindowReducer<V> for FirstLastReducer<V> {
    type Output = V;

    fn push(&mut self, time: i64, value: &V, nil: bool) {
        if nil {
            return;
        }
        self.count += 1;
        let replace = match &self.current {
            None => true,
            Some((current_time, _)) => match self.which {
                Edge::First => time < *current_time,
                Edge::Last => time >= *current_time,
            },
        };
        if replace {
            self.current = Some((time, value.clone()));
        }
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, V, bool)> {
        match self.current.take() {
            // Same bucket-start stamping as `ExtremumReducer` (spec.md §8
            // scenario 1).
            Some((_, value)) => vec![(bucket_start, value, false)],
            None => vec![(bucket_start, unsafe_nil_default(), true)],
        }
    }
}

fn unsafe_nil_default<V>() -> V {
    unreachable!("first/last only finishes a window after push() recorded a value, or all pushes were nil")
}

// --- mean ---------------------------------------------------------------

#[derive(Default)]
pub struct MeanReducer {
    sum: f64,
    count: u32,
}

impl<V: AsF64> WindowReducer<V> for MeanReducer {
    type Output = f64;

    fn push(&mut self, _time: i64, value: &V, nil: bool) {
        if nil {
            return;
        }
        self.sum += value.as_f64();
        self.count += 1;
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, f64, bool)> {
        if self.count == 0 {
            vec![(bucket_start, 0.0, true)]
        } else {
            vec![(bucket_start, self.sum / f64::from(self.count), false)]
        }
    }
}

// --- stddev ---------------------------------------------------------------

#[derive(Default)]
pub struct StddevReducer {
    values: Vec<f64>,
}

impl<V: AsF64> WindowReducer<V> for StddevReducer {
    type Output = f64;

    fn push(&mut self, _time: i64, value: &V, nil: bool) {
        if !nil {
            self.values.push(value.as_f64());
        }
    }

    fn count(&self) -> u32 {
        u32::try_from(self.values.len()).unwrap_or(u32::MAX)
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, f64, bool)> {
        let n = self.values.len();
        if n < 2 {
            return vec![(bucket_start, 0.0, true)];
        }
        let mean = self.values.iter().sum::<f64>() / n as f64;
        let variance =
            self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
        vec![(bucket_start, variance.sqrt(), false)]
    }
}

// --- spread ---------------------------------------------------------------

pub struct SpreadReducer<V> {
    min: Option<V>,
    max: Option<V>,
    count: u32,
}

impl<V> Default for SpreadReducer<V> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            count: 0,
        }
    }
}

impl WindowReducer<f64> for SpreadReducer<f64> {
    type Output = f64;

    fn push(&mut self, _time: i64, value: &f64, nil: bool) {
        if nil {
            return;
        }
        self.count += 1;
        self.min = Some(self.min.map_or(*value, |m| m.min(*value)));
        self.max = Some(self.max.map_or(*value, |m| m.max(*value)));
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, f64, bool)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => vec![(bucket_start, max - min, false)],
            _ => vec![(bucket_start, 0.0, true)],
        }
    }
}

impl WindowReducer<i64> for SpreadReducer<i64> {
    type Output = i64;

    fn push(&mut self, _time: i64, value: &i64, nil: bool) {
        if nil {
            return;
        }
        self.count += 1;
        self.min = Some(self.min.map_or(*value, |m| m.min(*value)));
        self.max = Some(self.max.map_or(*value, |m| m.max(*value)));
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, i64, bool)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => vec![(bucket_start, max - min, false)],
            _ => vec![(bucket_start, 0, true)],
        }
    }
}

// --- median ---------------------------------------------------------------

#[derive(Default)]
pub struct MedianReducer {
    values: Vec<f64>,
}

impl<V: AsF64> WindowReducer<V> for MedianReducer {
    type Output = f64;

    fn push(&mut self, _time: i64, value: &V, nil: bool) {
        if !nil {
            self.values.push(value.as_f64());
        }
    }

    fn count(&self) -> u32 {
        u32::try_from(self.values.len()).unwrap_or(u32::MAX)
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, f64, bool)> {
        if self.values.is_empty() {
            return vec![(bucket_start, 0.0, true)];
        }
        self.values.sort_by(f64::total_cmp);
        let n = self.values.len();
        let median = if n % 2 == 0 {
            (self.values[n / 2 - 1] + self.values[n / 2]) / 2.0
        } else {
            self.values[n / 2]
        };
        vec![(bucket_start, median, false)]
    }
}

// --- mode -------------------------------------------------------------

/// Frequency map broken by earliest occurrence on ties
/// (spec.md §9 open question: "Mode tie-break: the source breaks ties by
/// earliest occurrence; preserve that exact rule").
pub struct ModeReducer<V> {
    seen: Vec<(V, u32, i64)>,
    count: u32,
}

impl<V> Default for ModeReducer<V> {
    fn default() -> Self {
        Self {
            seen: Vec::new(),
            count: 0,
        }
    }
}

impl<V: Clone + WindowOrd> WindowReducer<V> for ModeReducer<V> {
    type Output = V;

    fn push(&mut self, time: i64, value: &V, nil: bool) {
        if nil {
            return;
        }
        self.count += 1;
        if let Some(entry) = self
            .seen
            .iter_mut()
            .find(|(v, _, _)| v.cmp_value(value) == Ordering::Equal)
        {
            entry.1 += 1;
        } else {
            self.seen.push((value.clone(), 1, time));
        }
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, V, bool)> {
        let best = self
            .seen
            .drain(..)
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.2.cmp(&a.2)));
        match best {
            Some((value, _, _)) => vec![(bucket_start, value, false)],
            None => vec![(bucket_start, unsafe_nil_default(), true)],
        }
    }
}

// --- percentile -------------------------------------------------------

pub struct PercentileReducer<V> {
    p: u8,
    values: Vec<(V, i64)>,
}

impl<V> PercentileReducer<V> {
    #[must_use]
    pub const fn new(p: u8) -> Self {
        Self { p, values: Vec::new() }
    }
}

impl<V: Clone + WindowOrd> WindowReducer<V> for PercentileReducer<V> {
    type Output = V;

    fn push(&mut self, time: i64, value: &V, nil: bool) {
        if !nil {
            self.values.push((value.clone(), time));
        }
    }

    fn count(&self) -> u32 {
        u32::try_from(self.values.len()).unwrap_or(u32::MAX)
    }

    fn finish(&mut self, bucket_start: i64) -> Vec<(i64, V, bool)> {
        let n = self.values.len();
        if n == 0 {
            return vec![(bucket_start, unsafe_nil_default(), true)];
        }
        self.values.sort_by(|a, b| a.0.cmp_value(&b.0));
        // index = ceil(p/100 * n) - 1, clamped to [0, n-1] (spec.md §4.2).
        let raw_index = ((f64::from(self.p) / 100.0) * n as f64).ceil() as i64 - 1;
        let index = raw_index.clamp(0, n as i64 - 1) as usize;
        // Bucket-start stamping, same as min/max/first/last (spec.md §8
        // scenario 1): the selected value's own time is discarded.
        let (value, _) = self.values[index].clone();
        vec![(bucket_start, value, false)]
    }
}

// --- distinct ---------------------------------------------------------

/// Emits each distinct value once, at its first-occurrence time within the
/// window (spec.md §9 open question resolution; see DESIGN.md).
pub struct DistinctReducer<V> {
    seen: Vec<(V, i64)>,
    count: u32,
}

impl<V> Default for DistinctReducer<V> {
    fn default() -> Self {
        Self {
            seen: Vec::new(),
            count: 0,
        }
    }
}

impl<V: Clone + WindowOrd> WindowReducer<V> for DistinctReducer<V> {
    type Output = V;

    fn push(&mut self, time: i64, value: &V, nil: bool) {
        if nil {
            return;
        }
        self.count += 1;
        if !self.seen.iter().any(|(v, _)| v.cmp_value(value) == Ordering::Equal) {
            self.seen.push((value.clone(), time));
        }
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn finish(&mut self, _bucket_start: i64) -> Vec<(i64, V, bool)> {
        if self.seen.is_empty() {
            // No non-nil points: distinct emits nothing for an empty window,
            // unlike the single-value reducers above.
            return Vec::new();
        }
        self.seen.drain(..).map(|(v, t)| (t, v, false)).collect()
    }
}

// --- sample -------------------------------------------------------------

/// Deterministic Vitter-R reservoir sampling seeded by a caller-supplied
/// `u64` (DESIGN.md "sample(k)" resolution): no wall-clock/thread-rng
/// dependency, so output is reproducible given the same seed and input.
pub struct SampleReducer<V> {
    k: usize,
    rng: SplitMix64,
    reservoir: Vec<(i64, V)>,
    seen: u64,
}

impl<V> SampleReducer<V> {
    #[must_use]
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            rng: SplitMix64::new(seed),
            reservoir: Vec::with_capacity(k),
            seen: 0,
        }
    }
}

impl<V: Clone> WindowReducer<V> for SampleReducer<V> {
    type Output = V;

    fn push(&mut self, time: i64, value: &V, nil: bool) {
        if nil {
            return;
        }
        self.seen += 1;
        if self.reservoir.len() < self.k {
            self.reservoir.push((time, value.clone()));
        } else if self.k > 0 {
            let j = self.rng.next_below(self.seen);
            if (j as usize) < self.k {
                self.reservoir[j as usize] = (time, value.clone());
            }
        }
    }

    fn count(&self) -> u32 {
        u32::try_from(self.seen).unwrap_or(u32::MAX)
    }

    fn finish(&mut self, _bucket_start: i64) -> Vec<(i64, V, bool)> {
        let mut out: Vec<_> = self.reservoir.drain(..).collect();
        out.sort_by_key(|(time, _)| *time);
        out.into_iter().map(|(t, v)| (t, v, false)).collect()
    }
}

/// Minimal splitmix64 PRNG: deterministic, dependency-free, adequate for
/// reservoir index selection (not cryptographic).
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `[0, bound)`.
    fn next_below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.next_u64() % bound
    }
}
