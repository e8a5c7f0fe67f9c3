//! `holt_winters` (spec.md §4.4, §9 "Holt-Winters"): triple exponential
//! smoothing fit over the windowed input, projecting `h` future buckets at
//! seasonal period `m`. Parameters (alpha/beta/gamma) are chosen by a
//! deterministic grid search minimizing in-sample squared error, per
//! §9's "parameters chosen by minimization over the observed buckets" —
//! this crate must stay dependency-light and reproducible, so a fixed grid
//! replaces a numerical optimizer library.

use crate::call::reducers::AsF64;
use crate::error::ExecError;
use crate::iter::PointIter;
use crate::obs::IteratorStats;
use crate::options::Interval;
use crate::point::{FloatPoint, Point, Tags};
use std::collections::VecDeque;

/// Grid of smoothing-constant candidates searched for the best in-sample
/// fit. Coarse but deterministic; avoids a numerical-optimization
/// dependency for a single query-time forecast call.
const ALPHA_GRID: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];

/// Stability floor applied to seasonal indices (spec.md §9 "a stability
/// floor on seasonal indices") so a degenerate all-zero or all-equal
/// season never produces a seasonal component that dominates the forecast.
const SEASONAL_FLOOR: f64 = 1e-9;

///
/// HoltWintersIterator
///
/// Buffers each series' values, fits additive triple-exponential smoothing
/// (Holt's linear method when `m <= 1`, since a single-bucket season has no
/// seasonal effect to fit), and emits `h` forecast points per series at
/// `end_time + i*every` for `i` in `[1..=h]` (spec.md §4.4). Historical
/// points are consumed for fitting only; they are not re-emitted.
///

pub struct HoltWintersIterator<V> {
    upstream: Box<dyn PointIter<V> + Send>,
    interval: Interval,
    h: usize,
    m: usize,
    end_time: i64,
    current_series: Option<(String, Tags)>,
    series_values: Vec<f64>,
    pending: VecDeque<FloatPoint>,
    upstream_exhausted: bool,
    stats: IteratorStats,
    closed: bool,
}

impl<V> HoltWintersIterator<V> {
    #[must_use]
    pub fn new(
        upstream: Box<dyn PointIter<V> + Send>,
        interval: Interval,
        h: usize,
        m: usize,
        end_time: i64,
    ) -> Self {
        Self {
            upstream,
            interval,
            h,
            m: m.max(1),
            end_time,
            current_series: None,
            series_values: Vec::new(),
            pending: VecDeque::new(),
            upstream_exhausted: false,
            stats: IteratorStats::new(),
            closed: false,
        }
    }

    fn pull_upstream(&mut self) -> Result<Option<Point<V>>, ExecError>
    where
        V: AsF64,
    {
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

    fn flush_series(&mut self, name: &str, tags: &Tags) {
        if self.h == 0 || self.series_values.len() < 2 * self.m.max(2) {
            self.series_values.clear();
            return;
        }
        let forecasts = fit_and_forecast(&self.series_values, self.m, self.h);
        let every = if self.interval.is_windowed() {
            self.interval.every
        } else {
            0
        };
        for (i, value) in forecasts.into_iter().enumerate() {
            let time = self.end_time + (i as i64 + 1) * every;
            self.pending
                .push_back(Point::new(name, tags.clone(), time, value));
        }
        self.series_values.clear();
    }
}

impl<V: AsF64> PointIter<f64> for HoltWintersIterator<V> {
    fn next(&mut self) -> Result<Option<FloatPoint>, ExecError> {
        if self.closed {
            return Ok(None);
        }
        while self.pending.is_empty() {
            let Some(point) = self.pull_upstream()? else {
                if let Some((name, tags)) = self.current_series.take() {
                    self.flush_series(&name, &tags);
                }
                break;
            };
            let key = (point.name.clone(), point.tags.clone());
            let same_series = self.current_series.as_ref() == Some(&key);
            if !same_series {
                if let Some((name, tags)) = self.current_series.take() {
                    self.flush_series(&name, &tags);
                }
                self.current_series = Some(key);
            }
            if !point.nil {
                self.series_values.push(point.value.as_f64());
            }
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

/// Additive Holt-Winters state: level, trend, and one seasonal index per
/// position in the period.
struct HwState {
    level: f64,
    trend: f64,
    seasonal: Vec<f64>,
}

fn initial_state(values: &[f64], m: usize) -> HwState {
    let season_mean = |season: &[f64]| season.iter().sum::<f64>() / season.len() as f64;
    let first = &values[0..m];
    let second = &values[m..2 * m];
    let level = season_mean(first);
    let trend = (season_mean(second) - level) / m as f64;
    let mut seasonal: Vec<f64> = first.iter().map(|v| v - level).collect();
    let seasonal_mean = seasonal.iter().sum::<f64>() / m as f64;
    for s in &mut seasonal {
        *s -= seasonal_mean;
        if s.abs() < SEASONAL_FLOOR {
            *s = 0.0;
        }
    }
    HwState { level, trend, seasonal }
}

/// Run one pass of additive Holt-Winters smoothing over `values` with the
/// given constants, returning the in-sample sum of squared one-step errors
/// and the final fitted state (used to project the forecast).
fn run_pass(values: &[f64], m: usize, alpha: f64, beta: f64, gamma: f64) -> (f64, HwState) {
    let mut state = initial_state(values, m);
    let mut sse = 0.0;
    for (t, &observed) in values.iter().enumerate().skip(m) {
        let idx = t % m;
        let predicted = state.level + state.trend + state.seasonal[idx];
        sse += (observed - predicted).powi(2);

        let new_level = alpha * (observed - state.seasonal[idx]) + (1.0 - alpha) * (state.level + state.trend);
        let new_trend = beta * (new_level - state.level) + (1.0 - beta) * state.trend;
        let new_seasonal = gamma * (observed - new_level) + (1.0 - gamma) * state.seasonal[idx];

        state.level = new_level;
        state.trend = new_trend;
        state.seasonal[idx] = if new_seasonal.abs() < SEASONAL_FLOOR { 0.0 } else { new_seasonal };
    }
    (sse, state)
}

/// Grid-search over smoothing constants for the fit with lowest in-sample
/// SSE, then project `h` steps ahead.
fn fit_and_forecast(values: &[f64], m: usize, h: usize) -> Vec<f64> {
    let mut best: Option<(f64, HwState)> = None;
    for &alpha in &ALPHA_GRID {
        for &beta in &ALPHA_GRID {
            for &gamma in &ALPHA_GRID {
                let (sse, state) = run_pass(values, m, alpha, beta, gamma);
                let better = best.as_ref().is_none_or(|(best_sse, _)| sse < *best_sse);
                if better {
                    best = Some((sse, state));
                }
            }
        }
    }
    let (_, state) = best.expect("grid is non-empty");
    let n = values.len();
    (1..=h)
        .map(|i| {
            let idx = (n + i - 1) % m;
            state.level + (i as f64) * state.trend + state.seasonal[idx]
        })
        .collect()
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
    fn emits_h_forecast_points_at_expected_times() {
        let values: Vec<InFloat> = (0..8).map(|i| point(i * 10, i as f64 * 2.0)).collect();
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(values, true));
        let mut it = HoltWintersIterator::new(up, Interval::every(10), 3, 1, 70);
        let mut out = Vec::new();
        while let Some(p) = it.next().unwrap() {
            out.push(p.time);
        }
        assert_eq!(out, vec![80, 90, 100]);
    }

    #[test]
    fn flat_series_forecasts_near_constant() {
        let values: Vec<InFloat> = (0..8).map(|i| point(i * 10, 5.0)).collect();
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(values, true));
        let mut it = HoltWintersIterator::new(up, Interval::every(10), 2, 1, 70);
        while let Some(p) = it.next().unwrap() {
            assert!((p.value - 5.0).abs() < 0.5);
        }
    }

    #[test]
    fn too_little_data_emits_nothing() {
        let values = vec![point(0, 1.0), point(10, 2.0)];
        let up: Box<dyn PointIter<f64> + Send> = Box::new(BufferedIterator::new(values, true));
        let mut it = HoltWintersIterator::new(up, Interval::every(10), 2, 1, 20);
        assert!(it.next().unwrap().is_none());
    }
}
