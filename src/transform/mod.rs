//! Module: transform
//! Responsibility: per-series, sequential transform iterators (spec.md §4.4)
//! — derivative, difference, elapsed, moving_average, cumulative_sum,
//! integral, holt_winters.
//! Does not own: windowing (call::window — integral and holt_winters reuse
//! `options.interval` directly rather than wrapping a `CallIterator`
//! themselves); fill semantics (fill.rs).
//! Boundary: every transform here takes an already-typed upstream and
//! tracks `(name, tags)` as its series key, resetting all per-series state
//! whenever that key changes (spec.md §4.4 "grouped by (name, tags)").

// 1️⃣ Module declarations

pub mod cumulative_sum;
pub mod derivative;
pub mod difference;
pub mod elapsed;
pub mod holt_winters;
pub mod integral;
pub mod moving_average;

// 2️⃣ Re-exports

pub use cumulative_sum::CumulativeSumIterator;
pub use derivative::DerivativeIterator;
pub use difference::DifferenceIterator;
pub use elapsed::ElapsedIterator;
pub use holt_winters::HoltWintersIterator;
pub use integral::IntegralIterator;
pub use moving_average::MovingAverageIterator;
