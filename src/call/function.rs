//! The closed set of window-aggregation functions (spec.md §4.2) and the
//! type-support table each one is checked against at construction.

use crate::error::ExecError;
use crate::point::PointKind;

///
/// CallFunction
///
/// Mirrors the function column of spec.md §4.2's table. `Percentile` and
/// `Sample` carry their call arguments; the rest are nullary over the
/// windowed value stream.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CallFunction {
    Count,
    Sum,
    Min,
    Max,
    First,
    Last,
    Mean,
    Stddev,
    Spread,
    Median,
    Mode,
    Percentile(u8),
    Distinct,
    Sample(usize, u64),
}

impl CallFunction {
    /// The external function name, used to build the
    /// `unsupported <fn> iterator type: <type>` error string (spec.md §6).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::First => "first",
            Self::Last => "last",
            Self::Mean => "mean",
            Self::Stddev => "stddev",
            Self::Spread => "spread",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::Percentile(_) => "percentile",
            Self::Distinct => "distinct",
            Self::Sample(_, _) => "sample",
        }
    }

    /// Whether this function accepts a stream of point kind `kind`
    /// (spec.md §4.2: "mean, median, stddev, spread, percentile are defined
    /// on Float and Integer inputs only"; the rest accept all four).
    #[must_use]
    pub const fn supports(self, kind: PointKind) -> bool {
        match self {
            Self::Sum | Self::Mean | Self::Stddev | Self::Spread | Self::Median | Self::Percentile(_) => {
                matches!(kind, PointKind::Float | PointKind::Integer)
            }
            Self::Count
            | Self::Min
            | Self::Max
            | Self::First
            | Self::Last
            | Self::Mode
            | Self::Distinct
            | Self::Sample(_, _) => true,
        }
    }

    /// Check `kind` against this function's support table, producing the
    /// exact construction-time error spec.md §6 requires on mismatch.
    pub fn check_supported(self, kind: PointKind) -> Result<(), ExecError> {
        if self.supports(kind) {
            Ok(())
        } else {
            Err(ExecError::unsupported_function(self.name(), &kind.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_rejects_string_and_boolean() {
        assert!(CallFunction::Mean.check_supported(PointKind::String).is_err());
        assert!(CallFunction::Mean.check_supported(PointKind::Boolean).is_err());
        assert!(CallFunction::Mean.check_supported(PointKind::Float).is_ok());
    }

    #[test]
    fn count_supports_every_kind() {
        for kind in [
            PointKind::Float,
            PointKind::Integer,
            PointKind::String,
            PointKind::Boolean,
        ] {
            assert!(CallFunction::Count.check_supported(kind).is_ok());
        }
    }

    #[test]
    fn unsupported_error_matches_wire_format() {
        let err = CallFunction::Stddev.check_supported(PointKind::Boolean).unwrap_err();
        assert_eq!(err.message, "unsupported stddev iterator type: boolean");
    }
}
