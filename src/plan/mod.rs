//! Module: plan
//! Responsibility: turns a parsed `SELECT` statement and a shard mapper into
//! the bound iterator tree (spec.md §4.7).
//! Does not own: parsing (ast.rs only models what the parser hands over),
//! shard/storage access (shard.rs is a collaborator interface only, never
//! implemented here).
//! Boundary: every function below is pure over its inputs — no global state,
//! no caching — and returns `ExecError` rather than panicking on a
//! malformed statement.

// 1️⃣ Module declarations

pub mod ast;
pub mod shard;

// 2️⃣ Re-exports

pub use ast::{CallArg, Expr, Projection, Statement};
pub use shard::{IteratorCost, MapType, ShardGroup, ShardMapper};

use crate::binary::new_binary_iterator;
use crate::call::{new_call_iterator, CallFunction};
use crate::error::{ExecError, ExecErrorOrigin};
use crate::fill::FillIterator;
use crate::iter::{AnyIterator, MergeIterator};
use crate::options::{Interval, IteratorOptions};
use crate::point::PointKind;
use crate::selector::{SelectorIterator, SelectorKind};
use crate::transform::{
    CumulativeSumIterator, DerivativeIterator, DifferenceIterator, ElapsedIterator,
    HoltWintersIterator, IntegralIterator, MovingAverageIterator,
};

///
/// Column
///
/// One entry of the column list `Select` returns alongside the bound
/// iterators, naming the projected alias and the concrete kind it resolved
/// to.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: PointKind,
}

/// Turn `stmt` into one bound iterator per projection, in projection order
/// (spec.md §6 `Select(stmt, shardMapper, options) → (iterators[], columns[],
/// err)`). `caller_options` supplies cross-cutting overrides the AST itself
/// doesn't carry (currently just `dedupe`); the per-statement time range,
/// grouping, and fill always come from `stmt`.
pub fn select(
    stmt: &Statement,
    shard_mapper: &dyn ShardMapper,
    caller_options: &IteratorOptions,
) -> Result<(Vec<AnyIterator>, Vec<Column>), ExecError> {
    let base_options = IteratorOptions::builder()
        .sources(stmt.sources.clone())
        .interval(interval_from_group_by(stmt.group_by_time))
        .dimensions(stmt.group_by_tags.clone())
        .group_by(stmt.group_by_tags.iter().cloned().collect())
        .fill(stmt.fill.clone())
        .time_range(stmt.start_time, stmt.end_time)
        .ascending(stmt.ascending)
        .dedupe(caller_options.dedupe)
        .build()?;

    let mut shard_group =
        shard_mapper.map_shards(&stmt.sources, (stmt.start_time, stmt.end_time), &base_options)?;

    let mut iterators = Vec::with_capacity(stmt.projections.len());
    let mut columns = Vec::with_capacity(stmt.projections.len());
    for projection in &stmt.projections {
        let built = build_expr(&projection.expr, stmt, shard_group.as_ref(), &base_options)?;
        let name = projection
            .alias
            .clone()
            .unwrap_or_else(|| default_alias(&projection.expr));
        columns.push(Column { name, kind: built.kind() });
        iterators.push(built);
    }

    shard_group.close();
    Ok((iterators, columns))
}

fn interval_from_group_by(group_by_time: Option<i64>) -> Interval {
    match group_by_time {
        Some(every) => Interval::every(every),
        None => Interval::none(),
    }
}

fn default_alias(expr: &Expr) -> String {
    match expr {
        Expr::Field(name) => name.clone(),
        Expr::Call { name, .. } | Expr::Transform { name, .. } => name.clone(),
        Expr::Binary { .. } => "expr".to_string(),
    }
}

/// Resolve one projected expression into a bound iterator (spec.md §4.7
/// steps 1, 3, 4): classify, request per-source iterators from the shard
/// group, merge, and stack any transform/fill on top.
fn build_expr(
    expr: &Expr,
    stmt: &Statement,
    shard_group: &dyn ShardGroup,
    options: &IteratorOptions,
) -> Result<AnyIterator, ExecError> {
    match expr {
        Expr::Field(field) => build_raw(field, stmt, shard_group, options),
        Expr::Call { name, args } => build_call(name, args, stmt, shard_group, options),
        Expr::Transform { name, inner, args } => {
            let inner_it = build_expr(inner, stmt, shard_group, options)?;
            apply_transform(name, args, inner_it, options)
        }
        Expr::Binary { op, left, right } => {
            let left_it = build_expr(left, stmt, shard_group, options)?;
            let right_it = build_expr(right, stmt, shard_group, options)?;
            new_binary_iterator(left_it, right_it, *op)
        }
    }
}

fn build_raw(
    field: &str,
    stmt: &Statement,
    shard_group: &dyn ShardGroup,
    options: &IteratorOptions,
) -> Result<AnyIterator, ExecError> {
    let mut per_source = Vec::with_capacity(stmt.sources.len());
    for source in &stmt.sources {
        per_source.push(shard_group.create_iterator(source, options)?);
    }
    merge_same_kind(per_source, options.ascending)
}

fn build_call(
    name: &str,
    args: &[CallArg],
    stmt: &Statement,
    shard_group: &dyn ShardGroup,
    options: &IteratorOptions,
) -> Result<AnyIterator, ExecError> {
    match name {
        "top" | "bottom" => build_selector(name, args, stmt, shard_group, options),
        _ => {
            let function = parse_call_function(name, args)?;
            let field = call_field(args)?;
            build_aggregate(function, field, stmt, shard_group, options)
        }
    }
}

/// Per-source aggregation (spec.md §4.7 step 3: "the shard group is expected
/// to have already applied `NewCallIterator`, so the planner supplies the
/// inner call expression through `options.expr`"), then a second-stage
/// `CallIterator` over the merged partials to finish the cross-shard combine
/// (call::mod's "Does not own" note), then fill over the windowed result.
fn build_aggregate(
    function: CallFunction,
    field: &str,
    stmt: &Statement,
    shard_group: &dyn ShardGroup,
    options: &IteratorOptions,
) -> Result<AnyIterator, ExecError> {
    let kind = resolve_field_kind(shard_group, &stmt.sources, field)?;
    function.check_supported(kind)?;
    let pushdown_expr = format!("{}({field}::{kind})", function.name());
    let mut per_source = Vec::with_capacity(stmt.sources.len());
    for source in &stmt.sources {
        let source_options = options_with_expr(options, Some(pushdown_expr.clone()), Vec::new());
        per_source.push(shard_group.create_iterator(source, &source_options)?);
    }
    let merged = merge_same_kind(per_source, options.ascending)?;
    let combined = new_call_iterator(function, options.interval, merged)?;
    apply_fill(combined, stmt, options)
}

/// `top`/`bottom` with optional tag carry-over (spec.md §4.7 step 3:
/// "Selector-with-tags functions transmit the corresponding reducer
/// (`top`→`max`, `bottom`→`min`) as `options.expr` and request auxiliary tag
/// carry-over"), then a second-stage `SelectorIterator` re-ranks the merged
/// per-shard selections.
fn build_selector(
    name: &str,
    args: &[CallArg],
    stmt: &Statement,
    shard_group: &dyn ShardGroup,
    options: &IteratorOptions,
) -> Result<AnyIterator, ExecError> {
    let kind = if name == "top" { SelectorKind::Top } else { SelectorKind::Bottom };
    let (carry_tag, n) = match args.len() {
        2 => (None, args[1].as_integer()),
        3 => (args[1].as_field().map(str::to_string), args[2].as_integer()),
        _ => (None, None),
    };
    let n = n.ok_or_else(|| ExecError::invalid_options(format!("{name} requires a count argument")))?;
    let reducer_expr = match kind {
        SelectorKind::Top => "max",
        SelectorKind::Bottom => "min",
    };
    let aux: Vec<String> = carry_tag.clone().into_iter().collect();
    let mut per_source = Vec::with_capacity(stmt.sources.len());
    for source in &stmt.sources {
        let source_options = options_with_expr(options, Some(reducer_expr.to_string()), aux.clone());
        per_source.push(shard_group.create_iterator(source, &source_options)?);
    }
    let merged = merge_same_kind(per_source, options.ascending)?;
    let selected = new_selector_iterator(kind, n.max(0) as usize, carry_tag, options.interval, merged);
    apply_fill(selected, stmt, options)
}

fn options_with_expr(options: &IteratorOptions, expr: Option<String>, aux: Vec<String>) -> IteratorOptions {
    let mut cloned = options.clone();
    cloned.expr = expr;
    cloned.aux = aux;
    cloned
}

fn resolve_field_kind(
    shard_group: &dyn ShardGroup,
    sources: &[String],
    field: &str,
) -> Result<PointKind, ExecError> {
    for source in sources {
        let (fields, _dimensions) = shard_group.field_dimensions(source)?;
        if let Some(kind) = fields.get(field) {
            return Ok(*kind);
        }
    }
    Err(ExecError::invalid_options(format!("unknown field: {field}")))
}

fn call_field(args: &[CallArg]) -> Result<&str, ExecError> {
    args.first()
        .and_then(CallArg::as_field)
        .ok_or_else(|| ExecError::invalid_options("call requires a field argument"))
}

fn parse_call_function(name: &str, args: &[CallArg]) -> Result<CallFunction, ExecError> {
    match name {
        "count" => Ok(CallFunction::Count),
        "sum" => Ok(CallFunction::Sum),
        "min" => Ok(CallFunction::Min),
        "max" => Ok(CallFunction::Max),
        "first" => Ok(CallFunction::First),
        "last" => Ok(CallFunction::Last),
        "mean" => Ok(CallFunction::Mean),
        "stddev" => Ok(CallFunction::Stddev),
        "spread" => Ok(CallFunction::Spread),
        "median" => Ok(CallFunction::Median),
        "mode" => Ok(CallFunction::Mode),
        "distinct" => Ok(CallFunction::Distinct),
        "percentile" => {
            let p = args
                .get(1)
                .and_then(CallArg::as_integer)
                .ok_or_else(|| ExecError::invalid_options("percentile requires a numeric argument"))?;
            Ok(CallFunction::Percentile(p.clamp(0, 100) as u8))
        }
        "sample" => {
            let k = args
                .get(1)
                .and_then(CallArg::as_integer)
                .ok_or_else(|| ExecError::invalid_options("sample requires a count argument"))?;
            Ok(CallFunction::Sample(k.max(0) as usize, 0))
        }
        other => Err(ExecError::unsupported_function(other, "call")),
    }
}

fn merge_same_kind(mut per_source: Vec<AnyIterator>, ascending: bool) -> Result<AnyIterator, ExecError> {
    if per_source.len() == 1 {
        return Ok(per_source.pop().expect("length checked above"));
    }
    let Some(kind) = per_source.first().map(AnyIterator::kind) else {
        return Err(ExecError::internal(ExecErrorOrigin::Planner, "no shard iterators to merge"));
    };
    let any = match kind {
        PointKind::Float => {
            let mut ups = Vec::with_capacity(per_source.len());
            for it in per_source {
                let AnyIterator::Float(up) = it else {
                    return Err(merge_kind_mismatch(kind, it.kind()));
                };
                ups.push(up);
            }
            AnyIterator::Float(Box::new(MergeIterator::new(ups, ascending)))
        }
        PointKind::Integer => {
            let mut ups = Vec::with_capacity(per_source.len());
            for it in per_source {
                let AnyIterator::Integer(up) = it else {
                    return Err(merge_kind_mismatch(kind, it.kind()));
                };
                ups.push(up);
            }
            AnyIterator::Integer(Box::new(MergeIterator::new(ups, ascending)))
        }
        PointKind::String => {
            let mut ups = Vec::with_capacity(per_source.len());
            for it in per_source {
                let AnyIterator::String(up) = it else {
                    return Err(merge_kind_mismatch(kind, it.kind()));
                };
                ups.push(up);
            }
            AnyIterator::String(Box::new(MergeIterator::new(ups, ascending)))
        }
        PointKind::Boolean => {
            let mut ups = Vec::with_capacity(per_source.len());
            for it in per_source {
                let AnyIterator::Boolean(up) = it else {
                    return Err(merge_kind_mismatch(kind, it.kind()));
                };
                ups.push(up);
            }
            AnyIterator::Boolean(Box::new(MergeIterator::new(ups, ascending)))
        }
    };
    Ok(any)
}

fn merge_kind_mismatch(expected: PointKind, found: PointKind) -> ExecError {
    ExecError::internal(
        ExecErrorOrigin::Planner,
        format!("shard group returned mismatched iterator kinds ({expected} vs {found}) for the same source set"),
    )
}

fn new_selector_iterator(
    kind: SelectorKind,
    n: usize,
    carry_tag: Option<String>,
    interval: Interval,
    upstream: AnyIterator,
) -> AnyIterator {
    match upstream {
        AnyIterator::Float(up) => {
            AnyIterator::Float(Box::new(SelectorIterator::new(up, kind, n, carry_tag, interval)))
        }
        AnyIterator::Integer(up) => {
            AnyIterator::Integer(Box::new(SelectorIterator::new(up, kind, n, carry_tag, interval)))
        }
        AnyIterator::String(up) => {
            AnyIterator::String(Box::new(SelectorIterator::new(up, kind, n, carry_tag, interval)))
        }
        AnyIterator::Boolean(up) => {
            AnyIterator::Boolean(Box::new(SelectorIterator::new(up, kind, n, carry_tag, interval)))
        }
    }
}

/// Gap-fill a windowed, merged iterator (fill.rs "applied after aggregation
/// whenever interval.every > 0"). A no-op when the query isn't windowed.
fn apply_fill(it: AnyIterator, stmt: &Statement, options: &IteratorOptions) -> Result<AnyIterator, ExecError> {
    if !options.interval.is_windowed() {
        return Ok(it);
    }
    let any = match it {
        AnyIterator::Float(up) => AnyIterator::Float(Box::new(FillIterator::new(
            up,
            stmt.start_time,
            stmt.end_time,
            options.interval,
            options.fill.clone(),
        ))),
        AnyIterator::Integer(up) => AnyIterator::Integer(Box::new(FillIterator::new(
            up,
            stmt.start_time,
            stmt.end_time,
            options.interval,
            options.fill.clone(),
        ))),
        AnyIterator::String(up) => AnyIterator::String(Box::new(FillIterator::new(
            up,
            stmt.start_time,
            stmt.end_time,
            options.interval,
            options.fill.clone(),
        ))),
        AnyIterator::Boolean(up) => AnyIterator::Boolean(Box::new(FillIterator::new(
            up,
            stmt.start_time,
            stmt.end_time,
            options.interval,
            options.fill.clone(),
        ))),
    };
    Ok(any)
}

const DEFAULT_UNIT_NANOS: i64 = 1_000_000_000;

fn unit_nanos_arg(args: &[CallArg]) -> i64 {
    args.first().and_then(CallArg::as_integer).unwrap_or(DEFAULT_UNIT_NANOS)
}

/// Stack one named transform over `inner` (spec.md §4.4). Transforms that
/// depend on a numeric upstream (every one except `elapsed`) reject
/// string/boolean input with the same construction-time `ExecError` pattern
/// `call::new_call_iterator` uses.
fn apply_transform(
    name: &str,
    args: &[CallArg],
    inner: AnyIterator,
    options: &IteratorOptions,
) -> Result<AnyIterator, ExecError> {
    match name {
        "derivative" | "non_negative_derivative" => {
            let unit_nanos = unit_nanos_arg(args);
            let non_negative = name == "non_negative_derivative";
            let boxed: crate::iter::FloatIter = match inner {
                AnyIterator::Float(up) => Box::new(DerivativeIterator::new(up, unit_nanos, non_negative)),
                AnyIterator::Integer(up) => Box::new(DerivativeIterator::new(up, unit_nanos, non_negative)),
                other => return Err(transform_type_mismatch(name, other.kind())),
            };
            Ok(AnyIterator::Float(boxed))
        }
        "difference" | "non_negative_difference" => {
            let non_negative = name == "non_negative_difference";
            let any = match inner {
                AnyIterator::Float(up) => {
                    AnyIterator::Float(Box::new(DifferenceIterator::new(up, non_negative)))
                }
                AnyIterator::Integer(up) => {
                    AnyIterator::Integer(Box::new(DifferenceIterator::new(up, non_negative)))
                }
                other => return Err(transform_type_mismatch(name, other.kind())),
            };
            Ok(any)
        }
        "elapsed" => {
            let unit_nanos = unit_nanos_arg(args);
            let boxed: crate::iter::IntegerIter = match inner {
                AnyIterator::Float(up) => Box::new(ElapsedIterator::new(up, unit_nanos)),
                AnyIterator::Integer(up) => Box::new(ElapsedIterator::new(up, unit_nanos)),
                AnyIterator::String(up) => Box::new(ElapsedIterator::new(up, unit_nanos)),
                AnyIterator::Boolean(up) => Box::new(ElapsedIterator::new(up, unit_nanos)),
            };
            Ok(AnyIterator::Integer(boxed))
        }
        "moving_average" => {
            let n = args.first().and_then(CallArg::as_integer).unwrap_or(0).max(0) as usize;
            let boxed: crate::iter::FloatIter = match inner {
                AnyIterator::Float(up) => Box::new(MovingAverageIterator::new(up, n)),
                AnyIterator::Integer(up) => Box::new(MovingAverageIterator::new(up, n)),
                other => return Err(transform_type_mismatch(name, other.kind())),
            };
            Ok(AnyIterator::Float(boxed))
        }
        "cumulative_sum" => {
            let any = match inner {
                AnyIterator::Float(up) => AnyIterator::Float(Box::new(CumulativeSumIterator::new(up))),
                AnyIterator::Integer(up) => {
                    AnyIterator::Integer(Box::new(CumulativeSumIterator::new(up)))
                }
                other => return Err(transform_type_mismatch(name, other.kind())),
            };
            Ok(any)
        }
        "integral" => {
            let unit_nanos = unit_nanos_arg(args);
            let boxed: crate::iter::FloatIter = match inner {
                AnyIterator::Float(up) => Box::new(IntegralIterator::new(up, options.interval, unit_nanos)),
                AnyIterator::Integer(up) => Box::new(IntegralIterator::new(up, options.interval, unit_nanos)),
                other => return Err(transform_type_mismatch(name, other.kind())),
            };
            Ok(AnyIterator::Float(boxed))
        }
        "holt_winters" => {
            let h = args.first().and_then(CallArg::as_integer).unwrap_or(0).max(0) as usize;
            let m = args.get(1).and_then(CallArg::as_integer).unwrap_or(1).max(1) as usize;
            let boxed: crate::iter::FloatIter = match inner {
                AnyIterator::Float(up) => {
                    Box::new(HoltWintersIterator::new(up, options.interval, h, m, options.end_time))
                }
                AnyIterator::Integer(up) => {
                    Box::new(HoltWintersIterator::new(up, options.interval, h, m, options.end_time))
                }
                other => return Err(transform_type_mismatch(name, other.kind())),
            };
            Ok(AnyIterator::Float(boxed))
        }
        other => Err(ExecError::unsupported_function(other, "transform")),
    }
}

fn transform_type_mismatch(name: &str, found: PointKind) -> ExecError {
    ExecError::type_mismatch(format!("transform {name} is not defined over {found} input"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::BufferedIterator;
    use crate::point::{FloatPoint, Tags};
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};

    /// A fixed single-shard group backed by in-memory series, used to drive
    /// `select` end-to-end without a real storage engine.
    struct FixedShardGroup {
        series: RefCell<BTreeMap<String, Vec<FloatPoint>>>,
        field_kind: PointKind,
    }

    impl ShardGroup for FixedShardGroup {
        fn create_iterator(
            &self,
            measurement: &str,
            _options: &IteratorOptions,
        ) -> Result<AnyIterator, ExecError> {
            let points = self
                .series
                .borrow_mut()
                .remove(measurement)
                .unwrap_or_default();
            Ok(AnyIterator::Float(Box::new(BufferedIterator::new(points, true))))
        }

        fn field_dimensions(
            &self,
            _measurement: &str,
        ) -> Result<(BTreeMap<String, PointKind>, BTreeSet<String>), ExecError> {
            let mut fields = BTreeMap::new();
            fields.insert("value".to_string(), self.field_kind);
            Ok((fields, BTreeSet::new()))
        }

        fn map_type(&self, _measurement: &str, field_name: &str) -> MapType {
            if field_name == "value" {
                MapType::Point(self.field_kind)
            } else {
                MapType::Unknown
            }
        }

        fn close(&mut self) {}
    }

    struct FixedShardMapper {
        series: Vec<(String, Vec<FloatPoint>)>,
    }

    impl ShardMapper for FixedShardMapper {
        fn map_shards(
            &self,
            _sources: &[String],
            _time_range: (i64, i64),
            _select_options: &IteratorOptions,
        ) -> Result<Box<dyn ShardGroup>, ExecError> {
            Ok(Box::new(FixedShardGroup {
                series: RefCell::new(self.series.clone().into_iter().collect()),
                field_kind: PointKind::Float,
            }))
        }
    }

    fn point(time: i64, value: f64) -> FloatPoint {
        FloatPoint::new("cpu", Tags::empty(), time, value)
    }

    fn statement(projections: Vec<Projection>) -> Statement {
        Statement {
            projections,
            sources: vec!["cpu".to_string()],
            start_time: 0,
            end_time: 70,
            group_by_time: Some(10),
            group_by_tags: Vec::new(),
            fill: crate::options::Fill::Null,
            ascending: true,
            limit: None,
            offset: 0,
            slimit: None,
            soffset: 0,
        }
    }

    #[test]
    fn select_binds_one_iterator_per_projection_in_order() {
        let mapper = FixedShardMapper {
            series: vec![(
                "cpu".to_string(),
                vec![point(0, 1.0), point(11, 2.0), point(31, 3.0)],
            )],
        };
        let stmt = statement(vec![
            Projection {
                alias: None,
                expr: Expr::Call {
                    name: "min".to_string(),
                    args: vec![CallArg::Field("value".to_string())],
                },
            },
            Projection {
                alias: Some("m".to_string()),
                expr: Expr::Call {
                    name: "max".to_string(),
                    args: vec![CallArg::Field("value".to_string())],
                },
            },
        ]);
        let caller_options = IteratorOptions::default();
        let (mut iterators, columns) = select(&stmt, &mapper, &caller_options).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "min");
        assert_eq!(columns[1].name, "m");
        let mut emitted = 0;
        while iterators[0].next().unwrap().is_some() {
            emitted += 1;
        }
        assert!(emitted > 0);
        crate::iter::drain_iterators(&mut iterators).unwrap();
    }

    #[test]
    fn unknown_field_is_rejected_before_touching_the_shard_group() {
        let mapper = FixedShardMapper {
            series: vec![("cpu".to_string(), vec![point(0, 1.0)])],
        };
        let stmt = statement(vec![Projection {
            alias: None,
            expr: Expr::Call {
                name: "min".to_string(),
                args: vec![CallArg::Field("missing".to_string())],
            },
        }]);
        let caller_options = IteratorOptions::default();
        let err = select(&stmt, &mapper, &caller_options).unwrap_err();
        assert!(err.message.contains("missing"));
    }

    /// spec.md §8: `count` is in the associative set — counting across two
    /// shards must equal counting the union directly. `build_aggregate`
    /// merges each shard's raw per-source stream before the single
    /// `CallIterator` stage runs, so `CountReducer` sees every point exactly
    /// once regardless of how many sources contributed it (3 + 2 = 5).
    #[test]
    fn count_across_two_shards_sums_to_the_total_point_count() {
        let mapper = FixedShardMapper {
            series: vec![
                ("a".to_string(), vec![point(0, 1.0), point(1, 2.0), point(2, 3.0)]),
                ("b".to_string(), vec![point(0, 4.0), point(1, 5.0)]),
            ],
        };
        let stmt = Statement {
            projections: vec![Projection {
                alias: None,
                expr: Expr::Call {
                    name: "count".to_string(),
                    args: vec![CallArg::Field("value".to_string())],
                },
            }],
            sources: vec!["a".to_string(), "b".to_string()],
            start_time: 0,
            end_time: 10,
            group_by_time: None,
            group_by_tags: Vec::new(),
            fill: crate::options::Fill::Null,
            ascending: true,
            limit: None,
            offset: 0,
            slimit: None,
            soffset: 0,
        };
        let caller_options = IteratorOptions::default();
        let (mut iterators, _columns) = select(&stmt, &mapper, &caller_options).unwrap();
        let first = iterators[0].next().unwrap().unwrap();
        match first {
            crate::point::AnyPoint::Integer(p) => assert_eq!(p.value, 5),
            other => panic!("expected integer count point, got {other:?}"),
        }
        crate::iter::drain_iterators(&mut iterators).unwrap();
    }
}
