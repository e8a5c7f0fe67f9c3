//! Module: binary
//! Responsibility: point-wise arithmetic/bitwise evaluation across two
//! co-ordered streams, or across two `aux` cells of a single stream
//! (spec.md §4.6).
//! Does not own: operand alignment beyond a positional zip — the upstreams
//! are assumed already co-ordered on `(name, tags, time)` by the planner;
//! the aux-cell variant is a single source read positionally, not a join.
//! Boundary: dispatches on `AnyIterator` kind pairs the same way
//! `call::new_call_iterator` dispatches on `(CallFunction, AnyIterator)`.

use crate::error::ExecError;
use crate::iter::{AnyIterator, BoxIter, PointIter};
use crate::obs::IteratorStats;
use crate::point::{AuxValue, Point};

///
/// BinaryOp
///
/// The seven operators spec.md §4.6 names. Arithmetic and bitwise are
/// mutually exclusive over the same operand-kind space.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
        }
    }
}

fn apply_arith_f64(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            unreachable!("bitwise ops never dispatch to the float path")
        }
    }
}

fn apply_arith_i64(op: BinaryOp, a: i64, b: i64) -> i64 {
    match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Div => unreachable!("integer division always promotes to float"),
    }
}

fn apply_bitwise_bool(op: BinaryOp, a: bool, b: bool) -> bool {
    match op {
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        _ => unreachable!("only bitwise ops dispatch to the boolean path"),
    }
}

///
/// ZipBinaryIterator
///
/// Walks two upstreams in lockstep, producing one output point per pulled
/// pair. Nil propagates if either side is nil (spec.md §4.6); otherwise
/// `combine` computes the value.
///

struct ZipBinaryIterator<L, R, O> {
    left: BoxIter<L>,
    right: BoxIter<R>,
    combine: Box<dyn Fn(&L, &R) -> (O, bool) + Send>,
    stats: IteratorStats,
    closed: bool,
}

impl<L, R, O> ZipBinaryIterator<L, R, O> {
    fn new(left: BoxIter<L>, right: BoxIter<R>, combine: Box<dyn Fn(&L, &R) -> (O, bool) + Send>) -> Self {
        Self {
            left,
            right,
            combine,
            stats: IteratorStats::new(),
            closed: false,
        }
    }
}

impl<L, R, O: Default> PointIter<O> for ZipBinaryIterator<L, R, O> {
    fn next(&mut self) -> Result<Option<Point<O>>, ExecError> {
        if self.closed {
            return Ok(None);
        }
        let Some(lp) = self.left.next()? else { return Ok(None) };
        let Some(rp) = self.right.next()? else { return Ok(None) };
        self.stats.record_scanned(1);
        let (value, computed_nil) = (self.combine)(&lp.value, &rp.value);
        let nil = lp.nil || rp.nil || computed_nil;
        let value = if nil { O::default() } else { value };
        self.stats.record_emitted(1);
        let mut out = Point::new(lp.name, lp.tags, lp.time, value);
        out.nil = nil;
        Ok(Some(out))
    }

    fn stats(&self) -> IteratorStats {
        let mut total = self.stats;
        total.absorb(self.left.stats());
        total.absorb(self.right.stats());
        total
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.left.close();
        self.right.close();
        self.closed = true;
    }
}

fn boxed_float<L: 'static, R: 'static>(it: ZipBinaryIterator<L, R, f64>) -> AnyIterator {
    let boxed: BoxIter<f64> = Box::new(it);
    AnyIterator::Float(boxed)
}

fn boxed_integer(it: ZipBinaryIterator<i64, i64, i64>) -> AnyIterator {
    let boxed: BoxIter<i64> = Box::new(it);
    AnyIterator::Integer(boxed)
}

fn boxed_integer_as_float(it: ZipBinaryIterator<i64, i64, f64>) -> AnyIterator {
    let boxed: BoxIter<f64> = Box::new(it);
    AnyIterator::Float(boxed)
}

fn boxed_boolean(it: ZipBinaryIterator<bool, bool, bool>) -> AnyIterator {
    let boxed: BoxIter<bool> = Box::new(it);
    AnyIterator::Boolean(boxed)
}

/// Build the binary-expression iterator over two co-ordered upstreams
/// (spec.md §4.6 type table). Returns a construction-time `ExecError` for
/// any operand-kind/operator combination the type table disallows.
pub fn new_binary_iterator(left: AnyIterator, right: AnyIterator, op: BinaryOp) -> Result<AnyIterator, ExecError> {
    use AnyIterator::{Boolean, Float, Integer};
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => match (left, right) {
            (Float(l), Float(r)) => Ok(boxed_float(ZipBinaryIterator::new(
                l,
                r,
                Box::new(move |a: &f64, b: &f64| (apply_arith_f64(op, *a, *b), false)),
            ))),
            (Float(l), Integer(r)) => Ok(boxed_float(ZipBinaryIterator::new(
                l,
                r,
                Box::new(move |a: &f64, b: &i64| (apply_arith_f64(op, *a, *b as f64), false)),
            ))),
            (Integer(l), Float(r)) => Ok(boxed_float(ZipBinaryIterator::new(
                l,
                r,
                Box::new(move |a: &i64, b: &f64| (apply_arith_f64(op, *a as f64, *b), false)),
            ))),
            (Integer(l), Integer(r)) => Ok(boxed_integer(ZipBinaryIterator::new(
                l,
                r,
                Box::new(move |a: &i64, b: &i64| (apply_arith_i64(op, *a, *b), false)),
            ))),
            (l, r) => Err(type_mismatch(op, &l, &r)),
        },
        BinaryOp::Div => match (left, right) {
            (Float(l), Float(r)) => Ok(boxed_float(ZipBinaryIterator::new(
                l,
                r,
                Box::new(|a: &f64, b: &f64| (a / b, false)),
            ))),
            (Float(l), Integer(r)) => Ok(boxed_float(ZipBinaryIterator::new(
                l,
                r,
                Box::new(|a: &f64, b: &i64| (a / (*b as f64), false)),
            ))),
            (Integer(l), Float(r)) => Ok(boxed_float(ZipBinaryIterator::new(
                l,
                r,
                Box::new(|a: &i64, b: &f64| ((*a as f64) / b, false)),
            ))),
            (Integer(l), Integer(r)) => Ok(boxed_integer_as_float(ZipBinaryIterator::new(
                l,
                r,
                Box::new(|a: &i64, b: &i64| {
                    if *b == 0 {
                        (0.0, true)
                    } else {
                        ((*a as f64) / (*b as f64), false)
                    }
                }),
            ))),
            (l, r) => Err(type_mismatch(op, &l, &r)),
        },
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => match (left, right) {
            (Integer(l), Integer(r)) => Ok(boxed_integer(ZipBinaryIterator::new(
                l,
                r,
                Box::new(move |a: &i64, b: &i64| (apply_arith_i64(op, *a, *b), false)),
            ))),
            (Boolean(l), Boolean(r)) => Ok(boxed_boolean(ZipBinaryIterator::new(
                l,
                r,
                Box::new(move |a: &bool, b: &bool| (apply_bitwise_bool(op, *a, *b), false)),
            ))),
            (l, r) => Err(type_mismatch(op, &l, &r)),
        },
    }
}

fn type_mismatch(op: BinaryOp, left: &AnyIterator, right: &AnyIterator) -> ExecError {
    ExecError::type_mismatch(format!(
        "binary operator {} is not defined over ({}, {})",
        op.symbol(),
        left.kind(),
        right.kind()
    ))
}

///
/// AuxBinaryIterator
///
/// The single-source variant: both operands are cells of the same point's
/// `aux` vector rather than two separate streams (spec.md §4.6 "not a
/// join"). Emits a `Float` point per upstream point, nil if either aux
/// cell is `Nil` or the source point itself is nil.
///

pub struct AuxBinaryIterator<V> {
    upstream: BoxIter<V>,
    left_index: usize,
    right_index: usize,
    op: BinaryOp,
    stats: IteratorStats,
    closed: bool,
}

impl<V> AuxBinaryIterator<V> {
    #[must_use]
    pub fn new(upstream: BoxIter<V>, left_index: usize, right_index: usize, op: BinaryOp) -> Self {
        Self {
            upstream,
            left_index,
            right_index,
            op,
            stats: IteratorStats::new(),
            closed: false,
        }
    }
}

/// Read an `AuxValue` as a float, for the numeric operators. `Nil`
/// propagates; `String`/`Boolean` aux cells are not valid arithmetic
/// operands (spec.md §4.6 operates over numeric/boolean kinds only) and
/// are treated as nil rather than rejected, since the aux vector's shape
/// is determined by the planner, not re-validated per point.
fn aux_as_f64(v: &AuxValue) -> (f64, bool) {
    match v {
        AuxValue::Float(f) => (*f, false),
        AuxValue::Integer(i) => (*i as f64, false),
        AuxValue::Boolean(b) => (if *b { 1.0 } else { 0.0 }, false),
        AuxValue::String(_) | AuxValue::Nil => (0.0, true),
    }
}

impl<V> PointIter<f64> for AuxBinaryIterator<V> {
    fn next(&mut self) -> Result<Option<Point<f64>>, ExecError> {
        if self.closed {
            return Ok(None);
        }
        let Some(point) = self.upstream.next()? else { return Ok(None) };
        self.stats.record_scanned(1);
        let left = point.aux.get(self.left_index).unwrap_or(&AuxValue::Nil);
        let right = point.aux.get(self.right_index).unwrap_or(&AuxValue::Nil);
        let (a, a_nil) = aux_as_f64(left);
        let (b, b_nil) = aux_as_f64(right);
        let nil = point.nil || a_nil || b_nil;
        let value = if nil { 0.0 } else { apply_arith_f64(self.op, a, b) };
        self.stats.record_emitted(1);
        let mut out = Point::new(point.name, point.tags, point.time, value);
        out.nil = nil;
        Ok(Some(out))
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
