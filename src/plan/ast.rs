//! The minimal `SELECT` AST shape the planner consumes (spec.md §1 "the SQL
//! parser delivers an AST with expressions, sources, dimensions, time range,
//! and fill clause"). The parser itself is an external collaborator
//! (spec.md §1 Out of scope); this is only the seam the planner reads.

use crate::binary::BinaryOp;
use crate::options::Fill;

///
/// Statement
///
/// One parsed `SELECT`: a projection list over one or more measurements,
/// grouped/windowed/filled as declared.
///

#[derive(Clone, Debug)]
pub struct Statement {
    pub projections: Vec<Projection>,
    pub sources: Vec<String>,
    pub start_time: i64,
    pub end_time: i64,
    pub group_by_time: Option<i64>,
    pub group_by_tags: Vec<String>,
    pub fill: Fill,
    pub ascending: bool,
    pub limit: Option<usize>,
    pub offset: usize,
    pub slimit: Option<usize>,
    pub soffset: usize,
}

///
/// Projection
///
/// One projected column: an optional user alias plus the expression to
/// evaluate.
///

#[derive(Clone, Debug)]
pub struct Projection {
    pub alias: Option<String>,
    pub expr: Expr,
}

///
/// Expr
///
/// A projected expression (spec.md §4.7 step 1 "classify as raw, call,
/// selector-with-tags, or transform(call)").
///

#[derive(Clone, Debug)]
pub enum Expr {
    /// A bare field reference, e.g. `value`.
    Field(String),
    /// A call to a built-in aggregate/selector, e.g. `mean(value)` or
    /// `top(value, host, 2)`.
    Call { name: String, args: Vec<CallArg> },
    /// A transform wrapping an inner call or field, e.g.
    /// `derivative(mean(value), 1s)`.
    Transform {
        name: String,
        inner: Box<Expr>,
        args: Vec<CallArg>,
    },
    /// A binary arithmetic/bitwise expression over two sub-expressions.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// One call argument: a field/tag reference or a literal.
#[derive(Clone, Debug)]
pub enum CallArg {
    Field(String),
    Integer(i64),
    Float(f64),
}

impl CallArg {
    #[must_use]
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::Integer(_) | Self::Float(_) => None,
        }
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Float(_) | Self::Field(_) => None,
        }
    }
}
