//! Query execution core for a time-series database: iterator algebra over
//! measurement/tag/field point streams (spec.md).
//!
//! The crate is organized the way the pipeline it implements is organized:
//! a narrow pull protocol (`iter`) over typed points (`point`), windowed
//! aggregation (`call`), selection (`selector`), sequential transforms
//! (`transform`), gap-filling (`fill`), binary expression evaluation
//! (`binary`), and finally the planner (`plan`) that stacks all of the above
//! into the iterator tree a `SELECT` statement describes.

// 1️⃣ Module declarations

pub mod binary;
pub mod call;
pub mod error;
pub mod fill;
pub mod iter;
pub mod obs;
pub mod options;
pub mod plan;
pub mod point;
pub mod selector;
pub mod transform;

// 2️⃣ Re-exports — the crate's public surface

pub use binary::{new_binary_iterator, BinaryOp};
pub use call::{new_call_iterator, CallFunction};
pub use error::{ExecError, ExecErrorClass, ExecErrorOrigin};
pub use fill::FillIterator;
pub use iter::{drain_iterators, AnyIterator, BooleanIter, FloatIter, IntegerIter, PointIter, StringIter};
pub use obs::IteratorStats;
pub use options::{parse_rfc3339_nanos, Fill, Interval, IteratorOptions, IteratorOptionsBuilder};
pub use plan::{select, Column, IteratorCost, MapType, ShardGroup, ShardMapper};
pub use point::{
    AnyPoint, AuxValue, BooleanPoint, FloatPoint, IntegerPoint, Point, PointKind, StringPoint, Tags,
};
pub use selector::{SelectorIterator, SelectorKind};
