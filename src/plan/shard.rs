//! The shard-mapper collaborator interface (spec.md §6 "Collaborator
//! interfaces (consumed)"). This crate never implements these traits; it
//! only calls them. Storage, sharding, and field-type resolution all live
//! on the other side of this seam (spec.md §1 Out of scope).

use crate::error::ExecError;
use crate::iter::AnyIterator;
use crate::options::IteratorOptions;
use crate::point::PointKind;
use std::collections::{BTreeMap, BTreeSet};

///
/// MapType
///
/// The per-field type classification `ShardGroup.MapType` returns
/// (spec.md §6): a concrete point kind, `Tag` for a dimension name, or
/// `Unknown` for anything the shard group cannot resolve.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MapType {
    Point(PointKind),
    Tag,
    Unknown,
}

///
/// IteratorCost
///
/// Opaque planning hint (spec.md §6 "opaque hints, optional"); this crate
/// does not do cost-based planning (spec.md §1 Non-goals) but still threads
/// the hook so a shard mapper can report it.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IteratorCost {
    pub num_series: u64,
    pub num_blocks: u64,
    pub block_size: u64,
}

///
/// ShardGroup
///
/// One source's worth of raw-iterator factory plus field/type metadata
/// (spec.md §6 `ShardGroup.*`).
///

pub trait ShardGroup {
    /// Construct a raw iterator for `measurement` under `options`
    /// (spec.md §6 `ShardGroup.CreateIterator`).
    fn create_iterator(
        &self,
        measurement: &str,
        options: &IteratorOptions,
    ) -> Result<AnyIterator, ExecError>;

    /// Opaque cost hint; not used for plan selection (spec.md §6
    /// `ShardGroup.IteratorCost`).
    fn iterator_cost(&self, _measurement: &str, _options: &IteratorOptions) -> Result<IteratorCost, ExecError> {
        Ok(IteratorCost::default())
    }

    /// Field name → type map, plus the set of dimension (tag) names
    /// (spec.md §6 `ShardGroup.FieldDimensions`).
    fn field_dimensions(
        &self,
        measurement: &str,
    ) -> Result<(BTreeMap<String, PointKind>, BTreeSet<String>), ExecError>;

    /// Resolve one field name's type (spec.md §6 `ShardGroup.MapType`).
    fn map_type(&self, measurement: &str, field_name: &str) -> MapType;

    /// Release any resources the shard group holds (spec.md §6
    /// `ShardGroup.Close`).
    fn close(&mut self);
}

///
/// ShardMapper
///
/// Resolves a set of sources plus a time range into one `ShardGroup`
/// (spec.md §6 `ShardMapper.MapShards`).
///

pub trait ShardMapper {
    fn map_shards(
        &self,
        sources: &[String],
        time_range: (i64, i64),
        select_options: &IteratorOptions,
    ) -> Result<Box<dyn ShardGroup>, ExecError>;
}
