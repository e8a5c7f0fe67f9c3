//! Point & tag model (spec.md §3).
//!
//! One point shape, generic over its scalar value type, is used for all four
//! point kinds (Float/Integer/String/Boolean) rather than four hand-written
//! structs, preferring one generic shape over near-duplicate concrete types
//! wherever the fields line up exactly.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

///
/// Tags
///
/// Canonicalized ordered set of tag key=value pairs. Ordering and equality
/// are defined on the concatenated `key=value` sequence (spec.md §6 "Tag
/// canonicalization").
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tags(Vec<(String, String)>);

impl Tags {
    /// Build a canonical tag set: sorted by key, first occurrence wins on a
    /// duplicate key.
    #[must_use]
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut seen = std::collections::BTreeMap::new();
        for (k, v) in pairs {
            seen.entry(k.into()).or_insert_with(|| v.into());
        }
        Self(seen.into_iter().collect())
    }

    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return a copy with `key` removed, used when a selector's tag-carry
    /// argument is promoted from grouping tag to an auxiliary value
    /// (spec.md §4.3).
    #[must_use]
    pub fn without(&self, key: &str) -> Self {
        Self(self.0.iter().filter(|(k, _)| k != key).cloned().collect())
    }

    /// Canonical `key=value,key=value` string used for ordering/hashing.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        let mut out = String::new();
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(k);
            out.push('=');
            out.push_str(v);
        }
        out
    }
}

impl Ord for Tags {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_string().cmp(&other.canonical_string())
    }
}

impl PartialOrd for Tags {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}

///
/// PointKind
///
/// The concrete scalar kind of a point, used for dispatch and for the
/// `<iterator type name>` slot in unsupported-function error messages
/// (spec.md §6).
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum PointKind {
    #[display("float")]
    Float,
    #[display("integer")]
    Integer,
    #[display("string")]
    String,
    #[display("boolean")]
    Boolean,
}

///
/// AuxValue
///
/// Dynamically-typed auxiliary cell (spec.md §9 "Aux field threading").
///

#[derive(Clone, Debug, PartialEq)]
pub enum AuxValue {
    Float(f64),
    Integer(i64),
    String(String),
    Boolean(bool),
    Nil,
}

impl AuxValue {
    #[must_use]
    pub const fn kind(&self) -> Option<PointKind> {
        match self {
            Self::Float(_) => Some(PointKind::Float),
            Self::Integer(_) => Some(PointKind::Integer),
            Self::String(_) => Some(PointKind::String),
            Self::Boolean(_) => Some(PointKind::Boolean),
            Self::Nil => None,
        }
    }
}

///
/// Point
///
/// One timestamped, typed value. Generic over the scalar `value` type; the
/// four point kinds instantiate this with `f64`, `i64`, `String`, `bool`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Point<V> {
    pub name: String,
    pub tags: Tags,
    pub time: i64,
    pub value: V,
    pub nil: bool,
    pub aux: Vec<AuxValue>,
    /// Number of raw points that contributed to this point; 0 = raw.
    pub aggregated: u32,
}

impl<V> Point<V> {
    #[must_use]
    pub fn new(name: impl Into<String>, tags: Tags, time: i64, value: V) -> Self {
        Self {
            name: name.into(),
            tags,
            time,
            value,
            nil: false,
            aux: Vec::new(),
            aggregated: 0,
        }
    }

    #[must_use]
    pub fn nil_at(name: impl Into<String>, tags: Tags, time: i64, value: V) -> Self {
        Self {
            nil: true,
            ..Self::new(name, tags, time, value)
        }
    }

    #[must_use]
    pub fn with_aggregated(mut self, count: u32) -> Self {
        self.aggregated = count;
        self
    }

    #[must_use]
    pub fn with_aux(mut self, aux: Vec<AuxValue>) -> Self {
        self.aux = aux;
        self
    }

    /// The `(name, tags, time)` ordering key shared by every iterator
    /// (spec.md invariant: "points are strictly ordered by (name asc, tags
    /// asc lex, time asc|desc)").
    #[must_use]
    pub fn order_key(&self) -> (&str, &Tags, i64) {
        (&self.name, &self.tags, self.time)
    }

    /// Whether `self` and `other` share a series identity, i.e. the same
    /// `(name, tags)` under the active dimensions.
    #[must_use]
    pub fn same_series<W>(&self, other: &Point<W>) -> bool {
        self.name == other.name && self.tags == other.tags
    }
}

pub type FloatPoint = Point<f64>;
pub type IntegerPoint = Point<i64>;
pub type StringPoint = Point<String>;
pub type BooleanPoint = Point<bool>;

///
/// AnyPoint
///
/// The generic abstract point form named by spec.md §3: carries one of the
/// four concrete point kinds.
///

#[derive(Clone, Debug, PartialEq)]
pub enum AnyPoint {
    Float(FloatPoint),
    Integer(IntegerPoint),
    String(StringPoint),
    Boolean(BooleanPoint),
}

impl AnyPoint {
    #[must_use]
    pub const fn kind(&self) -> PointKind {
        match self {
            Self::Float(_) => PointKind::Float,
            Self::Integer(_) => PointKind::Integer,
            Self::String(_) => PointKind::String,
            Self::Boolean(_) => PointKind::Boolean,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Float(p) => &p.name,
            Self::Integer(p) => &p.name,
            Self::String(p) => &p.name,
            Self::Boolean(p) => &p.name,
        }
    }

    #[must_use]
    pub fn tags(&self) -> &Tags {
        match self {
            Self::Float(p) => &p.tags,
            Self::Integer(p) => &p.tags,
            Self::String(p) => &p.tags,
            Self::Boolean(p) => &p.tags,
        }
    }

    #[must_use]
    pub const fn time(&self) -> i64 {
        match self {
            Self::Float(p) => p.time,
            Self::Integer(p) => p.time,
            Self::String(p) => p.time,
            Self::Boolean(p) => p.time,
        }
    }

    #[must_use]
    pub const fn nil(&self) -> bool {
        match self {
            Self::Float(p) => p.nil,
            Self::Integer(p) => p.nil,
            Self::String(p) => p.nil,
            Self::Boolean(p) => p.nil,
        }
    }
}

/// Compare two `(name, tags, time)` order keys under the declared direction
/// (spec.md invariant: "(name asc, tags asc lex, time asc|desc per
/// options.ascending)"). Name and tags are always ascending; only the time
/// component flips with `ascending`.
#[must_use]
pub fn compare_order_key(
    a: (&str, &Tags, i64),
    b: (&str, &Tags, i64),
    ascending: bool,
) -> Ordering {
    a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)).then_with(|| {
        let time_ord = a.2.cmp(&b.2);
        if ascending {
            time_ord
        } else {
            time_ord.reverse()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_canonicalize_sorted_and_deduped() {
        let tags = Tags::new([("host", "A"), ("region", "us"), ("host", "B")]);
        assert_eq!(tags.canonical_string(), "host=A,region=us");
    }

    #[test]
    fn tags_ordering_is_lexicographic_on_canonical_string() {
        let a = Tags::new([("host", "A")]);
        let b = Tags::new([("host", "B")]);
        assert!(a < b);
    }

    #[test]
    fn without_drops_only_named_key() {
        let tags = Tags::new([("host", "A"), ("region", "us")]);
        let dropped = tags.without("host");
        assert_eq!(dropped.canonical_string(), "region=us");
    }

    #[test]
    fn point_order_key_reflects_name_tags_time() {
        let p = Point::new("cpu", Tags::new([("host", "A")]), 10, 1.0_f64);
        let (name, tags, time) = p.order_key();
        assert_eq!(name, "cpu");
        assert_eq!(tags.canonical_string(), "host=A");
        assert_eq!(time, 10);
    }

    #[test]
    fn compare_order_key_flips_only_time_on_descending() {
        let tags = Tags::new([("host", "A")]);
        let earlier = ("cpu", &tags, 0_i64);
        let later = ("cpu", &tags, 10_i64);
        assert_eq!(compare_order_key(earlier, later, true), Ordering::Less);
        assert_eq!(compare_order_key(earlier, later, false), Ordering::Greater);
    }
}
