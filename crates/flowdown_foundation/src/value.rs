//! Core value type for the state tree.

use std::fmt;
use std::sync::Arc;

use crate::collections::{Fields, Seq};
use crate::error::{Error, Result};

/// A node of the state tree.
///
/// Values are immutable and cheaply cloneable (O(1) for every variant).
/// Writes rebuild only the spine from the root to the written node; all other
/// subtrees are shared with the previous tree.
#[derive(Clone, Default)]
pub enum Value {
    /// The nil value (an absent or unset value).
    #[default]
    Nil,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(Arc<str>),
    /// Ordered sequence.
    Vec(Seq),
    /// String-keyed mapping.
    Map(Fields),
}

impl Value {
    /// Creates an empty map value.
    #[must_use]
    pub fn object() -> Self {
        Self::Map(Fields::new())
    }

    /// Creates a map value from key-value pairs.
    #[must_use]
    pub fn from_entries<K, V, I>(entries: I) -> Self
    where
        K: Into<Arc<str>>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, Into::<Value>::into(v)))
                .collect(),
        )
    }

    /// Creates a sequence value from items.
    #[must_use]
    pub fn from_items<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::Vec(items.into_iter().map(Into::<Value>::into).collect())
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        if let Self::Int(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    /// Returns the float, if this is one.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        if let Self::Float(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    /// Returns either numeric variant as `f64`. Large integers lose
    /// precision.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        self.as_float().or_else(|| self.as_int().map(|n| n as f64))
    }

    /// Returns the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Returns the sequence, if this is one.
    #[must_use]
    pub const fn as_vec(&self) -> Option<&Seq> {
        if let Self::Vec(items) = self {
            Some(items)
        } else {
            None
        }
    }

    /// Returns the fields, if this is a map.
    #[must_use]
    pub const fn as_map(&self) -> Option<&Fields> {
        if let Self::Map(fields) = self {
            Some(fields)
        } else {
            None
        }
    }

    /// Returns the key form of this value, used to address a child.
    ///
    /// Integers and strings both normalise to a string so an index into a
    /// sequence and a key into a map compare the same way.
    #[must_use]
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Int(n) => Some(n.to_string()),
            Self::String(s) => Some(s.to_string()),
            _ => None,
        }
    }

    /// Returns the child addressed by a single path segment.
    ///
    /// Maps are addressed by key, sequences by decimal index.
    #[must_use]
    pub fn get(&self, segment: &str) -> Option<&Value> {
        match self {
            Self::Map(m) => m.get(segment),
            Self::Vec(v) => segment.parse::<usize>().ok().and_then(|i| v.get(i)),
            _ => None,
        }
    }

    /// Returns the descendant addressed by a sequence of segments.
    ///
    /// An empty sequence addresses `self`.
    #[must_use]
    pub fn get_in<'a, I>(&self, segments: I) -> Option<&Value>
    where
        I: IntoIterator<Item = &'a str>,
    {
        segments
            .into_iter()
            .try_fold(self, |node, segment| node.get(segment))
    }

    /// Returns a copy of this value with the child at `segment` replaced.
    ///
    /// Maps accept new keys. Sequences only accept an existing index; growing
    /// a sequence is a splice, not a set.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` for a sequence index past the end and
    /// `PathNotFound` when `self` is not a container or the segment is not an
    /// index.
    pub fn with_child(&self, segment: &str, child: Value) -> Result<Value> {
        match self {
            Self::Map(m) => Ok(Self::Map(m.with(segment, child))),
            Self::Vec(v) => {
                let index = segment
                    .parse::<usize>()
                    .map_err(|_| Error::path_not_found(segment))?;
                v.replace(index, child)
                    .map(Self::Vec)
                    .ok_or_else(|| Error::index_out_of_bounds(index, v.len()))
            }
            _ => Err(Error::path_not_found(segment)),
        }
    }

    /// Rebuilds this value with the descendant at `segments` transformed by `f`.
    ///
    /// `f` receives the current descendant and returns its replacement plus
    /// an arbitrary result that is handed back to the caller. Every segment
    /// must already exist.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` (with the relative path walked so far) when a
    /// segment is missing, or whatever `f` returns.
    pub fn update_in<R>(
        &self,
        segments: &[&str],
        f: impl FnOnce(&Value) -> Result<(Value, R)>,
    ) -> Result<(Value, R)> {
        self.update_in_at(segments, 0, f)
    }

    fn update_in_at<R>(
        &self,
        segments: &[&str],
        depth: usize,
        f: impl FnOnce(&Value) -> Result<(Value, R)>,
    ) -> Result<(Value, R)> {
        let Some(segment) = segments.get(depth) else {
            return f(self);
        };
        let child = self
            .get(segment)
            .ok_or_else(|| Error::path_not_found(segments[..=depth].join(".")))?;
        let (child, result) = child.update_in_at(segments, depth + 1, f)?;
        Ok((self.with_child(segment, child)?, result))
    }

    /// Returns a copy of this value with `value` stored at `segments`.
    ///
    /// Every segment but the last must exist; the last may name a new map key.
    /// An empty path replaces the whole value.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` or `IndexOutOfBounds` as described on
    /// [`Value::update_in`] and [`Value::with_child`].
    pub fn assoc_in(&self, segments: &[&str], value: Value) -> Result<Value> {
        let Some((last, parents)) = segments.split_last() else {
            return Ok(value);
        };
        self.update_in(parents, |parent| {
            Ok((parent.with_child(last, value)?, ()))
        })
        .map(|(root, ())| root)
    }
}

// Float equality is bitwise so that `Eq` stays reflexive (NaN == NaN).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Vec(a), Self::Vec(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Vec(items) => fmt::Debug::fmt(items, f),
            Self::Map(fields) => fmt::Debug::fmt(fields, f),
            scalar => fmt::Display::fmt(scalar, f),
        }
    }
}

/// Renders the tree as compact, JSON-like text for log lines.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Vec(items) => {
                f.write_str("[")?;
                write_separated(f, items.iter(), |f, item| write!(f, "{item}"))?;
                f.write_str("]")
            }
            Self::Map(fields) => {
                f.write_str("{")?;
                write_separated(f, fields.iter(), |f, (key, value)| write!(f, "{key}: {value}"))?;
                f.write_str("}")
            }
        }
    }
}

fn write_separated<T>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
    mut each: impl FnMut(&mut fmt::Formatter<'_>, T) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        each(f, item)?;
    }
    Ok(())
}

// Convenience From implementations

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Nil, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::from_items(v)
    }
}
