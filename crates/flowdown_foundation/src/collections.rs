//! Persistent containers for the state tree.
//!
//! [`Seq`] and [`Fields`] wrap `im`'s persistent vector and ordered map. The
//! tree is rebuilt along the written path on every change, so untouched
//! siblings are shared between the old and the new tree.
//!
//! Every sequence edit also reports the [`SpliceOp`] that describes it, so
//! the store can emit its change record without diffing.

use std::fmt;
use std::sync::Arc;

use crate::change::SpliceOp;
use crate::value::Value;

/// An ordered sequence of values.
#[derive(Clone, Default, PartialEq)]
pub struct Seq(im::Vector<Value>);

impl Seq {
    /// Creates an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self(im::Vector::new())
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the sequence has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Iterates the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// Returns a copy with the element at `index` replaced, or `None` past
    /// the end. Replacing never grows a sequence.
    #[must_use]
    pub fn replace(&self, index: usize, value: Value) -> Option<Self> {
        (index < self.len()).then(|| Self(self.0.update(index, value)))
    }

    /// Replaces `remove` elements at `start` with `items`.
    ///
    /// `start` is clamped to the length and `remove` to what follows
    /// `start`. Returns the new sequence, the edit as it was applied, and the
    /// removed elements.
    #[must_use]
    pub fn splice(
        &self,
        start: usize,
        remove: usize,
        items: impl IntoIterator<Item = Value>,
    ) -> (Self, SpliceOp, Vec<Value>) {
        let start = start.min(self.len());
        let remove = remove.min(self.len() - start);

        let mut head = self.0.clone();
        let mut removed = head.split_off(start);
        let tail = removed.split_off(remove);
        let before = head.len();
        head.extend(items);
        let added = head.len() - before;
        head.append(tail);

        let op = SpliceOp::new(start, remove, added);
        (Self(head), op, removed.into_iter().collect())
    }

    /// Appends an element. Returns the new length.
    #[must_use]
    pub fn push(&self, item: Value) -> (Self, SpliceOp, usize) {
        let (next, op, _) = self.splice(self.len(), 0, [item]);
        let len = next.len();
        (next, op, len)
    }

    /// Prepends an element. Returns the new length.
    #[must_use]
    pub fn unshift(&self, item: Value) -> (Self, SpliceOp, usize) {
        let (next, op, _) = self.splice(0, 0, [item]);
        let len = next.len();
        (next, op, len)
    }

    /// Removes the last element. On an empty sequence the op is empty.
    #[must_use]
    pub fn pop(&self) -> (Self, SpliceOp, Option<Value>) {
        let (next, op, mut removed) = self.splice(self.len().saturating_sub(1), 1, []);
        (next, op, removed.pop())
    }

    /// Removes the first element. On an empty sequence the op is empty.
    #[must_use]
    pub fn shift(&self) -> (Self, SpliceOp, Option<Value>) {
        let (next, op, mut removed) = self.splice(0, 1, []);
        (next, op, removed.pop())
    }
}

impl fmt::Debug for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl FromIterator<Value> for Seq {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Seq {
    type Item = &'a Value;
    type IntoIter = im::vector::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// String-keyed fields of a map value.
///
/// Keys iterate in sorted order so display and serialization of a tree are
/// deterministic.
#[derive(Clone, Default, PartialEq)]
pub struct Fields(im::OrdMap<Arc<str>, Value>);

impl Fields {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self(im::OrdMap::new())
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up a field by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a copy with `key` set to `value`, adding the key if needed.
    #[must_use]
    pub fn with(&self, key: impl Into<Arc<str>>, value: Value) -> Self {
        Self(self.0.update(key.into(), value))
    }

    /// Iterates fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.0.iter()
    }

    /// Iterates keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|key| &**key)
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<Arc<str>>> FromIterator<(K, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}
