//! Selection bindings and index arithmetic.

use std::sync::Arc;

use flowdown_foundation::{Path, SpliceOp, Value};

/// Index value meaning "nothing selected".
pub const NO_SELECTION: i64 = -1;

/// Moves a selected index across a batch of splices.
///
/// Splices apply left to right, each against the index produced by the one
/// before. For a splice removing `r` and inserting `a` elements at `k`:
/// an index before `k` is unchanged, an index at or after `k + r` shifts by
/// `a - r`, and an index inside the removed range becomes [`NO_SELECTION`].
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn rebase_index(index: i64, splices: &[SpliceOp]) -> i64 {
    splices.iter().fold(index, |index, op| {
        let start = op.index as i64;
        let end = start + op.removed_count as i64;
        if index < start {
            index
        } else if index >= end {
            index + op.delta()
        } else {
            NO_SELECTION
        }
    })
}

/// Returns the element of `items` addressed by `index`.
///
/// Sequences are indexed by integer and maps by key, with both sides compared
/// as strings. Negative, out of range, and non-key indexes select `Nil`.
#[must_use]
pub fn select(items: &Value, index: &Value) -> Value {
    element_key(index)
        .and_then(|key| items.get(&key).cloned())
        .unwrap_or_default()
}

/// The key an index addresses. Negative integers address nothing, even in a
/// map that happens to hold such a key.
fn element_key(index: &Value) -> Option<String> {
    match index {
        Value::Int(n) if *n < 0 => None,
        index => index.as_key(),
    }
}

/// One `item = items[index]` relation declared by a component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Local property holding the items.
    pub items: Arc<str>,
    /// Local property holding the index.
    pub index: Arc<str>,
    /// Local property mirroring the selected element.
    pub item: Arc<str>,
    /// Tree path the index property is bound to.
    pub index_path: Path,
}

impl Selection {
    /// Returns the part of a local path below the selected element, if the
    /// path lies inside `items[index]`.
    ///
    /// `Some("")` means the element itself.
    #[must_use]
    pub fn element_tail<'a>(&self, local: &'a str, index: &Value) -> Option<&'a str> {
        let key = element_key(index)?;
        let below_items = local.strip_prefix(&*self.items)?.strip_prefix('.')?;
        let (first, rest) = below_items.split_once('.').unwrap_or((below_items, ""));
        (first == key).then_some(rest)
    }
}
