//! Change records emitted by tree mutations.

use std::fmt;

use crate::path::Path;
use crate::value::Value;

/// One contiguous edit of an ordered sequence.
///
/// Only positions and counts are recorded; subscribers that need the new
/// elements re-read the sequence from the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpliceOp {
    /// Position of the first removed or inserted element.
    pub index: usize,
    /// Number of elements removed at `index`.
    pub removed_count: usize,
    /// Number of elements inserted at `index`.
    pub added_count: usize,
}

impl SpliceOp {
    /// Creates a splice operation.
    #[must_use]
    pub const fn new(index: usize, removed_count: usize, added_count: usize) -> Self {
        Self {
            index,
            removed_count,
            added_count,
        }
    }

    /// Returns true if the operation neither removes nor inserts anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.removed_count == 0 && self.added_count == 0
    }

    /// Returns the signed change in length caused by this operation.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn delta(&self) -> i64 {
        self.added_count as i64 - self.removed_count as i64
    }
}

/// Describes a single mutation of the state tree.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeRecord {
    /// The value at `path` was replaced.
    Set {
        /// Absolute path of the replaced value.
        path: Path,
        /// The new value.
        value: Value,
    },
    /// The sequence at `path` was spliced.
    Splice {
        /// Absolute path of the mutated sequence.
        path: Path,
        /// Edits in application order.
        splices: Vec<SpliceOp>,
    },
}

impl ChangeRecord {
    /// Creates a set record.
    #[must_use]
    pub fn set(path: Path, value: impl Into<Value>) -> Self {
        Self::Set {
            path,
            value: value.into(),
        }
    }

    /// Creates a splice record.
    #[must_use]
    pub fn splice(path: Path, splices: Vec<SpliceOp>) -> Self {
        Self::Splice { path, splices }
    }

    /// Returns the path of the replaced value or of the spliced sequence.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Set { path, .. } | Self::Splice { path, .. } => path,
        }
    }

    /// Returns true for splice records.
    #[must_use]
    pub const fn is_splice(&self) -> bool {
        matches!(self, Self::Splice { .. })
    }
}

impl fmt::Display for ChangeRecord {
    /// Formats the record in dotted notation: splice records carry a
    /// trailing `.splices` segment.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set { path, value } => write!(f, "{path} = {value}"),
            Self::Splice { path, splices } => {
                write!(f, "{path}.splices [")?;
                for (i, op) in splices.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(
                        f,
                        "@{} -{} +{}",
                        op.index, op.removed_count, op.added_count
                    )?;
                }
                write!(f, "]")
            }
        }
    }
}
