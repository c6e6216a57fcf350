//! State path notation and change matching.
//!
//! Every location in a store's tree is named by a dot-delimited path rooted
//! at `state`, e.g. `state.todos.3.title`. Sequence elements are addressed by
//! their decimal index, map entries by key.
//!
//! [`classify`] decides how a [`ChangeRecord`] relates to a bound path:
//!
//! | relation      | test (first match wins)                          | delivery               |
//! |---------------|--------------------------------------------------|------------------------|
//! | exact         | set at `P`                                       | wholesale replace      |
//! | splice        | splice of `P` or of a sequence inside `P`        | splices on local path  |
//! | length only   | set at `P.length` on a sequence binding          | nothing                |
//! | descendant    | set strictly inside `P`                          | nested update          |
//! | ancestor      | change strictly above `P`                        | re-read `P`, replace   |
//! | unrelated     | anything else                                    | nothing                |

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::change::ChangeRecord;
use crate::error::{Error, Result};

/// An absolute, dot-delimited location in a state tree.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Arc<str>);

impl Path {
    /// The segment every path starts with.
    pub const ROOT: &'static str = "state";

    /// Returns the root path, naming the whole tree.
    #[must_use]
    pub fn root() -> Self {
        Self(Self::ROOT.into())
    }

    /// Parses an absolute path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the path is empty, has an empty segment, or
    /// does not start at the root.
    pub fn parse(path: &str) -> Result<Self> {
        let mut segments = path.split('.');
        if segments.next() != Some(Self::ROOT) || segments.any(str::is_empty) {
            return Err(Error::invalid_path(path));
        }
        Ok(Self(path.into()))
    }

    /// Builds an absolute path from a path relative to the root, as written
    /// in a `link_state` declaration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the relative path is empty or has an empty
    /// segment.
    pub fn from_link(relative: &str) -> Result<Self> {
        if relative.is_empty() {
            return Err(Error::invalid_path(relative));
        }
        Self::parse(&format!("{}.{relative}", Self::ROOT))
    }

    /// Builds an absolute path from a relative one without validating it.
    ///
    /// An empty relative path yields the root.
    #[must_use]
    pub fn state(relative: &str) -> Self {
        if relative.is_empty() {
            Self::root()
        } else {
            Self(format!("{}.{relative}", Self::ROOT).into())
        }
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this path names the whole tree.
    #[must_use]
    pub fn is_root(&self) -> bool {
        &*self.0 == Self::ROOT
    }

    /// Returns the segments below the root, in order.
    #[must_use]
    pub fn tree_segments(&self) -> Vec<&str> {
        self.0.split('.').skip(1).collect()
    }

    /// Returns the path of a child of this path.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}.{segment}", self.0).into())
    }

    /// Returns the parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| Self(parent.into()))
    }

    /// Returns the part of this path below `ancestor` if this path lies
    /// strictly inside it.
    ///
    /// The test is segment-aware: `state.ab` is not inside `state.a`.
    #[must_use]
    pub fn tail_under<'a>(&'a self, ancestor: &Path) -> Option<&'a str> {
        self.0
            .strip_prefix(&*ancestor.0)
            .and_then(|rest| rest.strip_prefix('.'))
    }

    /// Returns true if this path lies strictly inside `ancestor`.
    #[must_use]
    pub fn is_under(&self, ancestor: &Path) -> bool {
        self.tail_under(ancestor).is_some()
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self.0)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// =============================================================================
// Matching
// =============================================================================

/// How a change record relates to a bound path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathMatch<'a> {
    /// The bound value itself was replaced.
    Exact,
    /// The bound sequence, or a sequence inside the bound value, was spliced.
    /// `tail` locates the spliced sequence below the bound path (empty when it
    /// is the bound value).
    Splice {
        /// Location of the spliced sequence relative to the bound path.
        tail: &'a str,
    },
    /// The length of a bound sequence changed as a side effect of a splice.
    LengthOnly,
    /// A value strictly inside the bound value was replaced.
    Descendant {
        /// Location of the replaced value relative to the bound path.
        tail: &'a str,
    },
    /// A value above the bound path was replaced or spliced, so the bound
    /// value must be re-read.
    Ancestor,
    /// The change does not touch the bound value.
    Unrelated,
}

impl PathMatch<'_> {
    /// Returns true if the change must be delivered to the binding.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        !matches!(self, Self::LengthOnly | Self::Unrelated)
    }
}

/// Classifies `record` against a binding on `bound`.
///
/// `sequence` states whether the binding declares an ordered sequence, which
/// enables suppression of `length` records.
#[must_use]
pub fn classify<'a>(bound: &Path, sequence: bool, record: &'a ChangeRecord) -> PathMatch<'a> {
    match record {
        ChangeRecord::Set { path, .. } => {
            if path == bound {
                PathMatch::Exact
            } else if let Some(tail) = path.tail_under(bound) {
                if sequence && tail == "length" {
                    PathMatch::LengthOnly
                } else {
                    PathMatch::Descendant { tail }
                }
            } else if bound.is_under(path) {
                PathMatch::Ancestor
            } else {
                PathMatch::Unrelated
            }
        }
        ChangeRecord::Splice { path, .. } => {
            if path == bound {
                PathMatch::Splice { tail: "" }
            } else if let Some(tail) = path.tail_under(bound) {
                PathMatch::Splice { tail }
            } else if bound.is_under(path) {
                PathMatch::Ancestor
            } else {
                PathMatch::Unrelated
            }
        }
    }
}

/// Replaces the bound-path prefix of a change with a local property name.
#[must_use]
pub fn rebase(name: &str, tail: &str) -> String {
    if tail.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{tail}")
    }
}
