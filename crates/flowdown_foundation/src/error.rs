//! Error types for the flowdown system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::id::StoreId;

/// Result type alias using flowdown's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for flowdown operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a store not found error.
    #[must_use]
    pub fn store_not_found(id: StoreId) -> Self {
        Self::new(ErrorKind::StoreNotFound(id))
    }

    /// Creates an error for a store that has no state owner yet.
    #[must_use]
    pub fn no_state_owner(id: StoreId) -> Self {
        Self::new(ErrorKind::NoStateOwner(id))
    }

    /// Creates an error for a second state owner on the same store.
    #[must_use]
    pub fn owner_already_attached(id: StoreId) -> Self {
        Self::new(ErrorKind::OwnerAlreadyAttached(id))
    }

    /// Creates a malformed binding declaration error.
    #[must_use]
    pub fn malformed_binding(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedBinding {
            property: property.into(),
            reason: reason.into(),
        })
    }

    /// Creates an error wrapping a failed mutator.
    #[must_use]
    pub fn mutator_failed(index: usize, source: Error) -> Self {
        Self::new(ErrorKind::MutatorFailed {
            index,
            source: Box::new(source),
        })
    }

    /// Creates an invalid path error.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPath(path.into()))
    }

    /// Creates a path not found error.
    #[must_use]
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::PathNotFound(path.into()))
    }

    /// Creates an error for a sequence operation on a non-sequence value.
    #[must_use]
    pub fn not_a_sequence(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotASequence(path.into()))
    }

    /// Creates an index out of bounds error.
    #[must_use]
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::new(ErrorKind::IndexOutOfBounds { index, length })
    }

    /// Creates an error for an action a mutator refused to apply.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Rejected(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// No store is registered under this id.
    #[error("store not found: {0}")]
    StoreNotFound(StoreId),

    /// The store has no state owner, so there is no live tree.
    #[error("no state owner attached to {0}")]
    NoStateOwner(StoreId),

    /// A state owner is already attached to the store.
    #[error("state owner already attached to {0}")]
    OwnerAlreadyAttached(StoreId),

    /// A property declaration cannot be turned into a binding.
    #[error("malformed binding on property {property}: {reason}")]
    MalformedBinding {
        /// The declaring property.
        property: String,
        /// Why the declaration was rejected.
        reason: String,
    },

    /// A mutator returned an error while handling an action.
    #[error("mutator #{index} failed: {source}")]
    MutatorFailed {
        /// Registration index of the mutator.
        index: usize,
        /// The error the mutator returned.
        source: Box<Error>,
    },

    /// The path is not a well-formed state path.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// The path does not resolve to a value in the tree.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// A sequence operation targeted a value that is not a sequence.
    #[error("not a sequence: {0}")]
    NotASequence(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: usize,
        /// The actual length of the collection.
        length: usize,
    },

    /// A mutator refused the action.
    #[error("action rejected: {0}")]
    Rejected(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Store the failing operation ran against.
    pub store: Option<StoreId>,
    /// Absolute state path involved in the failure.
    pub path: Option<String>,
    /// Operations that were in flight, outermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store.
    #[must_use]
    pub fn with_store(mut self, store: StoreId) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the state path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(store) = self.store {
            write!(f, "in {store}")?;
        }
        if let Some(path) = &self.path {
            if self.store.is_some() {
                write!(f, " ")?;
            }
            write!(f, "at {path}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
