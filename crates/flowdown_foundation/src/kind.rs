//! Declared value kinds for bound properties.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The kind a property declares for its bound value.
///
/// The kind is advisory: bindings never reject values of another kind.
/// It only changes how change records are interpreted; an `Array` binding
/// ignores the `length` records that accompany sequence growth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueKind {
    /// A mapping from string keys to values.
    Object,
    /// An ordered sequence.
    Array,
    /// A string.
    String,
    /// An integer or floating point number.
    Number,
    /// A boolean.
    Boolean,
    /// No declared kind.
    Any,
}

impl ValueKind {
    /// Returns the kind describing `value`.
    ///
    /// `Nil` has no kind of its own and reports `Any`.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Nil => Self::Any,
            Value::Bool(_) => Self::Boolean,
            Value::Int(_) | Value::Float(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Vec(_) => Self::Array,
            Value::Map(_) => Self::Object,
        }
    }

    /// Returns true if this kind is an ordered sequence.
    #[must_use]
    pub const fn is_sequence(self) -> bool {
        matches!(self, Self::Array)
    }

    /// Checks if a value is of this kind.
    ///
    /// `Any` accepts everything and every kind accepts `Nil`, which stands for
    /// a value that has not been set.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        matches!(self, Self::Any) || value.is_nil() || Self::of(value) == self
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Any => "any",
        };
        f.write_str(name)
    }
}
