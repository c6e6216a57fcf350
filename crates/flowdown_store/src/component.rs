//! The host contract for bound components.
//!
//! A component owns a set of local properties addressed by dot paths
//! (`todos`, `todos.3.title`). The store writes into them through
//! [`Component::set`] and then fires one of the notification hooks so the
//! host can re-render.

use std::cell::RefCell;
use std::rc::Rc;

use flowdown_foundation::{Error, Result, SpliceOp, Value};

use crate::metadata::MetadataChain;

/// A component whose local properties can be bound to a store.
pub trait Component {
    /// Returns the property declarations of this component's type chain.
    fn declarations(&self) -> MetadataChain;

    /// Reads a local property path. Missing values read as `Nil`.
    fn get(&self, path: &str) -> Value;

    /// Writes a local property path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be written.
    fn set(&mut self, path: &str, value: Value) -> Result<()>;

    /// Called after a local property path was written.
    fn notify_path(&mut self, _path: &str) {}

    /// Called after a local sequence was spliced; `path` holds the fresh
    /// sequence.
    fn notify_splices(&mut self, _path: &str, _splices: &[SpliceOp]) {}
}

/// Shared handle to a component.
pub type ComponentRef = Rc<RefCell<dyn Component>>;

/// Returns true if both handles point at the same component.
#[must_use]
pub fn same_component(a: &ComponentRef, b: &ComponentRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Local properties stored as a persistent map.
///
/// Hosts that have no property system of their own can keep their local
/// state here and forward [`Component::get`] and [`Component::set`] to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyBag {
    root: Value,
}

impl Default for PropertyBag {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Value::object(),
        }
    }

    /// Builder method to seed a top-level property.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        if let Some(map) = self.root.as_map() {
            self.root = Value::Map(map.with(name, value.into()));
        }
        self
    }

    /// Reads a property path. Missing values read as `Nil`.
    #[must_use]
    pub fn get(&self, path: &str) -> Value {
        self.root
            .get_in(path.split('.'))
            .cloned()
            .unwrap_or_default()
    }

    /// Writes a property path. Every segment but the last must exist.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for an empty path, and `PathNotFound` or
    /// `IndexOutOfBounds` when an intermediate value is missing.
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        if path.is_empty() {
            return Err(Error::invalid_path(path));
        }
        let segments: Vec<&str> = path.split('.').collect();
        self.root = self.root.assoc_in(&segments, value)?;
        Ok(())
    }

    /// Returns every property as one map value.
    #[must_use]
    pub fn values(&self) -> &Value {
        &self.root
    }
}
