//! The live state tree of a store and its constrained mutation API.
//!
//! All writes go through [`StoreCore`], which applies the change to the
//! persistent tree, releases its borrow, and then hands exactly one
//! [`ChangeRecord`] to the propagation engine. Writes that change nothing
//! emit nothing.

use std::cell::{Cell, RefCell};

use flowdown_foundation::{
    ChangeRecord, Error, ErrorContext, Path, Result, Seq, SpliceOp, StoreId, Value,
};
use im::Vector;
use tracing::debug;

use crate::binding::Binding;
use crate::component::ComponentRef;
use crate::config::StoreConfig;
use crate::propagate::propagate;

/// Per-store state shared by handles, receivers, and binding callbacks.
pub(crate) struct StoreCore {
    id: StoreId,
    config: StoreConfig,
    initial: Value,
    tree: RefCell<Option<Value>>,
    bindings: RefCell<Vector<Binding>>,
    revision: Cell<u64>,
    delivering: Cell<Option<u64>>,
}

impl StoreCore {
    pub(crate) fn new(id: StoreId, config: StoreConfig, initial: Value) -> Self {
        Self {
            id,
            config,
            initial,
            tree: RefCell::new(None),
            bindings: RefCell::new(Vector::new()),
            revision: Cell::new(0),
            delivering: Cell::new(None),
        }
    }

    pub(crate) fn id(&self) -> StoreId {
        self.id
    }

    pub(crate) fn config(&self) -> &StoreConfig {
        &self.config
    }

    // =========================================================================
    // Record numbering
    // =========================================================================

    /// Numbers the next record and marks it as the one being delivered.
    ///
    /// Returns the record that was being delivered before, which must be
    /// handed back to [`Self::leave_record`] once delivery ends.
    pub(crate) fn enter_record(&self) -> Option<u64> {
        let revision = self.revision.get() + 1;
        self.revision.set(revision);
        self.delivering.replace(Some(revision))
    }

    pub(crate) fn leave_record(&self, outer: Option<u64>) {
        self.delivering.set(outer);
    }

    /// Number of the record currently being delivered, if any.
    pub(crate) fn delivering(&self) -> Option<u64> {
        self.delivering.get()
    }

    // =========================================================================
    // State owner
    // =========================================================================

    pub(crate) fn has_owner(&self) -> bool {
        self.tree.borrow().is_some()
    }

    /// Instantiates the live tree from the initial tree.
    pub(crate) fn attach_owner(&self) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        if tree.is_some() {
            return Err(Error::owner_already_attached(self.id));
        }
        *tree = Some(self.initial.clone());
        debug!(store = %self.id, "state owner attached");
        Ok(())
    }

    /// Returns the whole live tree.
    pub(crate) fn state(&self) -> Option<Value> {
        self.tree.borrow().clone()
    }

    /// Reads the value at `path` from the live tree.
    pub(crate) fn read(&self, path: &Path) -> Option<Value> {
        self.tree
            .borrow()
            .as_ref()
            .and_then(|tree| tree.get_in(path.tree_segments()).cloned())
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    pub(crate) fn register(&self, bindings: impl IntoIterator<Item = Binding>) {
        self.bindings.borrow_mut().extend(bindings);
    }

    /// Removes the bindings of `component`, or every binding for `None`.
    /// Removed bindings stop receiving deliveries already in flight.
    pub(crate) fn unregister(&self, component: Option<&ComponentRef>) -> usize {
        let mut bindings = self.bindings.borrow_mut();
        let (removed, kept): (Vector<Binding>, Vector<Binding>) = bindings
            .iter()
            .cloned()
            .partition(|binding| component.is_none_or(|c| binding.belongs_to(c)));
        for binding in &removed {
            binding.deactivate();
        }
        *bindings = kept;
        removed.len()
    }

    /// Returns the binding list as of now; later registrations do not affect
    /// the snapshot.
    pub(crate) fn snapshot(&self) -> Vector<Binding> {
        self.bindings.borrow().clone()
    }

    pub(crate) fn binding_count(&self) -> usize {
        self.bindings.borrow().len()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Replaces the value at `path`. Setting the root replaces the tree.
    pub(crate) fn set(&self, path: &Path, value: Value) -> Result<()> {
        let changed = {
            let mut tree = self.tree.borrow_mut();
            let current = tree
                .as_mut()
                .ok_or_else(|| Error::no_state_owner(self.id))?;
            let segments = path.tree_segments();
            if current.get_in(segments.iter().copied()) == Some(&value) {
                false
            } else {
                *current = current
                    .assoc_in(&segments, value.clone())
                    .map_err(|e| self.locate(e, path))?;
                true
            }
        };
        if changed {
            propagate(self, &ChangeRecord::set(path.clone(), value));
        }
        Ok(())
    }

    /// Replaces `remove` elements at `start` with `items` and returns the
    /// removed elements. Counts are clamped to the sequence.
    pub(crate) fn splice(
        &self,
        path: &Path,
        start: usize,
        remove: usize,
        items: Vec<Value>,
    ) -> Result<Vec<Value>> {
        self.edit_sequence(path, |seq| seq.splice(start, remove, items))
    }

    /// Appends an element and returns the new length.
    pub(crate) fn push(&self, path: &Path, item: Value) -> Result<usize> {
        self.edit_sequence(path, |seq| seq.push(item))
    }

    /// Prepends an element and returns the new length.
    pub(crate) fn unshift(&self, path: &Path, item: Value) -> Result<usize> {
        self.edit_sequence(path, |seq| seq.unshift(item))
    }

    /// Removes the last element. An empty sequence is left alone.
    pub(crate) fn pop(&self, path: &Path) -> Result<Option<Value>> {
        self.edit_sequence(path, Seq::pop)
    }

    /// Removes the first element. An empty sequence is left alone.
    pub(crate) fn shift(&self, path: &Path) -> Result<Option<Value>> {
        self.edit_sequence(path, Seq::shift)
    }

    fn edit_sequence<R>(
        &self,
        path: &Path,
        edit: impl FnOnce(&Seq) -> (Seq, SpliceOp, R),
    ) -> Result<R> {
        let (op, result) = {
            let mut tree = self.tree.borrow_mut();
            let current = tree
                .as_mut()
                .ok_or_else(|| Error::no_state_owner(self.id))?;
            let segments = path.tree_segments();
            let (next, (op, result)) = current
                .update_in(&segments, |node| {
                    let seq = node
                        .as_vec()
                        .ok_or_else(|| Error::not_a_sequence(path.as_str()))?;
                    let (seq, op, result) = edit(seq);
                    Ok((Value::Vec(seq), (op, result)))
                })
                .map_err(|e| self.locate(e, path))?;
            if !op.is_empty() {
                *current = next;
            }
            (op, result)
        };
        if !op.is_empty() {
            propagate(self, &ChangeRecord::splice(path.clone(), vec![op]));
        }
        Ok(result)
    }

    fn locate(&self, error: Error, path: &Path) -> Error {
        error.with_context(
            ErrorContext::new()
                .with_store(self.id)
                .with_path(path.as_str()),
        )
    }
}
