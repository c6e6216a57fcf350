//! Subscriptions of component properties to tree paths.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use flowdown_foundation::{Path, SpliceOp, Value};
use tracing::warn;

use crate::component::{ComponentRef, same_component};
use crate::metadata::PropertyMeta;

/// A change as seen by one binding, with the path rebased onto the local
/// property name.
#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    /// The bound value was replaced as a whole.
    Replace {
        /// Local property path.
        path: String,
        /// The new value.
        value: Value,
    },
    /// A value inside the bound value was replaced.
    Nested {
        /// Local path of the replaced value.
        path: String,
        /// The new value.
        value: Value,
    },
    /// A sequence at or inside the bound value was spliced.
    Splices {
        /// Local path of the spliced sequence.
        path: String,
        /// The sequence after the splice.
        value: Value,
        /// Edits in application order.
        splices: Vec<SpliceOp>,
    },
}

impl Update {
    /// Returns the local path the update targets.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Replace { path, .. } | Self::Nested { path, .. } | Self::Splices { path, .. } => {
                path
            }
        }
    }

    /// Returns the value written at the local path.
    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            Self::Replace { value, .. }
            | Self::Nested { value, .. }
            | Self::Splices { value, .. } => value,
        }
    }
}

/// Callback invoked for each update delivered to a binding.
pub type UpdateFn = Rc<dyn Fn(&ComponentRef, &Update)>;

/// One property of one component subscribed to one tree path.
#[derive(Clone)]
pub struct Binding {
    component: ComponentRef,
    name: Arc<str>,
    property: PropertyMeta,
    path: Path,
    callback: UpdateFn,
    active: Rc<Cell<bool>>,
}

impl Binding {
    /// Creates a binding that writes updates into the local property and
    /// fires the component's notification hooks.
    #[must_use]
    pub fn new(
        component: ComponentRef,
        name: impl Into<Arc<str>>,
        property: PropertyMeta,
        path: Path,
    ) -> Self {
        Self::with_callback(component, name, property, path, apply_update)
    }

    /// Creates a binding with a custom update callback.
    #[must_use]
    pub fn with_callback(
        component: ComponentRef,
        name: impl Into<Arc<str>>,
        property: PropertyMeta,
        path: Path,
        callback: impl Fn(&ComponentRef, &Update) + 'static,
    ) -> Self {
        Self {
            component,
            name: name.into(),
            property,
            path,
            callback: Rc::new(callback),
            active: Rc::new(Cell::new(true)),
        }
    }

    /// Returns the bound component.
    #[must_use]
    pub fn component(&self) -> &ComponentRef {
        &self.component
    }

    /// Returns the local property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declaration the binding was created from.
    #[must_use]
    pub fn property(&self) -> &PropertyMeta {
        &self.property
    }

    /// Returns the absolute tree path the binding listens on.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the bound property declares an ordered sequence.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.property.is_sequence()
    }

    /// Returns true until the binding is unregistered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Returns true if the binding belongs to `component`.
    #[must_use]
    pub fn belongs_to(&self, component: &ComponentRef) -> bool {
        same_component(&self.component, component)
    }

    /// Delivers an update to the callback.
    pub fn deliver(&self, update: &Update) {
        (self.callback)(&self.component, update);
    }

    pub(crate) fn deactivate(&self) {
        self.active.set(false);
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("active", &self.active.get())
            .finish_non_exhaustive()
    }
}

/// The default update behavior: write the local property, then notify.
///
/// A component that is already borrowed (an update arriving from inside its
/// own hook) is skipped.
pub fn apply_update(component: &ComponentRef, update: &Update) {
    let Ok(mut component) = component.try_borrow_mut() else {
        warn!(path = update.path(), "component busy, update skipped");
        return;
    };
    if let Err(error) = component.set(update.path(), update.value().clone()) {
        warn!(path = update.path(), %error, "could not write bound property");
        return;
    }
    match update {
        Update::Splices { path, splices, .. } => component.notify_splices(path, splices),
        Update::Replace { path, .. } | Update::Nested { path, .. } => component.notify_path(path),
    }
}
