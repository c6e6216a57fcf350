//! Receiver and provider capabilities, and the binding resolver seam.
//!
//! A component that wants store data attaches through a [`StateReceiver`].
//! On attach, every [`BindingResolver`] of the store turns the component's
//! declarations into [`Binding`]s. The base resolver, [`LinkState`], binds
//! each `link_state` property; plugins add their own resolvers with
//! [`Store::use_plugin`](crate::Store::use_plugin).
//!
//! Exactly one [`StateProvider`] per store owns the live tree.

use std::rc::{Rc, Weak};
use std::sync::Arc;

use flowdown_foundation::{ChangeRecord, Error, Path, Result, StoreId, Value};
use tracing::debug;

use crate::binding::{Binding, Update};
use crate::component::ComponentRef;
use crate::dispatch::{DispatchOutcome, Mutator, ReplayReport};
use crate::metadata::{Properties, collect};
use crate::propagate::propagate;
use crate::registry::Store;
use crate::tree::StoreCore;

// =============================================================================
// Resolvers
// =============================================================================

/// Turns a component's declarations into bindings.
pub trait BindingResolver {
    /// Returns the bindings for `component`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedBinding` for a declaration the resolver cannot honor;
    /// the component is then not attached at all.
    fn resolve(
        &self,
        cx: &ResolveContext<'_>,
        component: &ComponentRef,
        properties: &Properties,
    ) -> Result<Vec<Binding>>;
}

/// What a resolver may use from the store.
pub struct ResolveContext<'a> {
    core: &'a Rc<StoreCore>,
}

impl<'a> ResolveContext<'a> {
    pub(crate) fn new(core: &'a Rc<StoreCore>) -> Self {
        Self { core }
    }

    /// Returns the id of the store being attached to.
    #[must_use]
    pub fn store_id(&self) -> StoreId {
        self.core.id()
    }

    /// Reads the live tree. Returns `None` before the state owner attaches.
    #[must_use]
    pub fn read(&self, path: &Path) -> Option<Value> {
        self.core.read(path)
    }

    /// Returns a write handle that binding callbacks can keep.
    #[must_use]
    pub fn writer(&self) -> TreeWriter {
        TreeWriter {
            store: self.core.id(),
            core: Rc::downgrade(self.core),
        }
    }
}

/// A weak write handle to a store's tree, for use inside binding callbacks.
#[derive(Clone, Debug)]
pub struct TreeWriter {
    store: StoreId,
    core: Weak<StoreCore>,
}

impl TreeWriter {
    /// Returns true if the store still exists and has a state owner.
    #[must_use]
    pub fn has_owner(&self) -> bool {
        self.core.upgrade().is_some_and(|core| core.has_owner())
    }

    /// Returns false once the store has been removed from its registry.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.core.strong_count() > 0
    }

    /// Reads the live tree.
    #[must_use]
    pub fn read(&self, path: &Path) -> Option<Value> {
        self.core.upgrade().and_then(|core| core.read(path))
    }

    /// Returns the store this writer belongs to.
    #[must_use]
    pub fn store_id(&self) -> StoreId {
        self.store
    }

    /// Number of the change record currently being delivered, if any.
    ///
    /// Records are numbered per store in emission order. Callbacks running
    /// for the same record observe the same number, even after one of them
    /// emitted (and finished delivering) a record of its own.
    #[must_use]
    pub fn current_record(&self) -> Option<u64> {
        self.core.upgrade().and_then(|core| core.delivering())
    }

    /// Replaces the value at `path`; the change propagates as usual.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store is gone, `NoStateOwner` before
    /// the owner attaches, and path errors as for a mutation.
    pub fn set(&self, path: &Path, value: Value) -> Result<()> {
        let core = self
            .core
            .upgrade()
            .ok_or_else(|| Error::store_not_found(self.store))?;
        core.set(path, value)
    }
}

/// The base resolver: binds every property that declares `link_state`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkState;

impl BindingResolver for LinkState {
    fn resolve(
        &self,
        _cx: &ResolveContext<'_>,
        component: &ComponentRef,
        properties: &Properties,
    ) -> Result<Vec<Binding>> {
        properties
            .iter()
            .filter_map(|(name, meta)| meta.link_state.as_ref().map(|link| (name, meta, link)))
            .map(|(name, meta, link)| {
                let path = Path::from_link(link).map_err(|_| {
                    Error::malformed_binding(&**name, format!("invalid link_state {link:?}"))
                })?;
                Ok(Binding::new(
                    Rc::clone(component),
                    Arc::clone(name),
                    meta.clone(),
                    path,
                ))
            })
            .collect()
    }
}

// =============================================================================
// Receiver
// =============================================================================

/// Capability to attach components to a store and dispatch actions.
pub struct StateReceiver<A> {
    store: Store<A>,
}

impl<A> Clone for StateReceiver<A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<A: 'static> StateReceiver<A> {
    pub(crate) fn new(store: Store<A>) -> Self {
        Self { store }
    }

    /// Returns the id of the store.
    #[must_use]
    pub fn store_id(&self) -> StoreId {
        self.store.id()
    }

    /// Binds `component` to the store and returns the number of bindings.
    ///
    /// Every resolver runs before anything is registered, so a malformed
    /// declaration leaves the store untouched. If the state owner is
    /// attached, each new binding is primed with its current value.
    ///
    /// # Errors
    ///
    /// Returns `MalformedBinding` if a declaration cannot be honored or the
    /// component is mutably borrowed, and `StoreNotFound` if the store is gone.
    pub fn attach(&self, component: &ComponentRef) -> Result<usize> {
        let cell = self.store.cell()?;
        let properties = {
            let component = component.try_borrow().map_err(|_| {
                Error::malformed_binding("<component>", "component is mutably borrowed")
            })?;
            collect(&component.declarations())
        };

        let cx = ResolveContext::new(&cell.core);
        let mut bindings = Vec::new();
        for resolver in cell.resolvers() {
            bindings.extend(resolver.resolve(&cx, component, &properties)?);
        }

        let count = bindings.len();
        cell.core.register(bindings.iter().cloned());
        debug!(store = %self.store.id(), bindings = count, "component attached");

        if cell.core.has_owner() {
            for binding in bindings.iter().filter(|b| b.is_active()) {
                binding.deliver(&Update::Replace {
                    path: binding.name().to_string(),
                    value: cell.core.read(binding.path()).unwrap_or_default(),
                });
            }
        }
        Ok(count)
    }

    /// Removes every binding of `component` and returns how many there were.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store is gone.
    pub fn detach(&self, component: &ComponentRef) -> Result<usize> {
        let removed = self
            .store
            .registry()
            .unregister_bindings(self.store.id(), Some(component))?;
        debug!(store = %self.store.id(), bindings = removed, "component detached");
        Ok(removed)
    }

    /// Returns the live tree.
    ///
    /// # Errors
    ///
    /// Returns `NoStateOwner` before the state owner attaches.
    pub fn get_state(&self) -> Result<Value> {
        self.store.get_state()
    }

    /// Dispatches an action to the store.
    ///
    /// # Errors
    ///
    /// See [`Registry::dispatch`](crate::Registry::dispatch).
    pub fn dispatch(&self, action: A) -> Result<DispatchOutcome> {
        self.store.dispatch(action)
    }
}

// =============================================================================
// Provider
// =============================================================================

/// The state owner of a store.
#[derive(Debug)]
pub struct StateProvider<A> {
    store: Store<A>,
    report: ReplayReport,
}

impl<A: 'static> StateProvider<A> {
    pub(crate) fn attach(store: Store<A>) -> Result<Self> {
        let cell = store.cell()?;
        cell.core.attach_owner()?;

        if cell.core.config().broadcast_on_provide {
            if let Some(tree) = cell.core.state() {
                let delivered = propagate(&cell.core, &ChangeRecord::set(Path::root(), tree));
                debug!(store = %store.id(), delivered, "broadcast initial tree");
            }
        }

        let report = cell.replay();
        Ok(Self { store, report })
    }

    /// Returns the id of the store.
    #[must_use]
    pub fn store_id(&self) -> StoreId {
        self.store.id()
    }

    /// Returns what happened to the actions queued before the owner attached.
    #[must_use]
    pub fn replay_report(&self) -> &ReplayReport {
        &self.report
    }

    /// Adds a mutator to the store.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store is gone.
    pub fn add_mutator(&self, mutator: impl Mutator<A> + 'static) -> Result<()> {
        self.store.add_mutator(mutator)
    }

    /// Returns the live tree.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store is gone.
    pub fn get_state(&self) -> Result<Value> {
        self.store.get_state()
    }

    /// Clears every binding of the store and returns how many there were.
    /// The tree stays live and later receivers can still attach.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store is gone.
    pub fn detach(self) -> Result<usize> {
        let removed = self
            .store
            .registry()
            .unregister_bindings(self.store.id(), None)?;
        debug!(store = %self.store.id(), bindings = removed, "state owner detached");
        Ok(removed)
    }
}
