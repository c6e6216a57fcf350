//! The store registry and store handles.
//!
//! A [`Registry`] owns any number of independent stores, keyed by
//! [`StoreId`]. Every operation on a store can be reached either through the
//! registry by id or through a [`Store`] handle bound to one id.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use flowdown_foundation::{ChangeRecord, Error, Result, StoreId, Value};
use tracing::debug;

use crate::binding::Binding;
use crate::component::ComponentRef;
use crate::config::StoreConfig;
use crate::dispatch::{DispatchOutcome, Mutator, ReplayReport, deliver};
use crate::propagate::propagate;
use crate::receiver::{BindingResolver, LinkState, StateProvider, StateReceiver};
use crate::tree::StoreCore;

/// Everything the registry keeps for one store.
pub(crate) struct StoreCell<A> {
    pub(crate) core: Rc<StoreCore>,
    mutators: RefCell<Vec<Rc<dyn Mutator<A>>>>,
    pending: RefCell<VecDeque<A>>,
    replaying: Cell<bool>,
    resolvers: RefCell<Vec<Rc<dyn BindingResolver>>>,
}

impl<A: 'static> StoreCell<A> {
    fn new(id: StoreId, config: StoreConfig, initial: Value) -> Self {
        Self {
            core: Rc::new(StoreCore::new(id, config, initial)),
            mutators: RefCell::new(Vec::new()),
            pending: RefCell::new(VecDeque::new()),
            replaying: Cell::new(false),
            resolvers: RefCell::new(vec![Rc::new(LinkState) as Rc<dyn BindingResolver>]),
        }
    }

    pub(crate) fn resolvers(&self) -> Vec<Rc<dyn BindingResolver>> {
        self.resolvers.borrow().clone()
    }

    /// Delivers an action, or queues it behind older actions that have not
    /// been replayed yet.
    fn dispatch(&self, action: A) -> Result<DispatchOutcome> {
        let id = self.core.id();
        let behind_queue = self.replaying.get() || !self.pending.borrow().is_empty();
        if !self.core.has_owner() || behind_queue {
            let mut pending = self.pending.borrow_mut();
            pending.push_back(action);
            if behind_queue {
                debug!(store = %id, pending = pending.len(), "queued action behind pending replay");
            } else {
                debug!(store = %id, pending = pending.len(), "queued action until a state owner attaches");
            }
            return Ok(DispatchOutcome::Queued {
                pending: pending.len(),
            });
        }
        let mutators = self.mutators.borrow().clone();
        deliver(&self.core, &mutators, &action).into_outcome(id)
    }

    /// Delivers queued actions in order, one at a time, until the queue is
    /// empty. Actions dispatched while the queue drains go to its back, so
    /// they are delivered after every older action.
    pub(crate) fn replay(&self) -> ReplayReport {
        let mut report = ReplayReport::default();
        if self.replaying.replace(true) {
            return report;
        }
        loop {
            let Some(action) = self.pending.borrow_mut().pop_front() else {
                break;
            };
            let mutators = self.mutators.borrow().clone();
            deliver(&self.core, &mutators, &action).record_into(&mut report);
        }
        self.replaying.set(false);
        if report.replayed > 0 {
            debug!(store = %self.core.id(), replayed = report.replayed, "replayed queued actions");
        }
        report
    }
}

struct RegistryInner<A> {
    stores: RefCell<HashMap<StoreId, Rc<StoreCell<A>>>>,
    next_id: Cell<StoreId>,
    config: StoreConfig,
}

/// Owns a set of stores handling actions of type `A`.
///
/// Cloning a registry yields another handle to the same stores.
pub struct Registry<A> {
    inner: Rc<RegistryInner<A>>,
}

impl<A> Clone for Registry<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: 'static> Default for Registry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> Registry<A> {
    /// Creates an empty registry with the default store configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty registry whose stores use `config` unless overridden.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                stores: RefCell::new(HashMap::new()),
                next_id: Cell::new(StoreId::new(1)),
                config,
            }),
        }
    }

    /// Returns the default configuration for new stores.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Creates a store holding `initial` until a state owner attaches.
    pub fn create_store(&self, initial: Value) -> Store<A> {
        self.create_store_with_config(initial, self.inner.config.clone())
    }

    /// Creates a store with its own configuration.
    pub fn create_store_with_config(&self, initial: Value, config: StoreConfig) -> Store<A> {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.next());
        self.inner
            .stores
            .borrow_mut()
            .insert(id, Rc::new(StoreCell::new(id, config, initial)));
        debug!(store = %id, "store created");
        Store {
            id,
            registry: self.clone(),
        }
    }

    /// Returns a handle to an existing store.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown id.
    pub fn store(&self, id: StoreId) -> Result<Store<A>> {
        self.cell(id)?;
        Ok(Store {
            id,
            registry: self.clone(),
        })
    }

    pub(crate) fn cell(&self, id: StoreId) -> Result<Rc<StoreCell<A>>> {
        self.inner
            .stores
            .borrow()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::store_not_found(id))
    }

    /// Adds bindings to a store, after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown id.
    pub fn register_bindings(&self, id: StoreId, bindings: Vec<Binding>) -> Result<()> {
        self.cell(id)?.core.register(bindings);
        Ok(())
    }

    /// Removes the bindings of `component`, or all bindings for `None`, and
    /// returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown id.
    pub fn unregister_bindings(&self, id: StoreId, component: Option<&ComponentRef>) -> Result<usize> {
        Ok(self.cell(id)?.core.unregister(component))
    }

    /// Adds a mutator to a store, after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown id.
    pub fn register_mutator(&self, id: StoreId, mutator: impl Mutator<A> + 'static) -> Result<()> {
        self.cell(id)?.mutators.borrow_mut().push(Rc::new(mutator));
        Ok(())
    }

    /// Dispatches an action to a store.
    ///
    /// Without a state owner the action is queued for replay.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown id, and `MutatorFailed` when a
    /// mutator fails under [`MutatorErrorPolicy::Abort`](crate::MutatorErrorPolicy::Abort).
    pub fn dispatch(&self, id: StoreId, action: A) -> Result<DispatchOutcome> {
        self.cell(id)?.dispatch(action)
    }

    /// Returns the live tree of a store.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown id and `NoStateOwner` before
    /// the state owner attaches.
    pub fn get_state(&self, id: StoreId) -> Result<Value> {
        self.cell(id)?
            .core
            .state()
            .ok_or_else(|| Error::no_state_owner(id))
    }

    /// Removes a store. Its bindings stop receiving updates.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown id.
    pub fn remove_store(&self, id: StoreId) -> Result<()> {
        let cell = self
            .inner
            .stores
            .borrow_mut()
            .remove(&id)
            .ok_or_else(|| Error::store_not_found(id))?;
        cell.core.unregister(None);
        debug!(store = %id, "store removed");
        Ok(())
    }

    /// Returns true if the registry holds a store with this id.
    #[must_use]
    pub fn contains(&self, id: StoreId) -> bool {
        self.inner.stores.borrow().contains_key(&id)
    }

    /// Returns the number of stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.stores.borrow().len()
    }

    /// Returns true if the registry holds no stores.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.stores.borrow().is_empty()
    }
}

// =============================================================================
// Store handle
// =============================================================================

/// Handle to one store of a registry.
pub struct Store<A> {
    id: StoreId,
    registry: Registry<A>,
}

impl<A> Clone for Store<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            registry: self.registry.clone(),
        }
    }
}

impl<A: 'static> Store<A> {
    /// Returns the store's id.
    #[must_use]
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Returns the registry the store belongs to.
    #[must_use]
    pub fn registry(&self) -> &Registry<A> {
        &self.registry
    }

    pub(crate) fn cell(&self) -> Result<Rc<StoreCell<A>>> {
        self.registry.cell(self.id)
    }

    /// Returns the live tree.
    ///
    /// # Errors
    ///
    /// See [`Registry::get_state`].
    pub fn get_state(&self) -> Result<Value> {
        self.registry.get_state(self.id)
    }

    /// Dispatches an action.
    ///
    /// # Errors
    ///
    /// See [`Registry::dispatch`].
    pub fn dispatch(&self, action: A) -> Result<DispatchOutcome> {
        self.registry.dispatch(self.id, action)
    }

    /// Adds a mutator.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store was removed.
    pub fn add_mutator(&self, mutator: impl Mutator<A> + 'static) -> Result<()> {
        self.registry.register_mutator(self.id, mutator)
    }

    /// Returns a receiver capability for components that bind to this store.
    #[must_use]
    pub fn receiver(&self) -> StateReceiver<A> {
        StateReceiver::new(self.clone())
    }

    /// Attaches the state owner: instantiates the live tree, brings earlier
    /// receivers up to date, and replays queued actions.
    ///
    /// # Errors
    ///
    /// Returns `OwnerAlreadyAttached` if the store already has an owner.
    pub fn provide(&self) -> Result<StateProvider<A>> {
        StateProvider::attach(self.clone())
    }

    /// Adds a binding resolver that runs after the existing ones whenever a
    /// component attaches.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store was removed.
    pub fn use_plugin(&self, resolver: impl BindingResolver + 'static) -> Result<()> {
        self.cell()?.resolvers.borrow_mut().push(Rc::new(resolver));
        Ok(())
    }

    /// Offers a change record to the store's bindings as if the tree had
    /// emitted it, and returns the number of deliveries.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store was removed.
    pub fn propagate(&self, record: &ChangeRecord) -> Result<usize> {
        Ok(propagate(&self.cell()?.core, record))
    }

    /// Returns true once a state owner is attached.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store was removed.
    pub fn has_owner(&self) -> Result<bool> {
        Ok(self.cell()?.core.has_owner())
    }

    /// Returns the number of registered bindings.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store was removed.
    pub fn binding_count(&self) -> Result<usize> {
        Ok(self.cell()?.core.binding_count())
    }

    /// Returns the number of actions waiting for a state owner.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if the store was removed.
    pub fn pending_count(&self) -> Result<usize> {
        Ok(self.cell()?.pending.borrow().len())
    }
}

impl<A> std::fmt::Debug for Store<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("id", &self.id).finish()
    }
}
