//! Configuration for stores.

/// What dispatch does when a mutator returns an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MutatorErrorPolicy {
    /// Log the failure, record it in the dispatch outcome, and run the
    /// remaining mutators.
    #[default]
    Continue,
    /// Stop delivering the action and return the failure to the caller.
    Abort,
}

/// Configuration for a store.
///
/// Controls mutator failure handling and how a newly attached state owner
/// seeds receivers that attached before it.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Failure handling for mutators.
    pub mutator_errors: MutatorErrorPolicy,

    /// Broadcast the whole tree when the state owner attaches, so receivers
    /// attached earlier pull their initial values.
    pub broadcast_on_provide: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mutator_errors: MutatorErrorPolicy::Continue,
            broadcast_on_provide: true,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration that aborts an action on the first failing
    /// mutator.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            mutator_errors: MutatorErrorPolicy::Abort,
            ..Self::default()
        }
    }

    /// Builder method to set the mutator failure policy.
    #[must_use]
    pub fn with_mutator_errors(mut self, policy: MutatorErrorPolicy) -> Self {
        self.mutator_errors = policy;
        self
    }

    /// Builder method to enable/disable the broadcast on provide.
    #[must_use]
    pub fn with_broadcast_on_provide(mut self, broadcast: bool) -> Self {
        self.broadcast_on_provide = broadcast;
        self
    }
}
