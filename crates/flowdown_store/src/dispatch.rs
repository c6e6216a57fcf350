//! Action dispatch: mutators and the mutation capability they receive.
//!
//! A dispatched action is handed to every mutator of the store, in
//! registration order. Mutators change the tree only through [`Mutation`],
//! whose every successful write emits its change record before returning.

use std::rc::Rc;

use flowdown_foundation::{Error, ErrorContext, Path, Result, StoreId, Value};
use tracing::warn;

use crate::config::MutatorErrorPolicy;
use crate::tree::StoreCore;

/// Handles actions by mutating the tree.
pub trait Mutator<A> {
    /// Applies `action`.
    ///
    /// # Errors
    ///
    /// Returns an error if the action cannot be applied. Writes made before
    /// the error stay in place.
    fn apply(&self, mutation: &mut Mutation<'_>, action: &A) -> Result<()>;
}

impl<A, F> Mutator<A> for F
where
    F: Fn(&mut Mutation<'_>, &A) -> Result<()>,
{
    fn apply(&self, mutation: &mut Mutation<'_>, action: &A) -> Result<()> {
        self(mutation, action)
    }
}

/// The only write access a mutator has to the tree.
///
/// Paths are absolute (`state.todos.0.title`).
pub struct Mutation<'a> {
    core: &'a StoreCore,
}

impl<'a> Mutation<'a> {
    pub(crate) fn new(core: &'a StoreCore) -> Self {
        Self { core }
    }

    /// Returns the id of the store being mutated.
    #[must_use]
    pub fn store_id(&self) -> StoreId {
        self.core.id()
    }

    /// Reads the value at `path`. Missing values read as `Nil`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for a malformed path.
    pub fn get(&self, path: &str) -> Result<Value> {
        let path = Path::parse(path)?;
        Ok(self.core.read(&path).unwrap_or_default())
    }

    /// Replaces the value at `path`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for a malformed path and `PathNotFound` when a
    /// parent of `path` does not exist.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        self.core.set(&Path::parse(path)?, value.into())
    }

    /// Appends to the sequence at `path` and returns its new length.
    ///
    /// # Errors
    ///
    /// Returns `NotASequence` if `path` does not hold a sequence.
    pub fn push(&mut self, path: &str, item: impl Into<Value>) -> Result<usize> {
        self.core.push(&Path::parse(path)?, item.into())
    }

    /// Removes and returns the last element of the sequence at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotASequence` if `path` does not hold a sequence.
    pub fn pop(&mut self, path: &str) -> Result<Option<Value>> {
        self.core.pop(&Path::parse(path)?)
    }

    /// Removes `remove` elements at `start` of the sequence at `path`,
    /// inserts `items` in their place, and returns the removed elements.
    ///
    /// # Errors
    ///
    /// Returns `NotASequence` if `path` does not hold a sequence.
    pub fn splice<I>(&mut self, path: &str, start: usize, remove: usize, items: I) -> Result<Vec<Value>>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let items = items.into_iter().map(Into::into).collect();
        self.core.splice(&Path::parse(path)?, start, remove, items)
    }

    /// Removes and returns the first element of the sequence at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotASequence` if `path` does not hold a sequence.
    pub fn shift(&mut self, path: &str) -> Result<Option<Value>> {
        self.core.shift(&Path::parse(path)?)
    }

    /// Prepends to the sequence at `path` and returns its new length.
    ///
    /// # Errors
    ///
    /// Returns `NotASequence` if `path` does not hold a sequence.
    pub fn unshift(&mut self, path: &str, item: impl Into<Value>) -> Result<usize> {
        self.core.unshift(&Path::parse(path)?, item.into())
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// A mutator that returned an error.
#[derive(Debug)]
pub struct MutatorFailure {
    /// Registration index of the mutator.
    pub mutator: usize,
    /// The error it returned.
    pub error: Error,
}

/// What happened to a dispatched action.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No state owner is attached; the action waits in the queue.
    Queued {
        /// Queue length after enqueueing.
        pending: usize,
    },
    /// The action was handed to the mutators.
    Delivered {
        /// Number of mutators that ran.
        mutators: usize,
        /// Mutators that failed and were skipped over.
        failures: Vec<MutatorFailure>,
    },
}

impl DispatchOutcome {
    /// Returns true if the action was queued.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }

    /// Returns the failed mutators, if any.
    #[must_use]
    pub fn failures(&self) -> &[MutatorFailure] {
        match self {
            Self::Queued { .. } => &[],
            Self::Delivered { failures, .. } => failures,
        }
    }
}

/// One failure encountered while replaying queued actions.
#[derive(Debug)]
pub struct ReplayFailure {
    /// Position of the action in the queue.
    pub action: usize,
    /// The failing mutator.
    pub failure: MutatorFailure,
}

/// Summary of replaying the queue when a state owner attaches.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Number of actions replayed.
    pub replayed: usize,
    /// Failures, in replay order.
    pub failures: Vec<ReplayFailure>,
}

impl ReplayReport {
    /// Returns true if every replayed action ran without failures.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// =============================================================================
// Delivery
// =============================================================================

/// Result of running one action through the mutators.
pub(crate) struct Delivery {
    ran: usize,
    failures: Vec<MutatorFailure>,
    aborted: bool,
}

impl Delivery {
    /// Converts the delivery into what `dispatch` returns to its caller.
    pub(crate) fn into_outcome(mut self, store: StoreId) -> Result<DispatchOutcome> {
        if self.aborted {
            if let Some(failure) = self.failures.pop() {
                return Err(Error::mutator_failed(failure.mutator, failure.error)
                    .with_context(ErrorContext::new().with_store(store).with_frame("dispatch")));
            }
        }
        Ok(DispatchOutcome::Delivered {
            mutators: self.ran,
            failures: self.failures,
        })
    }

    pub(crate) fn record_into(self, report: &mut ReplayReport) {
        let action = report.replayed;
        report.replayed += 1;
        report.failures.extend(
            self.failures
                .into_iter()
                .map(|failure| ReplayFailure { action, failure }),
        );
    }
}

/// Runs `action` through `mutators` under the store's failure policy.
pub(crate) fn deliver<A>(core: &StoreCore, mutators: &[Rc<dyn Mutator<A>>], action: &A) -> Delivery {
    let policy = core.config().mutator_errors;
    let mut delivery = Delivery {
        ran: 0,
        failures: Vec::new(),
        aborted: false,
    };

    for (index, mutator) in mutators.iter().enumerate() {
        delivery.ran += 1;
        let mut mutation = Mutation::new(core);
        if let Err(error) = mutator.apply(&mut mutation, action) {
            warn!(store = %core.id(), mutator = index, %error, "mutator failed");
            delivery.failures.push(MutatorFailure {
                mutator: index,
                error,
            });
            if policy == MutatorErrorPolicy::Abort {
                delivery.aborted = true;
                break;
            }
        }
    }

    delivery
}
