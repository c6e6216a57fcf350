//! Change propagation: fanning one change record out to bindings.

use flowdown_foundation::{ChangeRecord, PathMatch, classify, rebase};
use tracing::trace;

use crate::binding::{Binding, Update};
use crate::tree::StoreCore;

/// Offers `record` to every active binding of the store, in registration
/// order, and returns the number of deliveries.
///
/// The binding list is snapshotted first, so callbacks may dispatch, write,
/// attach, or detach. A binding removed by an earlier callback of the same
/// record is skipped.
///
/// Records are numbered per store. While a record is being delivered its
/// number is visible through [`StoreCore::delivering`], including after a
/// nested record emitted by one of its callbacks has finished.
pub(crate) fn propagate(core: &StoreCore, record: &ChangeRecord) -> usize {
    let bindings = core.snapshot();
    let outer = core.enter_record();
    let mut delivered = 0;

    for binding in &bindings {
        if !binding.is_active() {
            continue;
        }
        let Some(update) = route(core, binding, record) else {
            continue;
        };
        trace!(
            store = %core.id(),
            record = %record,
            binding = binding.name(),
            path = update.path(),
            "delivering update"
        );
        binding.deliver(&update);
        delivered += 1;
    }

    core.leave_record(outer);
    delivered
}

/// Translates a record into the update `binding` should see, if any.
fn route(core: &StoreCore, binding: &Binding, record: &ChangeRecord) -> Option<Update> {
    let name = binding.name();
    match (classify(binding.path(), binding.is_sequence(), record), record) {
        (PathMatch::Exact, ChangeRecord::Set { value, .. }) => Some(Update::Replace {
            path: name.to_string(),
            value: value.clone(),
        }),
        (PathMatch::Splice { tail }, ChangeRecord::Splice { path, splices }) => {
            Some(Update::Splices {
                path: rebase(name, tail),
                value: core.read(path).unwrap_or_default(),
                splices: splices.clone(),
            })
        }
        (PathMatch::Descendant { tail }, ChangeRecord::Set { value, .. }) => Some(Update::Nested {
            path: rebase(name, tail),
            value: value.clone(),
        }),
        (PathMatch::Ancestor, _) => Some(Update::Replace {
            path: name.to_string(),
            value: core.read(binding.path()).unwrap_or_default(),
        }),
        _ => None,
    }
}
