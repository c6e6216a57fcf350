//! Selected-item consistency for flowdown stores.
//!
//! A component can declare a property that mirrors one element of a bound
//! sequence (or map), chosen by a bound index:
//!
//! ```text
//! list: link_state "todos"
//! sel:  link_state "selected"
//! item: link_array "list", link_index "sel"
//! ```
//!
//! With [`ArraySelector`] installed on the store, `item` follows
//! `list[sel]`, and splicing `todos` moves `selected` in the tree so it keeps
//! pointing at the same element (or `-1` once that element is removed).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod plugin;
pub mod selection;

use flowdown_foundation::Result;
use flowdown_store::Store;

pub use plugin::ArraySelector;
pub use selection::{NO_SELECTION, Selection, rebase_index, select};

/// Installs [`ArraySelector`] on a store.
///
/// # Errors
///
/// Returns `StoreNotFound` if the store was removed.
pub fn array_selector<A: 'static>(store: &Store<A>) -> Result<()> {
    store.use_plugin(ArraySelector::new())
}
