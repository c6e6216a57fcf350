//! The array selector resolver and its update handlers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use flowdown_foundation::{Error, Path, Result, StoreId, Value};
use flowdown_store::{
    Binding, BindingResolver, ComponentRef, Properties, PropertyMeta, ResolveContext, TreeWriter,
    Update,
};
use tracing::{debug, warn};

use crate::selection::{Selection, rebase_index, select};

/// Keeps `item = items[index]` selections consistent.
///
/// For every property declaring both `link_array` and `link_index`, two
/// handler bindings are added: one on the tree path of the items property
/// and one on the tree path of the index property. Splices of the items move
/// the index so it keeps pointing at the same element (or clear it when the
/// element is removed) and the new index is written back to the tree.
///
/// Several components may select through the same tree index. The index is
/// rebased once per splice record: the first handler to see the record moves
/// it, the others only rederive their item.
#[derive(Clone, Debug, Default)]
pub struct ArraySelector {
    rebased: Rc<RefCell<RebaseLog>>,
}

/// Last record each tree index was rebased for, with a handle that tells
/// whether its store still exists.
type RebaseLog = HashMap<(StoreId, Path), (TreeWriter, u64)>;

impl ArraySelector {
    /// Creates a selector with no rebase history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BindingResolver for ArraySelector {
    fn resolve(
        &self,
        cx: &ResolveContext<'_>,
        component: &ComponentRef,
        properties: &Properties,
    ) -> Result<Vec<Binding>> {
        let mut bindings = Vec::new();

        for (name, meta) in properties.iter() {
            let (items, index) = match (&meta.link_array, &meta.link_index) {
                (None, None) => continue,
                (Some(items), Some(index)) => (items, index),
                _ => {
                    return Err(Error::malformed_binding(
                        &**name,
                        "link_array and link_index must be declared together",
                    ));
                }
            };
            let (items_meta, items_path) = linked(properties, name, items)?;
            let (index_meta, index_path) = linked(properties, name, index)?;

            let selection = Rc::new(Selection {
                items: Arc::clone(items),
                index: Arc::clone(index),
                item: Arc::clone(name),
                index_path: index_path.clone(),
            });
            debug!(store = %cx.store_id(), item = &**name, items = &**items, index = &**index, "selection bound");

            let on_items = {
                let selection = Rc::clone(&selection);
                let writer = cx.writer();
                let rebased = Rc::clone(&self.rebased);
                move |component: &ComponentRef, update: &Update| {
                    items_changed(&selection, &writer, &rebased, component, update);
                }
            };
            bindings.push(Binding::with_callback(
                Rc::clone(component),
                Arc::clone(items),
                items_meta.clone(),
                items_path,
                on_items,
            ));
            bindings.push(Binding::with_callback(
                Rc::clone(component),
                Arc::clone(index),
                index_meta.clone(),
                index_path,
                move |component, _| rederive(&selection, component),
            ));
        }

        Ok(bindings)
    }
}

/// Looks up the tree path a referenced property is bound to.
fn linked<'a>(properties: &'a Properties, owner: &str, name: &str) -> Result<(&'a PropertyMeta, Path)> {
    let meta = properties.get(name).ok_or_else(|| {
        Error::malformed_binding(owner, format!("property `{name}` is not declared"))
    })?;
    let link = meta.link_state.as_deref().ok_or_else(|| {
        Error::malformed_binding(owner, format!("property `{name}` has no link_state"))
    })?;
    let path = Path::from_link(link).map_err(|_| {
        Error::malformed_binding(owner, format!("property `{name}` has invalid link_state {link:?}"))
    })?;
    Ok((meta, path))
}

fn items_changed(
    selection: &Selection,
    writer: &TreeWriter,
    rebased: &RefCell<RebaseLog>,
    component: &ComponentRef,
    update: &Update,
) {
    match update {
        Update::Replace { .. } => rederive(selection, component),
        Update::Splices { path, splices, .. } if path.as_str() == &*selection.items => {
            let Some(index) = current_index(selection, component) else {
                return;
            };
            let claimed = index
                .as_int()
                .filter(|_| claim_record(selection, writer, rebased));
            if let Some(current) = claimed {
                let next = rebase_index(current, splices);
                if next != current && writer.has_owner() {
                    debug!(index = &*selection.index, from = current, to = next, "rebasing selection");
                    if let Err(error) = writer.set(&selection.index_path, Value::Int(next)) {
                        warn!(path = %selection.index_path, %error, "could not write rebased index");
                    }
                }
            }
            rederive(selection, component);
        }
        Update::Splices { path, .. } | Update::Nested { path, .. } => {
            let Some(index) = current_index(selection, component) else {
                return;
            };
            match selection.element_tail(path, &index) {
                None => {}
                Some("") => rederive(selection, component),
                Some(rest) => forward(selection, component, rest, update),
            }
        }
    }
}

/// Claims the record being delivered for rebasing the selection's tree
/// index. Returns false if another handler already rebased that index for
/// the same record. Entries of removed stores are dropped here.
fn claim_record(selection: &Selection, writer: &TreeWriter, rebased: &RefCell<RebaseLog>) -> bool {
    let Some(record) = writer.current_record() else {
        return true;
    };
    let mut rebased = rebased.borrow_mut();
    rebased.retain(|_, (owner, _)| owner.is_live());
    let key = (writer.store_id(), selection.index_path.clone());
    rebased
        .insert(key, (writer.clone(), record))
        .is_none_or(|(_, last)| last != record)
}

fn current_index(selection: &Selection, component: &ComponentRef) -> Option<Value> {
    match component.try_borrow() {
        Ok(component) => Some(component.get(&selection.index)),
        Err(_) => {
            warn!(index = &*selection.index, "component busy, selection not updated");
            None
        }
    }
}

/// Writes a change inside the selected element onto the item property.
fn forward(selection: &Selection, component: &ComponentRef, rest: &str, update: &Update) {
    let Ok(mut component) = component.try_borrow_mut() else {
        warn!(item = &*selection.item, "component busy, selection not updated");
        return;
    };
    if component.get(&selection.item).is_nil() {
        return;
    }
    let local = format!("{}.{rest}", selection.item);
    if let Err(error) = component.set(&local, update.value().clone()) {
        warn!(path = %local, %error, "could not write selected item");
        return;
    }
    match update {
        Update::Splices { splices, .. } => component.notify_splices(&local, splices),
        Update::Replace { .. } | Update::Nested { .. } => component.notify_path(&local),
    }
}

/// Recomputes the item property from the local items and index.
///
/// A `Nil` index leaves the item alone.
fn rederive(selection: &Selection, component: &ComponentRef) {
    let Ok(mut component) = component.try_borrow_mut() else {
        warn!(item = &*selection.item, "component busy, selection not updated");
        return;
    };
    let index = component.get(&selection.index);
    if index.is_nil() {
        return;
    }
    let item = select(&component.get(&selection.items), &index);
    if component.get(&selection.item) == item {
        return;
    }
    if let Err(error) = component.set(&selection.item, item) {
        warn!(item = &*selection.item, %error, "could not write selected item");
        return;
    }
    component.notify_path(&selection.item);
}
