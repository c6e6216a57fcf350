//! Reference scenarios
//!
//! Small end-to-end cases with known outcomes for the tree and the views.

use flowdown::foundation::{Value, ValueKind};
use flowdown::select::array_selector;
use flowdown::store::{DispatchOutcome, Mutation, Properties, PropertyMeta, Registry, Store};

use crate::common::{Event, TestComponent};

enum Action {
    Splice(usize, usize, Vec<&'static str>),
    Append(&'static str),
}

fn store(initial: Value) -> Store<Action> {
    let registry = Registry::new();
    let store = registry.create_store(initial);
    array_selector(&store).unwrap();
    store
        .add_mutator(|m: &mut Mutation<'_>, action: &Action| match action {
            Action::Splice(at, remove, items) => m
                .splice("state.list", *at, *remove, items.iter().copied())
                .map(|_| ()),
            Action::Append(item) => m.push("state.list", *item).map(|_| ()),
        })
        .unwrap();
    store
}

fn picker() -> Properties {
    Properties::new()
        .with("list", PropertyMeta::linked("list").with_kind(ValueKind::Array))
        .with("sel", PropertyMeta::linked("sel"))
        .with("item", PropertyMeta::selection("list", "sel"))
}

fn list_and_sel(list: &[&str], sel: i64) -> Value {
    Value::from_entries([("list", Value::from(list.to_vec())), ("sel", Value::Int(sel))])
}

#[test]
fn replacing_first_element_keeps_selection() {
    let store = store(list_and_sel(&["a", "b", "c"], 1));
    store.provide().unwrap();
    let (view, handle) = TestComponent::shared(picker());
    store.receiver().attach(&handle).unwrap();

    store.dispatch(Action::Splice(0, 1, vec!["z"])).unwrap();

    let state = store.get_state().unwrap();
    assert_eq!(state.get("sel"), Some(&Value::Int(1)));
    assert_eq!(view.borrow().prop("item"), Value::from("b"));
    assert_eq!(view.borrow().prop("item"), state.get_in(["list", "1"]).cloned().unwrap_or_default());
}

#[test]
fn removing_the_selected_tail_clears_selection() {
    let store = store(list_and_sel(&["a", "b", "c"], 2));
    store.provide().unwrap();
    let (view, handle) = TestComponent::shared(picker());
    store.receiver().attach(&handle).unwrap();

    store.dispatch(Action::Splice(1, 2, vec![])).unwrap();

    assert_eq!(store.get_state().unwrap().get("sel"), Some(&Value::Int(-1)));
    assert_eq!(view.borrow().prop("item"), Value::Nil);
    assert_eq!(view.borrow().prop("list"), Value::from(vec!["a"]));
}

#[test]
fn actions_before_the_owner_replay_in_order() {
    let store = store(list_and_sel(&[], -1));
    let (view, handle) = TestComponent::shared(
        Properties::new().with("list", PropertyMeta::linked("list").with_kind(ValueKind::Array)),
    );
    store.receiver().attach(&handle).unwrap();

    assert!(matches!(
        store.dispatch(Action::Append("first")).unwrap(),
        DispatchOutcome::Queued { pending: 1 }
    ));
    assert!(matches!(
        store.dispatch(Action::Append("second")).unwrap(),
        DispatchOutcome::Queued { pending: 2 }
    ));
    assert_eq!(view.borrow().prop("list"), Value::Nil);

    let provider = store.provide().unwrap();

    assert_eq!(provider.replay_report().replayed, 2);
    assert!(provider.replay_report().is_clean());
    assert_eq!(store.pending_count().unwrap(), 0);
    assert_eq!(
        store.get_state().unwrap().get("list"),
        Some(&Value::from(vec!["first", "second"]))
    );

    let view = view.borrow();
    assert_eq!(view.prop("list"), Value::from(vec!["first", "second"]));
    let pushes: Vec<_> = view
        .events
        .iter()
        .filter(|event| matches!(event, Event::Splices(..)))
        .collect();
    assert_eq!(pushes.len(), 2);
}
