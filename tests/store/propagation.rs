//! Change propagation tests
//!
//! Tests how mutations reach bound properties: exact, nested, ancestor, and
//! splice deliveries, plus suppression and re-entrancy.

use std::cell::RefCell;
use std::rc::Rc;

use flowdown_foundation::{ChangeRecord, Path, SpliceOp, Value, ValueKind};
use flowdown_store::{
    Binding, Mutation, Properties, PropertyMeta, Registry, Store, Update,
};

use crate::common::{Event, TestComponent};

#[derive(Clone)]
enum Action {
    Set(&'static str, Value),
    Push(&'static str, Value),
}

fn store(initial: Value) -> Store<Action> {
    let registry = Registry::new();
    let store = registry.create_store(initial);
    store
        .add_mutator(|m: &mut Mutation<'_>, action: &Action| match action {
            Action::Set(path, value) => m.set(path, value.clone()),
            Action::Push(path, value) => m.push(path, value.clone()).map(|_| ()),
        })
        .unwrap();
    store.provide().unwrap();
    store
}

fn profile() -> Value {
    Value::from_entries([
        (
            "user",
            Value::from_entries([("name", Value::from("ann")), ("age", Value::Int(30))]),
        ),
        ("todos", Value::from(vec!["a", "b"])),
        ("foo", Value::Int(1)),
        ("foobar", Value::Int(2)),
    ])
}

// =============================================================================
// Exact and Nested
// =============================================================================

#[test]
fn set_reaches_every_binding_on_path() {
    let store = store(profile());
    let decls = Properties::new().with("name", PropertyMeta::linked("user.name"));
    let (a, a_handle) = TestComponent::shared(decls.clone());
    let (b, b_handle) = TestComponent::shared(decls);
    let receiver = store.receiver();
    receiver.attach(&a_handle).unwrap();
    receiver.attach(&b_handle).unwrap();

    store
        .dispatch(Action::Set("state.user.name", Value::from("bob")))
        .unwrap();

    assert_eq!(a.borrow().prop("name"), Value::from("bob"));
    assert_eq!(b.borrow().prop("name"), Value::from("bob"));
}

#[test]
fn descendant_set_arrives_on_rebased_path() {
    let store = store(profile());
    let (view, handle) =
        TestComponent::shared(Properties::new().with("me", PropertyMeta::linked("user")));
    store.receiver().attach(&handle).unwrap();
    view.borrow_mut().take_events();

    store
        .dispatch(Action::Set("state.user.age", Value::Int(31)))
        .unwrap();

    let mut view = view.borrow_mut();
    assert_eq!(view.prop("me.age"), Value::Int(31));
    assert_eq!(view.take_events(), vec![Event::Path("me.age".into())]);
}

#[test]
fn ancestor_set_rereads_bound_value() {
    let store = store(profile());
    let (view, handle) =
        TestComponent::shared(Properties::new().with("name", PropertyMeta::linked("user.name")));
    store.receiver().attach(&handle).unwrap();

    store
        .dispatch(Action::Set(
            "state.user",
            Value::from_entries([("name", Value::from("cy"))]),
        ))
        .unwrap();
    assert_eq!(view.borrow().prop("name"), Value::from("cy"));

    store
        .dispatch(Action::Set("state.user", Value::object()))
        .unwrap();
    assert_eq!(view.borrow().prop("name"), Value::Nil);
}

#[test]
fn sibling_prefix_is_unrelated() {
    let store = store(profile());
    let (view, handle) =
        TestComponent::shared(Properties::new().with("foo", PropertyMeta::linked("foo")));
    store.receiver().attach(&handle).unwrap();
    view.borrow_mut().take_events();

    store
        .dispatch(Action::Set("state.foobar", Value::Int(5)))
        .unwrap();

    assert!(view.borrow().events.is_empty());
    assert_eq!(view.borrow().prop("foo"), Value::Int(1));
}

#[test]
fn equal_set_notifies_nobody() {
    let store = store(profile());
    let (view, handle) =
        TestComponent::shared(Properties::new().with("foo", PropertyMeta::linked("foo")));
    store.receiver().attach(&handle).unwrap();
    view.borrow_mut().take_events();

    store.dispatch(Action::Set("state.foo", Value::Int(1))).unwrap();

    assert!(view.borrow().events.is_empty());
}

// =============================================================================
// Splices
// =============================================================================

#[test]
fn push_delivers_splices_with_fresh_sequence() {
    let store = store(profile());
    let (view, handle) = TestComponent::shared(
        Properties::new().with("todos", PropertyMeta::linked("todos").with_kind(ValueKind::Array)),
    );
    store.receiver().attach(&handle).unwrap();
    view.borrow_mut().take_events();

    store
        .dispatch(Action::Push("state.todos", Value::from("c")))
        .unwrap();

    let mut view = view.borrow_mut();
    assert_eq!(view.prop("todos"), Value::from(vec!["a", "b", "c"]));
    assert_eq!(
        view.take_events(),
        vec![Event::Splices("todos".into(), vec![SpliceOp::new(2, 0, 1)])]
    );
}

#[test]
fn splice_of_parent_sequence_rereads_element() {
    let store = store(profile());
    let (view, handle) =
        TestComponent::shared(Properties::new().with("first", PropertyMeta::linked("todos.0")));
    store.receiver().attach(&handle).unwrap();

    store
        .dispatch(Action::Set("state.todos", Value::from(vec!["z"])))
        .unwrap();
    assert_eq!(view.borrow().prop("first"), Value::from("z"));

    store
        .dispatch(Action::Push("state.todos", Value::from("y")))
        .unwrap();
    assert_eq!(view.borrow().prop("first"), Value::from("z"));
}

#[test]
fn length_record_is_suppressed_for_sequences() {
    let store = store(profile());
    let (view, handle) = TestComponent::shared(
        Properties::new().with("todos", PropertyMeta::linked("todos").with_kind(ValueKind::Array)),
    );
    store.receiver().attach(&handle).unwrap();
    view.borrow_mut().take_events();

    let delivered = store
        .propagate(&ChangeRecord::set(Path::state("todos.length"), Value::Int(2)))
        .unwrap();

    assert_eq!(delivered, 0);
    assert!(view.borrow().events.is_empty());
}

#[test]
fn injected_records_are_counted() {
    let store = store(profile());
    let decls = Properties::new().with("user", PropertyMeta::linked("user"));
    let (_, a) = TestComponent::shared(decls.clone());
    let (_, b) = TestComponent::shared(decls);
    store.receiver().attach(&a).unwrap();
    store.receiver().attach(&b).unwrap();

    let delivered = store
        .propagate(&ChangeRecord::set(Path::state("user.age"), Value::Int(1)))
        .unwrap();
    assert_eq!(delivered, 2);
}

// =============================================================================
// Re-entrancy
// =============================================================================

#[test]
fn callbacks_may_dispatch() {
    let store = store(Value::from_entries([("count", 0), ("mirror", 0)]));
    let (view, handle) =
        TestComponent::shared(Properties::new().with("mirror", PropertyMeta::linked("mirror")));
    store.receiver().attach(&handle).unwrap();

    let inner = store.clone();
    let watcher = Binding::with_callback(
        handle.clone(),
        "count",
        PropertyMeta::linked("count"),
        Path::state("count"),
        move |_, update: &Update| {
            inner
                .dispatch(Action::Set("state.mirror", update.value().clone()))
                .unwrap();
        },
    );
    store
        .registry()
        .register_bindings(store.id(), vec![watcher])
        .unwrap();

    store.dispatch(Action::Set("state.count", Value::Int(7))).unwrap();

    assert_eq!(view.borrow().prop("mirror"), Value::Int(7));
    assert_eq!(
        store.get_state().unwrap().get("mirror"),
        Some(&Value::Int(7))
    );
}

#[test]
fn bindings_added_during_delivery_wait_for_next_record() {
    let store = store(Value::from_entries([("count", 0)]));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let (_, handle) = TestComponent::shared(Properties::new());

    let late = {
        let seen = Rc::clone(&seen);
        Binding::with_callback(
            handle.clone(),
            "late",
            PropertyMeta::new(),
            Path::state("count"),
            move |_, update: &Update| seen.borrow_mut().push(update.value().clone()),
        )
    };
    let registrar = {
        let store = store.clone();
        let late = RefCell::new(Some(late));
        Binding::with_callback(
            handle.clone(),
            "registrar",
            PropertyMeta::new(),
            Path::state("count"),
            move |_, _| {
                if let Some(binding) = late.borrow_mut().take() {
                    store
                        .registry()
                        .register_bindings(store.id(), vec![binding])
                        .unwrap();
                }
            },
        )
    };
    store
        .registry()
        .register_bindings(store.id(), vec![registrar])
        .unwrap();

    store.dispatch(Action::Set("state.count", Value::Int(1))).unwrap();
    assert!(seen.borrow().is_empty());

    store.dispatch(Action::Set("state.count", Value::Int(2))).unwrap();
    assert_eq!(*seen.borrow(), vec![Value::Int(2)]);
}
