//! Attach/detach lifecycle tests
//!
//! Tests receivers and providers: priming, the initial broadcast, detaching,
//! and store removal.

use std::cell::Cell;

use flowdown_foundation::{ErrorKind, Path, Value};
use flowdown_store::{
    Binding, DispatchOutcome, Mutation, Properties, PropertyMeta, Registry, Store, StoreConfig,
    Update,
};

use crate::common::{Event, TestComponent};

fn title_store(config: StoreConfig) -> Store<&'static str> {
    let registry = Registry::new();
    let store = registry.create_store_with_config(
        Value::from_entries([("title", "draft")]),
        config,
    );
    store
        .add_mutator(|m: &mut Mutation<'_>, title: &&'static str| m.set("state.title", *title))
        .unwrap();
    store
}

fn title_view() -> Properties {
    Properties::new().with("title", PropertyMeta::linked("title"))
}

#[test]
fn receiver_before_provider_is_seeded_by_broadcast() {
    let store = title_store(StoreConfig::default());
    let (view, handle) = TestComponent::shared(title_view());
    let receiver = store.receiver();
    receiver.attach(&handle).unwrap();

    assert!(matches!(
        receiver.get_state().unwrap_err().kind,
        ErrorKind::NoStateOwner(_)
    ));
    assert_eq!(view.borrow().prop("title"), Value::Nil);

    store.provide().unwrap();

    assert_eq!(view.borrow().prop("title"), Value::from("draft"));
    assert_eq!(view.borrow().events, vec![Event::Path("title".into())]);
}

#[test]
fn broadcast_can_be_disabled() {
    let store = title_store(StoreConfig::default().with_broadcast_on_provide(false));
    let (view, handle) = TestComponent::shared(title_view());
    store.receiver().attach(&handle).unwrap();

    store.provide().unwrap();
    assert_eq!(view.borrow().prop("title"), Value::Nil);

    store.dispatch("final").unwrap();
    assert_eq!(view.borrow().prop("title"), Value::from("final"));
}

#[test]
fn queued_actions_reach_receivers_attached_before_provide() {
    let store = title_store(StoreConfig::default());
    let (view, handle) = TestComponent::shared(title_view());
    store.receiver().attach(&handle).unwrap();
    store.dispatch("queued").unwrap();

    store.provide().unwrap();

    assert_eq!(view.borrow().prop("title"), Value::from("queued"));
    assert_eq!(view.borrow().paths(), vec!["title", "title"]);
}

fn log_store() -> Store<&'static str> {
    let registry = Registry::new();
    let store = registry.create_store(Value::from_entries([
        ("log", Value::from(Vec::<&str>::new())),
        ("t", Value::Int(0)),
    ]));
    store
        .add_mutator(|m: &mut Mutation<'_>, entry: &&'static str| {
            m.push("state.log", *entry).map(|_| ())
        })
        .unwrap();
    store
}

fn log_of(store: &Store<&'static str>) -> Value {
    store.get_state().unwrap().get("log").cloned().unwrap_or_default()
}

/// Registers a callback on `path` that dispatches `entry` the first time
/// `fire` accepts an update.
fn dispatch_once(
    store: &Store<&'static str>,
    path: &str,
    entry: &'static str,
    fire: impl Fn(&Update) -> bool + 'static,
) {
    let (_, handle) = TestComponent::shared(Properties::new());
    let inner = store.clone();
    let done = Cell::new(false);
    let binding = Binding::with_callback(
        handle,
        "watch",
        PropertyMeta::new(),
        Path::state(path),
        move |_, update: &Update| {
            if fire(update) && !done.replace(true) {
                inner.dispatch(entry).unwrap();
            }
        },
    );
    store
        .registry()
        .register_bindings(store.id(), vec![binding])
        .unwrap();
}

#[test]
fn dispatch_during_broadcast_waits_for_queued_actions() {
    let store = log_store();
    dispatch_once(&store, "t", "dispatched-later", |_| true);
    store.dispatch("queued-first").unwrap();

    let provider = store.provide().unwrap();

    assert_eq!(log_of(&store), Value::from(vec!["queued-first", "dispatched-later"]));
    assert_eq!(provider.replay_report().replayed, 2);
    assert_eq!(store.pending_count().unwrap(), 0);
}

#[test]
fn dispatch_during_replay_goes_to_back_of_queue() {
    let store = log_store();
    dispatch_once(&store, "log", "c", |update| matches!(update, Update::Splices { .. }));
    store.dispatch("a").unwrap();
    store.dispatch("b").unwrap();

    store.provide().unwrap();

    assert_eq!(log_of(&store), Value::from(vec!["a", "b", "c"]));
    assert!(matches!(
        store.dispatch("d").unwrap(),
        DispatchOutcome::Delivered { .. }
    ));
}

#[test]
fn detach_only_affects_that_component() {
    let store = title_store(StoreConfig::default());
    store.provide().unwrap();
    let (a, a_handle) = TestComponent::shared(title_view());
    let (b, b_handle) = TestComponent::shared(title_view());
    let receiver = store.receiver();
    receiver.attach(&a_handle).unwrap();
    receiver.attach(&b_handle).unwrap();

    assert_eq!(receiver.detach(&a_handle).unwrap(), 1);
    store.dispatch("after").unwrap();

    assert_eq!(a.borrow().prop("title"), Value::from("draft"));
    assert_eq!(b.borrow().prop("title"), Value::from("after"));
}

#[test]
fn unregister_all_clears_store() {
    let store = title_store(StoreConfig::default());
    store.provide().unwrap();
    for _ in 0..3 {
        let (_, handle) = TestComponent::shared(title_view());
        store.receiver().attach(&handle).unwrap();
    }

    let removed = store
        .registry()
        .unregister_bindings(store.id(), None)
        .unwrap();

    assert_eq!(removed, 3);
    assert_eq!(store.binding_count().unwrap(), 0);
}

#[test]
fn provider_detach_leaves_tree_live() {
    let store = title_store(StoreConfig::default());
    let provider = store.provide().unwrap();
    let (view, handle) = TestComponent::shared(title_view());
    store.receiver().attach(&handle).unwrap();

    provider.detach().unwrap();
    store.dispatch("later").unwrap();

    assert_eq!(view.borrow().prop("title"), Value::from("draft"));
    assert_eq!(store.get_state().unwrap().get("title"), Some(&Value::from("later")));

    let (fresh, fresh_handle) = TestComponent::shared(title_view());
    store.receiver().attach(&fresh_handle).unwrap();
    assert_eq!(fresh.borrow().prop("title"), Value::from("later"));
}

#[test]
fn removed_store_rejects_everything() {
    let store = title_store(StoreConfig::default());
    store.provide().unwrap();
    let (_, handle) = TestComponent::shared(title_view());

    store.registry().remove_store(store.id()).unwrap();

    assert!(matches!(
        store.dispatch("x").unwrap_err().kind,
        ErrorKind::StoreNotFound(_)
    ));
    assert!(store.receiver().attach(&handle).is_err());
}
