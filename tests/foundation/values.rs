//! Integration tests for the state tree value type
//!
//! Tests construction, tree access, persistent updates, and display.

use flowdown_foundation::{ErrorKind, Seq, SpliceOp, Value, ValueKind};

fn todos() -> Value {
    Value::from_entries([
        (
            "todos",
            Value::from(vec![
                Value::from_entries([("title", Value::from("write")), ("done", Value::Bool(false))]),
                Value::from_entries([("title", Value::from("test")), ("done", Value::Bool(true))]),
            ]),
        ),
        ("filter", Value::from("all")),
    ])
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn nil_is_default() {
    assert!(Value::default().is_nil());
    assert_eq!(Value::from(None::<i64>), Value::Nil);
}

#[test]
fn scalar_conversions() {
    assert_eq!(Value::from(3).as_int(), Some(3));
    assert_eq!(Value::from(1.5).as_float(), Some(1.5));
    assert_eq!(Value::from(2).as_number(), Some(2.0));
    assert_eq!(Value::from("x").as_str(), Some("x"));
    assert_eq!(Value::from(true).as_bool(), Some(true));
}

#[test]
fn kinds() {
    assert_eq!(ValueKind::of(&todos()), ValueKind::Object);
    assert_eq!(ValueKind::of(&Value::from(vec![1i64])), ValueKind::Array);
    assert!(ValueKind::Array.accepts(&Value::Nil));
    assert!(!ValueKind::Array.accepts(&Value::Int(1)));
}

// =============================================================================
// Tree Access
// =============================================================================

#[test]
fn get_in_walks_maps_and_sequences() {
    let tree = todos();
    assert_eq!(tree.get_in(["todos", "1", "title"]), Some(&Value::from("test")));
    assert_eq!(tree.get_in(["todos", "2", "title"]), None);
    assert_eq!(tree.get_in(["filter", "x"]), None);
}

#[test]
fn assoc_in_shares_untouched_siblings() {
    let tree = todos();
    let updated = tree.assoc_in(&["todos", "0", "done"], Value::Bool(true)).unwrap();

    assert_eq!(updated.get_in(["todos", "0", "done"]), Some(&Value::Bool(true)));
    assert_eq!(tree.get_in(["todos", "0", "done"]), Some(&Value::Bool(false)));
    assert_eq!(updated.get("filter"), tree.get("filter"));
}

#[test]
fn assoc_in_rejects_sequence_growth() {
    let err = todos()
        .assoc_in(&["todos", "5"], Value::Nil)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IndexOutOfBounds { index: 5, length: 2 }));
}

#[test]
fn update_in_reports_missing_segment() {
    let err = todos()
        .update_in(&["todos", "0", "tags", "x"], |v| Ok((v.clone(), ())))
        .unwrap_err();
    match err.kind {
        ErrorKind::PathNotFound(path) => assert_eq!(path, "todos.0.tags"),
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[test]
fn as_key_normalises_indexes() {
    assert_eq!(Value::Int(2).as_key().as_deref(), Some("2"));
    assert_eq!(Value::from("k").as_key().as_deref(), Some("k"));
    assert_eq!(Value::Nil.as_key(), None);
}

// =============================================================================
// Collections
// =============================================================================

#[test]
fn seq_splice_clamps_and_reports() {
    let v: Seq = (0..5).map(Value::Int).collect();
    let (spliced, op, removed) = v.splice(3, 10, [Value::Int(9)]);

    assert_eq!(removed, vec![Value::Int(3), Value::Int(4)]);
    assert_eq!(op, SpliceOp::new(3, 2, 1));
    assert_eq!(Value::Vec(spliced), Value::from(vec![0i64, 1, 2, 9]));
    assert_eq!(v.len(), 5);
}

// =============================================================================
// Display
// =============================================================================

#[test]
fn display_is_compact() {
    let tree = Value::from_entries([("a", Value::from(vec![1i64, 2]))]);
    assert_eq!(tree.to_string(), "{a: [1, 2]}");
}
