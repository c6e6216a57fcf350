//! Integration tests for path notation and change matching
//!
//! Tests path parsing and the classification of change records against
//! bound paths.

use flowdown_foundation::{ChangeRecord, Path, PathMatch, SpliceOp, Value, classify, rebase};

fn set(path: &str) -> ChangeRecord {
    ChangeRecord::set(Path::parse(path).unwrap(), Value::Int(0))
}

// =============================================================================
// Notation
// =============================================================================

#[test]
fn paths_are_rooted_at_state() {
    assert_eq!(Path::root().as_str(), "state");
    assert_eq!(Path::from_link("todos.0").unwrap().as_str(), "state.todos.0");
    assert!("state.todos".parse::<Path>().is_ok());
    assert!("todos".parse::<Path>().is_err());
}

#[test]
fn splice_record_notation() {
    let record = ChangeRecord::splice(Path::state("todos"), vec![SpliceOp::new(0, 1, 2)]);
    assert!(record.is_splice());
    assert_eq!(record.path(), &Path::state("todos"));
    assert!(record.to_string().starts_with("state.todos.splices"));
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn first_match_wins_in_order() {
    let bound = Path::state("todos");

    assert_eq!(classify(&bound, true, &set("state.todos")), PathMatch::Exact);
    assert_eq!(
        classify(
            &bound,
            true,
            &ChangeRecord::splice(Path::state("todos"), vec![SpliceOp::new(0, 0, 1)])
        ),
        PathMatch::Splice { tail: "" }
    );
    assert_eq!(classify(&bound, true, &set("state.todos.length")), PathMatch::LengthOnly);
    assert_eq!(
        classify(&bound, true, &set("state.todos.0.done")),
        PathMatch::Descendant { tail: "0.done" }
    );
    assert_eq!(classify(&bound, true, &set("state")), PathMatch::Ancestor);
    assert_eq!(classify(&bound, true, &set("state.todosx")), PathMatch::Unrelated);
}

#[test]
fn nested_splice_keeps_tail() {
    let bound = Path::state("todos");
    let record = ChangeRecord::splice(Path::state("todos.3.tags"), vec![SpliceOp::new(1, 1, 0)]);

    match classify(&bound, true, &record) {
        PathMatch::Splice { tail } => assert_eq!(rebase("items", tail), "items.3.tags"),
        other => panic!("unexpected match: {other:?}"),
    }
}

#[test]
fn delivery_flags() {
    assert!(PathMatch::Exact.is_delivered());
    assert!(PathMatch::Ancestor.is_delivered());
    assert!(!PathMatch::LengthOnly.is_delivered());
    assert!(!PathMatch::Unrelated.is_delivered());
}
