//! Integration tests across all layers
//!
//! Tests the whole stack through the `flowdown` facade: a store with the
//! array selector installed, several views, and dispatched actions.

#[path = "../common/mod.rs"]
mod common;

mod scenarios;
