//! Integration tests for Layer 2: Select
//!
//! Tests for selected-item consistency across splices, index changes, and
//! nested edits.

#[path = "../common/mod.rs"]
mod common;
