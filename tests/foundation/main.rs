//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value trees, paths and change matching, errors.

mod paths;
mod values;
