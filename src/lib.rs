//! Flowdown - Unidirectional state store with path-scoped change propagation
//!
//! This crate re-exports all layers of the flowdown system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: flowdown_select     Selected-item consistency across splices
//! Layer 1: flowdown_store      Registry, bindings, propagation, dispatch
//! Layer 0: flowdown_foundation Core types (Value, Path, ChangeRecord, Error)
//! ```

pub use flowdown_foundation as foundation;
pub use flowdown_select as select;
pub use flowdown_store as store;
