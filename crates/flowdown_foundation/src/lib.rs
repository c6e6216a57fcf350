//! Core types for flowdown: the state tree, paths, and change records.
//!
//! This crate provides:
//! - [`Value`] - The persistent tree every store holds
//! - [`Path`] and [`classify`] - State path notation and change matching
//! - [`ChangeRecord`] and [`SpliceOp`] - The unit of change propagation
//! - [`ValueKind`] - Declared kinds for bound properties
//! - [`StoreId`] - Store identifiers
//! - [`Error`] - Rich error types with context
//! - [`Seq`] and [`Fields`] - Persistent containers behind sequence and map values

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod change;
pub mod collections;
pub mod error;
pub mod id;
pub mod kind;
pub mod path;
pub mod value;

#[cfg(feature = "serde")]
mod serde_support;

pub use change::{ChangeRecord, SpliceOp};
pub use collections::{Fields, Seq};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use id::StoreId;
pub use kind::ValueKind;
pub use path::{Path, PathMatch, classify, rebase};
pub use value::Value;
