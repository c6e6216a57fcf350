//! Stores, bindings, change propagation, and action dispatch for flowdown.
//!
//! This crate provides:
//! - [`Registry`] and [`Store`] - Isolated stores keyed by id
//! - [`StateReceiver`] and [`StateProvider`] - Attaching components and the state owner
//! - [`Mutator`] and [`Mutation`] - The dispatch loop and its write capability
//! - [`Binding`] and [`Update`] - Property subscriptions and what they receive
//! - [`Component`] - The host contract, with [`PropertyBag`] as a ready-made property store
//! - [`PropertyMeta`] and [`collect`] - Property declarations and their resolution
//! - [`BindingResolver`] - The seam plugins extend
//!
//! Everything is single-threaded: a dispatch runs its mutators, propagates
//! every change, and fires every component hook before it returns.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod binding;
pub mod component;
pub mod config;
pub mod dispatch;
pub mod metadata;
mod propagate;
pub mod receiver;
pub mod registry;
mod tree;

pub use binding::{Binding, Update, UpdateFn, apply_update};
pub use component::{Component, ComponentRef, PropertyBag, same_component};
pub use config::{MutatorErrorPolicy, StoreConfig};
pub use dispatch::{
    DispatchOutcome, Mutation, Mutator, MutatorFailure, ReplayFailure, ReplayReport,
};
pub use metadata::{Declarations, MetadataChain, Properties, PropertyMeta, collect};
pub use receiver::{BindingResolver, LinkState, ResolveContext, StateProvider, StateReceiver, TreeWriter};
pub use registry::{Registry, Store};
