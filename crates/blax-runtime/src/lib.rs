#![forbid(unsafe_code)]

//! Reactive state containers for UI-style applications.
//!
//! # Role in Blax
//! `blax-runtime` turns plain structs into observable state. Consumers read
//! and write through a [`Wrapped`] handle; writes to observable fields and
//! changes inside observable collections notify every subscriber.
//!
//! # Primary responsibilities
//! - **Reactive primitives**: [`Callback`], [`SubscriberSet`], and the
//!   [`ObservableList`] / [`ObservableDict`] collections.
//! - **State schemas**: [`State`] definitions built from [`Field`] lenses and
//!   validated before any instance exists.
//! - **Lifecycle**: [`StateFactory`] creation, auto-wiring of collection
//!   fields while subscribers exist, and per-consumer [`StateHandle`]s.
//! - **Container seam**: [`Injector`] / [`Injectable`] for dependencies and
//!   [`registration`] for scanning types into service registrations.
//!
//! # How it fits in the system
//! A view layer subscribes a redraw callback through a [`StateHandle`] and
//! reads fields during render. Business code mutates the same state through
//! another handle. Nothing here is thread-safe; states live on the thread
//! that created them.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use blax_runtime::{Callback, Field, ObservableList, State, StateDefinition, StateFactory, field};
//!
//! #[derive(Default)]
//! struct Todo {
//!     title: String,
//!     items: ObservableList<String>,
//! }
//!
//! impl Todo {
//!     const TITLE: Field<Todo, String> = field!(Todo, title);
//!     const ITEMS: Field<Todo, ObservableList<String>> = field!(Todo, items);
//! }
//!
//! impl State for Todo {
//!     fn define(def: &mut StateDefinition<Self>) {
//!         def.observable(&Self::TITLE).collection(&Self::ITEMS);
//!     }
//! }
//!
//! let factory = StateFactory::new();
//! let todo = factory.create::<Todo>().unwrap();
//!
//! let renders = Rc::new(Cell::new(0));
//! let renders_clone = Rc::clone(&renders);
//! todo.subscribe(&Callback::new(move || renders_clone.set(renders_clone.get() + 1)));
//!
//! todo.set(&Todo::TITLE, "groceries".to_string()).unwrap();
//! todo.get(&Todo::ITEMS).add("milk".to_string());
//! assert_eq!(renders.get(), 2);
//! ```

pub mod config;
pub mod error;
pub mod inject;
pub mod reactive;
pub mod registration;
pub mod state;

pub use config::{CallbackPolicy, FactoryConfig};
pub use error::{ConfigurationIssue, ResolutionError, ResolutionErrorKind, StateError};
pub use inject::{Injectable, Injector, ServiceMap};
pub use reactive::{
    Callback, ChangeSignal, ObservableCollection, ObservableDict, ObservableList, SubscriberSet,
};
pub use registration::{AnyState, ServiceLifetime, StateRegistration, TypeCandidate};
pub use state::{
    Field, FieldKind, State, StateDefinition, StateFactory, StateHandle, Subscription, Wrapped,
};
