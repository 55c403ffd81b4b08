#![forbid(unsafe_code)]

//! Change-notification primitives.
//!
//! - [`Callback`]: a zero-argument subscriber with pointer identity.
//! - [`SubscriberSet`]: ordered, duplicate-free set of callbacks for one
//!   state instance.
//! - [`ChangeSignal`]: payload-free observer list owned by a collection.
//! - [`ObservableList`] / [`ObservableDict`]: containers that emit their
//!   signal once per structural change.
//!
//! # Architecture
//!
//! Everything here uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Handles are cheap to clone and clones share state. Borrows are
//! always released before any callback runs, so callbacks may read or mutate
//! the container that notified them.
//!
//! # Invariants
//!
//! 1. Callbacks run in registration order.
//! 2. A notification pass iterates a snapshot of its callbacks.
//! 3. A collection emits exactly once per altering call, never on reads.
//! 4. None of these primitives know about state wrapping; collections are
//!    connected to a state's subscribers by the wiring in
//!    [`state`](crate::state).

pub mod dict;
pub mod list;
pub mod registry;
pub mod signal;

pub use dict::ObservableDict;
pub use list::ObservableList;
pub use registry::{Callback, SubscriberSet};
pub use signal::{ChangeSignal, ObservableCollection};
