#![forbid(unsafe_code)]

//! The consumer-facing state handle.
//!
//! # Design
//!
//! [`Wrapped<S>`] owns the raw state `S` in shared, reference-counted
//! storage together with its validated [`StateDefinition`], its
//! [`SubscriberSet`], and the record of collection signals it is wired to.
//! Cloning a `Wrapped` creates a new handle to the **same** state: there is
//! exactly one wrapped cell per raw value.
//!
//! Reads and writes go through [`Field`] descriptors. A write to a field the
//! definition marks observable applies the new value, releases the borrow,
//! and then notifies every subscriber, so callbacks always read the new
//! value.
//!
//! # Wiring
//!
//! Collection fields are connected to the subscriber set once, when the
//! first subscriber arrives, and disconnected once, when the last one
//! leaves:
//!
//! ```text
//! Unwired ──subscribe (0→1)──▶ Wired ──unsubscribe (1→0)──▶ Unwired
//! ```
//!
//! Replacing a collection field while wired moves the wiring to the new
//! collection. Dropping the last handle disconnects any remaining wiring.
//!
//! # Failure Modes
//!
//! - **Re-entrant access**: touching the same state from inside an `update`
//!   closure, or writing it from inside a `with` closure, panics (RefCell
//!   borrow rules). Mutating a collection inside `with` counts, because a wired collection notifies
//!   while the read borrow is still held; mutate the handle returned by
//!   [`Wrapped::get`] instead. Callbacks triggered through `set`, `update`
//!   or a handle from `get` run after the borrow is released and may read,
//!   write, subscribe and unsubscribe freely.
//! - **Panicking `update` closure**: the write is abandoned and no
//!   notification is sent. Collection wiring is restored during unwinding.
//! - **Panicking subscriber**: propagates to the writer unless the factory
//!   was configured with [`CallbackPolicy::Isolate`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::definition::{FieldKind, FieldSpec, State, StateDefinition};
use super::field::Field;
use crate::config::CallbackPolicy;
use crate::error::StateError;
use crate::reactive::{Callback, ChangeSignal, SubscriberSet};

struct StateCell<S: State> {
    raw: RefCell<S>,
    definition: Rc<StateDefinition<S>>,
    subscribers: SubscriberSet,
    /// Attached to every wired collection signal.
    notifier: Callback,
    /// Signals the notifier is currently attached to.
    wiring: RefCell<Vec<ChangeSignal>>,
    wired: Cell<bool>,
}

impl<S: State> StateCell<S> {
    fn wire(&self) {
        let raw = self.raw.borrow();
        let mut wiring = self.wiring.borrow_mut();
        for spec in self.definition.collections() {
            if let Some(signal) = spec.collection_signal(&raw) {
                signal.attach(&self.notifier);
                wiring.push(signal);
            }
        }
        self.wired.set(true);
        debug!(
            state = self.definition.type_name(),
            collections = wiring.len(),
            "wired collection fields"
        );
    }

    fn unwire(&self) {
        let signals = std::mem::take(&mut *self.wiring.borrow_mut());
        for signal in &signals {
            signal.detach(&self.notifier);
        }
        self.wired.set(false);
        debug!(
            state = self.definition.type_name(),
            collections = signals.len(),
            "unwired collection fields"
        );
    }

    fn read_only(&self, field: &'static str) -> StateError {
        StateError::ReadOnlyField {
            type_name: self.definition.type_name(),
            field,
        }
    }
}

impl<S: State> Drop for StateCell<S> {
    fn drop(&mut self) {
        if self.wired.get() {
            self.unwire();
        }
    }
}

/// Unwires on creation and wires again on drop, including during unwinding.
struct Rewire<'a, S: State> {
    cell: &'a StateCell<S>,
}

impl<'a, S: State> Rewire<'a, S> {
    fn new(cell: &'a StateCell<S>) -> Self {
        cell.unwire();
        Self { cell }
    }
}

impl<S: State> Drop for Rewire<'_, S> {
    fn drop(&mut self) {
        self.cell.wire();
    }
}

/// Shared handle to a raw state whose observable writes notify subscribers.
pub struct Wrapped<S: State> {
    cell: Rc<StateCell<S>>,
}

impl<S: State> Clone for Wrapped<S> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<S: State> fmt::Debug for Wrapped<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("state", &self.cell.definition.type_name())
            .field("subscriber_count", &self.cell.subscribers.len())
            .field("wired", &self.cell.wired.get())
            .finish()
    }
}

impl<S: State> Wrapped<S> {
    /// Wrap `raw` using an already validated definition.
    pub(crate) fn new(raw: S, definition: Rc<StateDefinition<S>>, policy: CallbackPolicy) -> Self {
        let subscribers = SubscriberSet::with_policy(policy);
        let notifier = subscribers.notifier();
        Self {
            cell: Rc::new(StateCell {
                raw: RefCell::new(raw),
                definition,
                subscribers,
                notifier,
                wiring: RefCell::new(Vec::new()),
                wired: Cell::new(false),
            }),
        }
    }

    /// The validated schema of this state.
    #[must_use]
    pub fn definition(&self) -> &StateDefinition<S> {
        &self.cell.definition
    }

    /// Clone of the current value of `field`.
    #[must_use]
    pub fn get<V: Clone>(&self, field: &Field<S, V>) -> V {
        field.get(&self.cell.raw.borrow()).clone()
    }

    /// Access the value of `field` by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes this state, directly or through a subscriber
    /// notified by mutating a collection field. Use [`get`](Self::get) to
    /// take a collection handle before mutating it.
    pub fn with<V, R>(&self, field: &Field<S, V>, f: impl FnOnce(&V) -> R) -> R {
        f(field.get(&self.cell.raw.borrow()))
    }

    /// Write `value` into `field`, then notify subscribers if the field is
    /// observable.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::ReadOnlyField`] if `field` is sealed.
    pub fn set<V>(&self, field: &Field<S, V>, value: V) -> Result<(), StateError> {
        self.write(field, |slot| *slot = value)
    }

    /// Mutate `field` in place, then notify subscribers if the field is
    /// observable.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::ReadOnlyField`] if `field` is sealed.
    ///
    /// # Panics
    ///
    /// Panics if `f` accesses this state (RefCell borrow rules).
    pub fn update<V, R>(
        &self,
        field: &Field<S, V>,
        f: impl FnOnce(&mut V) -> R,
    ) -> Result<R, StateError> {
        self.write(field, f)
    }

    fn write<V, R>(&self, field: &Field<S, V>, f: impl FnOnce(&mut V) -> R) -> Result<R, StateError> {
        let cell = &self.cell;
        if !field.is_interceptable() {
            return Err(cell.read_only(field.name()));
        }
        let kind = cell
            .definition
            .spec(field.name())
            .map_or(FieldKind::Plain, FieldSpec::kind);

        // A replaced collection must not keep notifying us.
        let result = {
            let _rewire = (kind == FieldKind::Collection && cell.wired.get())
                .then(|| Rewire::new(cell));
            let mut raw = cell.raw.borrow_mut();
            field.get_mut(&mut raw).map(f)
        };

        let result = result.ok_or_else(|| cell.read_only(field.name()))?;
        if kind.is_observable() {
            cell.subscribers.notify_all();
        }
        Ok(result)
    }

    /// Register `callback`. The first subscriber wires collection fields.
    ///
    /// Subscribing an already registered callback is a no-op.
    pub fn subscribe(&self, callback: &Callback) {
        let cell = &self.cell;
        if cell.subscribers.subscribe(callback) && !cell.wired.get() {
            cell.wire();
        }
    }

    /// Remove `callback`. Removing the last subscriber unwires collection
    /// fields. Unknown callbacks are ignored.
    pub fn unsubscribe(&self, callback: &Callback) {
        let cell = &self.cell;
        if cell.subscribers.unsubscribe(callback) > 0
            && cell.subscribers.is_empty()
            && cell.wired.get()
        {
            cell.unwire();
        }
    }

    /// Subscribe `callback` until the returned guard is dropped.
    ///
    /// The guard unsubscribes the callback even if it was registered before
    /// this call.
    pub fn subscribe_scoped(&self, callback: Callback) -> Subscription {
        self.subscribe(&callback);
        let weak: Weak<StateCell<S>> = Rc::downgrade(&self.cell);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(cell) = weak.upgrade() {
                    Wrapped { cell }.unsubscribe(&callback);
                }
            })),
        }
    }

    /// Invoke every subscriber now.
    pub fn notify(&self) {
        self.cell.subscribers.notify_all();
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.cell.subscribers.len()
    }

    /// Whether `callback` is registered.
    #[must_use]
    pub fn is_subscribed(&self, callback: &Callback) -> bool {
        self.cell.subscribers.contains(callback)
    }

    /// Whether collection fields are currently wired to the subscribers.
    #[must_use]
    pub fn is_wired(&self) -> bool {
        self.cell.wired.get()
    }

    /// Whether both handles refer to the same state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

/// RAII guard returned by [`Wrapped::subscribe_scoped`].
///
/// Dropping the guard unsubscribes its callback. If the state is already
/// gone, dropping does nothing.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
