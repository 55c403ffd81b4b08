#![forbid(unsafe_code)]

//! Consumer-side state handle.
//!
//! A [`StateHandle`] is what one consumer (a view, a component) holds. It
//! shares the wrapped state with every other handle but remembers which
//! callbacks it subscribed itself, and drops them when it goes away.

use std::fmt;

use super::definition::State;
use super::wrapped::Wrapped;
use crate::reactive::Callback;

/// Per-consumer view of a [`Wrapped`] state.
pub struct StateHandle<S: State> {
    state: Wrapped<S>,
    callbacks: Vec<Callback>,
}

impl<S: State> fmt::Debug for StateHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandle")
            .field("state", &self.state)
            .field("owned_callbacks", &self.callbacks.len())
            .finish()
    }
}

impl<S: State> StateHandle<S> {
    /// Attach a new consumer to `state`.
    #[must_use]
    pub fn new(state: Wrapped<S>) -> Self {
        Self {
            state,
            callbacks: Vec::new(),
        }
    }

    /// The shared wrapped state.
    #[must_use]
    pub fn state(&self) -> &Wrapped<S> {
        &self.state
    }

    /// Subscribe `callback` on behalf of this consumer.
    pub fn subscribe(&mut self, callback: &Callback) {
        self.state.subscribe(callback);
        if !self.callbacks.iter().any(|owned| owned.ptr_eq(callback)) {
            self.callbacks.push(callback.clone());
        }
    }

    /// Unsubscribe `callback` and forget it.
    pub fn unsubscribe(&mut self, callback: &Callback) {
        self.state.unsubscribe(callback);
        self.callbacks.retain(|owned| !owned.ptr_eq(callback));
    }

    /// Number of callbacks this consumer subscribed and still owns.
    #[must_use]
    pub fn owned_callbacks(&self) -> usize {
        self.callbacks.len()
    }
}

impl<S: State> Drop for StateHandle<S> {
    fn drop(&mut self) {
        for callback in self.callbacks.drain(..) {
            self.state.unsubscribe(&callback);
        }
    }
}
