#![forbid(unsafe_code)]

//! Payload-free change signal owned by an observable collection.
//!
//! A [`ChangeSignal`] is a local observer list: listeners are attached and
//! detached by [`Callback`] identity and invoked in attach order on every
//! [`emit()`](ChangeSignal::emit). Cloning the signal creates a new handle to
//! the same listener list, which is how wiring code keeps a record of the
//! signals it attached to.
//!
//! # Invariants
//!
//! 1. A listener is attached at most once.
//! 2. Detaching a listener that is not attached is a no-op.
//! 3. `emit()` iterates a snapshot of the listeners.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::registry::Callback;

/// Change event channel with no payload beyond "something changed".
#[derive(Clone, Default)]
pub struct ChangeSignal {
    listeners: Rc<RefCell<Vec<Callback>>>,
}

impl fmt::Debug for ChangeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSignal")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

impl ChangeSignal {
    /// Create a signal with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener. Returns `false` if it was already attached.
    pub fn attach(&self, listener: &Callback) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.iter().any(|l| l.ptr_eq(listener)) {
            return false;
        }
        listeners.push(listener.clone());
        true
    }

    /// Detach a listener. Returns `false` if it was not attached.
    pub fn detach(&self, listener: &Callback) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| !l.ptr_eq(listener));
        listeners.len() != before
    }

    /// Whether `listener` is attached.
    #[must_use]
    pub fn is_attached(&self, listener: &Callback) -> bool {
        self.listeners.borrow().iter().any(|l| l.ptr_eq(listener))
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Whether both handles refer to the same signal.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.listeners, &other.listeners)
    }

    /// Invoke every attached listener once.
    pub fn emit(&self) {
        let snapshot: Vec<Callback> = self.listeners.borrow().clone();
        for listener in &snapshot {
            listener.call();
        }
    }
}

/// A container whose structural mutations fire a [`ChangeSignal`].
///
/// State wiring uses this trait to find the signal of every observable
/// collection field without knowing the element types.
pub trait ObservableCollection {
    /// Handle to the collection's change signal.
    fn change_signal(&self) -> ChangeSignal;
}
