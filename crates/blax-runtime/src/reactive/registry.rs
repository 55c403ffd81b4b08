#![forbid(unsafe_code)]

//! Subscriber callbacks and the per-state subscriber set.
//!
//! # Design
//!
//! A [`Callback`] is a zero-argument function stored behind an `Rc`. Two
//! callbacks are the same subscriber when they share the same allocation,
//! so cloning a `Callback` and subscribing both clones registers it once.
//!
//! [`SubscriberSet`] is a shared, ordered set of callbacks. Cloning the set
//! creates a new handle to the **same** subscribers.
//!
//! # Invariants
//!
//! 1. A callback appears at most once in the set.
//! 2. `notify_all()` invokes callbacks in subscription order.
//! 3. `notify_all()` iterates a snapshot: subscribing or unsubscribing from
//!    inside a callback only affects the next pass.
//!
//! # Failure Modes
//!
//! - **Panicking callback**: with [`CallbackPolicy::Propagate`] the panic
//!   unwinds out of `notify_all()` and the remaining callbacks in the pass
//!   are skipped. With [`CallbackPolicy::Isolate`] the panic is logged and
//!   the pass continues.

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use crate::config::CallbackPolicy;

/// A zero-argument change callback with pointer identity.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn()>);

impl Callback {
    /// Wrap a closure as a callback.
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self) {
        (self.0)()
    }

    /// Whether both handles refer to the same callback.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

struct SubscriberInner {
    callbacks: Vec<Callback>,
    policy: CallbackPolicy,
}

/// Ordered set of unique callbacks for one state instance.
#[derive(Clone)]
pub struct SubscriberSet {
    inner: Rc<RefCell<SubscriberInner>>,
}

impl Default for SubscriberSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SubscriberSet")
            .field("subscriber_count", &inner.callbacks.len())
            .field("policy", &inner.policy)
            .finish()
    }
}

impl SubscriberSet {
    /// Create an empty set that lets callback panics propagate.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(CallbackPolicy::Propagate)
    }

    /// Create an empty set with the given panic policy.
    #[must_use]
    pub fn with_policy(policy: CallbackPolicy) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubscriberInner {
                callbacks: Vec::new(),
                policy,
            })),
        }
    }

    /// Add `callback` unless it is already present.
    ///
    /// Returns `true` if the callback was newly added.
    pub fn subscribe(&self, callback: &Callback) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.callbacks.iter().any(|c| c.ptr_eq(callback)) {
            return false;
        }
        inner.callbacks.push(callback.clone());
        true
    }

    /// Remove every occurrence of `callback`. Absent callbacks are ignored.
    ///
    /// Returns the number of entries removed.
    pub fn unsubscribe(&self, callback: &Callback) -> usize {
        let mut inner = self.inner.borrow_mut();
        let before = inner.callbacks.len();
        inner.callbacks.retain(|c| !c.ptr_eq(callback));
        before - inner.callbacks.len()
    }

    /// Whether `callback` is currently subscribed.
    #[must_use]
    pub fn contains(&self, callback: &Callback) -> bool {
        self.inner
            .borrow()
            .callbacks
            .iter()
            .any(|c| c.ptr_eq(callback))
    }

    /// Number of subscribed callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }

    /// Whether no callback is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().callbacks.is_empty()
    }

    /// Invoke every subscribed callback in subscription order.
    pub fn notify_all(&self) {
        // Snapshot first so callbacks can mutate the set.
        let (callbacks, policy) = {
            let inner = self.inner.borrow();
            (inner.callbacks.clone(), inner.policy)
        };
        trace!(subscribers = callbacks.len(), "notifying subscribers");

        for (index, cb) in callbacks.iter().enumerate() {
            match policy {
                CallbackPolicy::Propagate => cb.call(),
                CallbackPolicy::Isolate => {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| cb.call())) {
                        warn!(
                            subscriber = index,
                            reason = panic_message(payload.as_ref()),
                            "subscriber panicked during notification"
                        );
                    }
                }
            }
        }
    }

    /// A callback that runs `notify_all()` on this set for as long as the
    /// set is alive.
    ///
    /// The callback holds a weak reference, so attaching it to a collection
    /// owned by the same state does not create a reference cycle.
    #[must_use]
    pub fn notifier(&self) -> Callback {
        let weak: Weak<RefCell<SubscriberInner>> = Rc::downgrade(&self.inner);
        Callback::new(move || {
            if let Some(inner) = weak.upgrade() {
                SubscriberSet { inner }.notify_all();
            }
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
