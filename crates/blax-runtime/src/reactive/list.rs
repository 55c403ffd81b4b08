#![forbid(unsafe_code)]

//! Ordered sequence that signals every structural change.
//!
//! # Design
//!
//! [`ObservableList<T>`] keeps its items in shared, reference-counted storage
//! (`Rc<..>` + `RefCell<Vec<T>>`) next to a [`ChangeSignal`]. Cloning a list
//! creates a new handle to the **same** items and signal, so a state field
//! and a consumer holding a clone observe the same contents.
//!
//! # Invariants
//!
//! 1. Each mutating call that alters the contents emits exactly once, after
//!    the mutation is applied and the storage borrow is released.
//! 2. Batched calls (`clear`, `extend`, `retain`) emit once, not per element.
//! 3. Calls that leave the contents untouched (out-of-range index, absent
//!    item, clearing an empty list) do not emit.
//! 4. Reads never emit.
//!
//! # Failure Modes
//!
//! - **Re-entrant mutation**: mutating the list from inside an `update` or
//!   `retain` closure panics (RefCell borrow rules). Listeners run after
//!   the borrow is released and may freely read or mutate the list.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::signal::{ChangeSignal, ObservableCollection};

struct ListInner<T> {
    items: RefCell<Vec<T>>,
    signal: ChangeSignal,
}

/// A shared vector with a change signal.
pub struct ObservableList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for ObservableList<T> {
    fn default() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &*self.inner.items.borrow())
            .field("listener_count", &self.inner.signal.listener_count())
            .finish()
    }
}

impl<T> From<Vec<T>> for ObservableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T> FromIterator<T> for ObservableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T> ObservableCollection for ObservableList<T> {
    fn change_signal(&self) -> ChangeSignal {
        self.inner.signal.clone()
    }
}

impl<T> ObservableList<T> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list holding `items`. No signal is emitted.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
                signal: ChangeSignal::new(),
            }),
        }
    }

    /// The list's change signal.
    #[must_use]
    pub fn changed(&self) -> &ChangeSignal {
        &self.inner.signal
    }

    /// Whether both handles refer to the same list.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    /// Whether the list has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Access the items by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    /// Append an item.
    pub fn push(&self, value: T) {
        self.inner.items.borrow_mut().push(value);
        self.inner.signal.emit();
    }

    /// Append an item. Alias of [`push`](Self::push).
    pub fn add(&self, value: T) {
        self.push(value);
    }

    /// Insert `value` at `index`, shifting later items right.
    ///
    /// Returns the value back if `index > len`.
    pub fn insert(&self, index: usize, value: T) -> Result<(), T> {
        {
            let mut items = self.inner.items.borrow_mut();
            if index > items.len() {
                return Err(value);
            }
            items.insert(index, value);
        }
        self.inner.signal.emit();
        Ok(())
    }

    /// Remove and return the item at `index`.
    pub fn remove(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        };
        if removed.is_some() {
            self.inner.signal.emit();
        }
        removed
    }

    /// Remove and return the last item.
    pub fn pop(&self) -> Option<T> {
        let popped = self.inner.items.borrow_mut().pop();
        if popped.is_some() {
            self.inner.signal.emit();
        }
        popped
    }

    /// Replace the item at `index`, returning the previous value.
    ///
    /// Returns `Err(value)` if `index` is out of range.
    pub fn set(&self, index: usize, value: T) -> Result<T, T> {
        let old = {
            let mut items = self.inner.items.borrow_mut();
            match items.get_mut(index) {
                Some(slot) => std::mem::replace(slot, value),
                None => return Err(value),
            }
        };
        self.inner.signal.emit();
        Ok(old)
    }

    /// Mutate the item at `index` in place. Returns `false` if out of range.
    pub fn update(&self, index: usize, f: impl FnOnce(&mut T)) -> bool {
        {
            let mut items = self.inner.items.borrow_mut();
            match items.get_mut(index) {
                Some(slot) => f(slot),
                None => return false,
            }
        }
        self.inner.signal.emit();
        true
    }

    /// Remove every item, emitting once.
    pub fn clear(&self) {
        let had_items = {
            let mut items = self.inner.items.borrow_mut();
            let had_items = !items.is_empty();
            items.clear();
            had_items
        };
        if had_items {
            self.inner.signal.emit();
        }
    }

    /// Append every item from `iter`, emitting once if anything was added.
    pub fn extend(&self, iter: impl IntoIterator<Item = T>) {
        let added = {
            let mut items = self.inner.items.borrow_mut();
            let before = items.len();
            items.extend(iter);
            items.len() != before
        };
        if added {
            self.inner.signal.emit();
        }
    }

    /// Keep only the items matching `keep`, emitting once if any were removed.
    pub fn retain(&self, keep: impl FnMut(&T) -> bool) {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            let before = items.len();
            items.retain(keep);
            items.len() != before
        };
        if removed {
            self.inner.signal.emit();
        }
    }
}

impl<T: Clone> ObservableList<T> {
    /// Clone of the item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Clone of all items.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }
}

impl<T: PartialEq> ObservableList<T> {
    /// Whether the list contains `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.inner.items.borrow().contains(value)
    }

    /// Remove the first item equal to `value`. Returns `false` if absent.
    pub fn remove_item(&self, value: &T) -> bool {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            match items.iter().position(|item| item == value) {
                Some(pos) => {
                    items.remove(pos);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.inner.signal.emit();
        }
        removed
    }
}
