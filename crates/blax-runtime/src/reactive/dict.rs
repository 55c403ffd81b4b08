#![forbid(unsafe_code)]

//! Key-value map that signals every structural change.
//!
//! [`ObservableDict<K, V>`] mirrors [`ObservableList`](super::ObservableList):
//! shared `Rc` storage, a [`ChangeSignal`] emitted once per altering call,
//! and silence for calls that leave the map untouched.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use super::signal::{ChangeSignal, ObservableCollection};

struct DictInner<K, V> {
    entries: RefCell<HashMap<K, V>>,
    signal: ChangeSignal,
}

/// A shared hash map with a change signal.
pub struct ObservableDict<K, V> {
    inner: Rc<DictInner<K, V>>,
}

impl<K, V> Clone for ObservableDict<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for ObservableDict<K, V> {
    fn default() -> Self {
        Self::from_map(HashMap::new())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableDict<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableDict")
            .field("entries", &*self.inner.entries.borrow())
            .field("listener_count", &self.inner.signal.listener_count())
            .finish()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for ObservableDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl<K, V> ObservableCollection for ObservableDict<K, V> {
    fn change_signal(&self) -> ChangeSignal {
        self.inner.signal.clone()
    }
}

impl<K, V> ObservableDict<K, V> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map holding `entries`. No signal is emitted.
    #[must_use]
    pub fn from_map(entries: HashMap<K, V>) -> Self {
        Self {
            inner: Rc::new(DictInner {
                entries: RefCell::new(entries),
                signal: ChangeSignal::new(),
            }),
        }
    }

    /// The map's change signal.
    #[must_use]
    pub fn changed(&self) -> &ChangeSignal {
        &self.inner.signal
    }

    /// Whether both handles refer to the same map.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Access the entries by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&HashMap<K, V>) -> R) -> R {
        f(&self.inner.entries.borrow())
    }

    /// Remove every entry, emitting once.
    pub fn clear(&self) {
        let had_entries = {
            let mut entries = self.inner.entries.borrow_mut();
            let had_entries = !entries.is_empty();
            entries.clear();
            had_entries
        };
        if had_entries {
            self.inner.signal.emit();
        }
    }

    /// Keep only the entries matching `keep`, emitting once if any were removed.
    pub fn retain(&self, keep: impl FnMut(&K, &mut V) -> bool) {
        let removed = {
            let mut entries = self.inner.entries.borrow_mut();
            let before = entries.len();
            entries.retain(keep);
            entries.len() != before
        };
        if removed {
            self.inner.signal.emit();
        }
    }
}

impl<K: Eq + Hash, V> ObservableDict<K, V> {
    /// Insert or overwrite the value for `key`, returning the previous value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let old = self.inner.entries.borrow_mut().insert(key, value);
        self.inner.signal.emit();
        old
    }

    /// Remove the entry for `key`.
    pub fn remove(&self, key: &K) -> Option<V> {
        let removed = self.inner.entries.borrow_mut().remove(key);
        if removed.is_some() {
            self.inner.signal.emit();
        }
        removed
    }

    /// Mutate the value for `key` in place. Returns `false` if absent.
    pub fn update(&self, key: &K, f: impl FnOnce(&mut V)) -> bool {
        {
            let mut entries = self.inner.entries.borrow_mut();
            match entries.get_mut(key) {
                Some(value) => f(value),
                None => return false,
            }
        }
        self.inner.signal.emit();
        true
    }

    /// Insert every entry from `iter`, emitting once if anything was given.
    pub fn extend(&self, iter: impl IntoIterator<Item = (K, V)>) {
        let mut touched = false;
        {
            let mut entries = self.inner.entries.borrow_mut();
            for (key, value) in iter {
                entries.insert(key, value);
                touched = true;
            }
        }
        if touched {
            self.inner.signal.emit();
        }
    }

    /// Whether the map has an entry for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.entries.borrow().contains_key(key)
    }
}

impl<K: Eq + Hash, V: Clone> ObservableDict<K, V> {
    /// Clone of the value for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.entries.borrow().get(key).cloned()
    }
}

impl<K: Clone, V> ObservableDict<K, V> {
    /// Clone of all keys, in unspecified order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.inner.entries.borrow().keys().cloned().collect()
    }
}
