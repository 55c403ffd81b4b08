#![forbid(unsafe_code)]

//! Typed field descriptors.
//!
//! A [`Field<S, V>`] names one field of a state struct `S` and carries plain
//! function pointers to read it and, when the field is interceptable, to
//! write it. [`Wrapped`](super::Wrapped) routes every consumer read and
//! write through these descriptors, which is where writes to observable
//! fields get their notification.
//!
//! Descriptors are `const`-constructible so they can live as associated
//! constants next to the struct they describe:
//!
//! ```
//! use blax_runtime::field;
//! use blax_runtime::state::Field;
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i32,
//!     id: u64,
//! }
//!
//! impl Counter {
//!     const COUNT: Field<Counter, i32> = field!(Counter, count);
//!     const ID: Field<Counter, u64> = field!(sealed Counter, id);
//! }
//!
//! assert!(Counter::COUNT.is_interceptable());
//! assert!(!Counter::ID.is_interceptable());
//! ```

use std::fmt;

/// Read accessor for a field.
pub type Getter<S, V> = fn(&S) -> &V;
/// Write accessor for a field.
pub type Setter<S, V> = fn(&mut S) -> &mut V;

/// Descriptor for field `V` of state struct `S`.
pub struct Field<S, V> {
    name: &'static str,
    get: Getter<S, V>,
    get_mut: Option<Setter<S, V>>,
}

// Manual impls: fn pointers are Copy regardless of S and V.
impl<S, V> Clone for Field<S, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, V> Copy for Field<S, V> {}

impl<S, V> fmt::Debug for Field<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("interceptable", &self.is_interceptable())
            .finish()
    }
}

impl<S, V> Field<S, V> {
    /// Describe an interceptable field with read and write accessors.
    #[must_use]
    pub const fn new(name: &'static str, get: Getter<S, V>, get_mut: Setter<S, V>) -> Self {
        Self {
            name,
            get,
            get_mut: Some(get_mut),
        }
    }

    /// Describe a sealed field: readable, but not writable through a
    /// wrapped state and therefore never observable.
    #[must_use]
    pub const fn sealed(name: &'static str, get: Getter<S, V>) -> Self {
        Self {
            name,
            get,
            get_mut: None,
        }
    }

    /// Field name as declared.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether writes to this field can be intercepted.
    #[must_use]
    pub const fn is_interceptable(&self) -> bool {
        self.get_mut.is_some()
    }

    /// Borrow the field from a raw state.
    #[must_use]
    pub fn get<'a>(&self, state: &'a S) -> &'a V {
        (self.get)(state)
    }

    /// Mutably borrow the field, if it is interceptable.
    pub fn get_mut<'a>(&self, state: &'a mut S) -> Option<&'a mut V> {
        self.get_mut.map(|get_mut| get_mut(state))
    }
}

/// Build a [`Field`] descriptor for a named struct field.
///
/// `field!(Type, name)` produces an interceptable descriptor and
/// `field!(sealed Type, name)` a read-only one.
#[macro_export]
macro_rules! field {
    (sealed $state:ty, $name:ident) => {
        $crate::state::Field::<$state, _>::sealed(stringify!($name), |s| &s.$name)
    };
    ($state:ty, $name:ident) => {
        $crate::state::Field::<$state, _>::new(
            stringify!($name),
            |s| &s.$name,
            |s| &mut s.$name,
        )
    };
}
