#![forbid(unsafe_code)]

//! State lifecycle: schemas, field lenses, wrapping and creation.
//!
//! A state type implements [`State`] and lists its fields through
//! [`Field`] descriptors. A [`StateFactory`] validates the schema once per
//! type and produces [`Wrapped`] handles whose observable writes notify
//! subscribers. Collection fields are wired to those subscribers while at
//! least one is registered.

pub mod definition;
pub mod factory;
pub mod field;
pub mod handle;
pub mod wrapped;

pub use definition::{FieldKind, FieldSpec, State, StateDefinition, describe};
pub use factory::StateFactory;
pub use field::{Field, Getter, Setter};
pub use handle::StateHandle;
pub use wrapped::{Subscription, Wrapped};
