#![forbid(unsafe_code)]

//! Declarative state schemas.
//!
//! A state type lists its fields once, in [`State::define`]. The schema
//! records which fields are observable and which of those hold observable
//! collections, so the lifecycle code can validate the type and find the
//! collections to wire without any runtime reflection.
//!
//! # Invariants
//!
//! 1. A definition that passed [`validate`](StateDefinition::validate) has
//!    no observable field without a write accessor.
//! 2. Field names are unique within a definition.

use std::fmt;
use std::rc::Rc;

use super::field::Field;
use crate::error::{ConfigurationIssue, StateError};
use crate::reactive::{ChangeSignal, ObservableCollection};

/// A plain struct whose fields can be observed through a
/// [`Wrapped`](super::Wrapped) handle.
pub trait State: Sized + 'static {
    /// Declare the fields of this state type.
    fn define(def: &mut StateDefinition<Self>);
}

/// How a declared field takes part in notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Written without notification.
    Plain,
    /// Every write notifies subscribers.
    Observable,
    /// Holds an observable collection; writes notify and the collection's
    /// own changes are wired to subscribers.
    Collection,
}

impl FieldKind {
    /// Whether writes to the field notify subscribers.
    #[must_use]
    pub const fn is_observable(self) -> bool {
        matches!(self, Self::Observable | Self::Collection)
    }
}

/// Reads the change signal out of a collection-valued field.
trait SignalProbe<S> {
    fn signal(&self, state: &S) -> ChangeSignal;
}

impl<S, V: ObservableCollection> SignalProbe<S> for Field<S, V> {
    fn signal(&self, state: &S) -> ChangeSignal {
        self.get(state).change_signal()
    }
}

/// One declared field.
pub struct FieldSpec<S> {
    name: &'static str,
    kind: FieldKind,
    interceptable: bool,
    probe: Option<Rc<dyn SignalProbe<S>>>,
}

impl<S> fmt::Debug for FieldSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("interceptable", &self.interceptable)
            .finish()
    }
}

impl<S> FieldSpec<S> {
    /// Field name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Notification role of the field.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Change signal of the collection held by this field in `state`.
    pub(crate) fn collection_signal(&self, state: &S) -> Option<ChangeSignal> {
        self.probe.as_ref().map(|probe| probe.signal(state))
    }
}

/// Schema of a state type, built by [`State::define`].
pub struct StateDefinition<S> {
    type_name: &'static str,
    fields: Vec<FieldSpec<S>>,
}

impl<S> fmt::Debug for StateDefinition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDefinition")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<S: 'static> StateDefinition<S> {
    /// Start an empty definition named after `S`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            type_name: std::any::type_name::<S>(),
            fields: Vec::new(),
        }
    }

    /// Declare a plain field.
    pub fn plain<V>(&mut self, field: &Field<S, V>) -> &mut Self {
        self.push(field.name(), FieldKind::Plain, field.is_interceptable(), None)
    }

    /// Declare an observable scalar field.
    pub fn observable<V>(&mut self, field: &Field<S, V>) -> &mut Self {
        self.push(
            field.name(),
            FieldKind::Observable,
            field.is_interceptable(),
            None,
        )
    }

    /// Declare an observable field holding an [`ObservableCollection`].
    pub fn collection<V: ObservableCollection + 'static>(
        &mut self,
        field: &Field<S, V>,
    ) -> &mut Self {
        let probe: Rc<dyn SignalProbe<S>> = Rc::new(*field);
        self.push(
            field.name(),
            FieldKind::Collection,
            field.is_interceptable(),
            Some(probe),
        )
    }

    fn push(
        &mut self,
        name: &'static str,
        kind: FieldKind,
        interceptable: bool,
        probe: Option<Rc<dyn SignalProbe<S>>>,
    ) -> &mut Self {
        self.fields.push(FieldSpec {
            name,
            kind,
            interceptable,
            probe,
        });
        self
    }
}

impl<S: 'static> Default for StateDefinition<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateDefinition<S> {
    /// Fully qualified name of the state type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// All declared fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec<S>] {
        &self.fields
    }

    /// Look up a declared field by name.
    #[must_use]
    pub fn spec(&self, name: &str) -> Option<&FieldSpec<S>> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Whether writes to `name` notify subscribers. Undeclared fields are
    /// plain.
    #[must_use]
    pub fn is_observable(&self, name: &str) -> bool {
        self.spec(name).is_some_and(|spec| spec.kind.is_observable())
    }

    /// Declared collection fields.
    pub fn collections(&self) -> impl Iterator<Item = &FieldSpec<S>> {
        self.fields
            .iter()
            .filter(|spec| spec.kind == FieldKind::Collection)
    }

    /// Check the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Configuration`] if an observable field is not
    /// interceptable or a field name is declared twice.
    pub fn validate(&self) -> Result<(), StateError> {
        for (index, spec) in self.fields.iter().enumerate() {
            if self.fields[..index].iter().any(|prev| prev.name == spec.name) {
                return Err(self.configuration_error(spec, ConfigurationIssue::DuplicateField));
            }
            if spec.kind.is_observable() && !spec.interceptable {
                return Err(self.configuration_error(spec, ConfigurationIssue::NotInterceptable));
            }
        }
        Ok(())
    }

    fn configuration_error(&self, spec: &FieldSpec<S>, issue: ConfigurationIssue) -> StateError {
        StateError::Configuration {
            type_name: self.type_name,
            field: spec.name,
            issue,
        }
    }
}

/// Build the definition of `S` without validating it.
#[must_use]
pub fn describe<S: State>() -> StateDefinition<S> {
    let mut def = StateDefinition::new();
    S::define(&mut def);
    def
}
