#![forbid(unsafe_code)]

//! Registration surface for external containers.
//!
//! A container integration hands the runtime a list of [`TypeCandidate`]s
//! (everything it found while scanning its own types) and gets back one
//! [`StateRegistration`] per state type. Each registration carries a
//! factory closure and a [`ServiceLifetime`], which is all a container needs
//! to expose the state as a constructible service. Built states come back
//! type-erased as [`AnyState`] and are recovered with
//! [`AnyState::downcast`].

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{ResolutionError, ResolutionErrorKind, StateError};
use crate::inject::{Injectable, Injector};
use crate::state::{State, StateFactory, Wrapped};

/// Placeholder type name used when a non-state type is constructed as one.
const STATE_CONTRACT: &str = "a type implementing State";

/// How long a container should keep one built state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceLifetime {
    /// One instance for the whole container.
    Singleton,
    /// One instance per consumer scope.
    #[default]
    Scoped,
    /// A new instance on every request.
    Transient,
}

impl ServiceLifetime {
    /// Parse a lifetime name (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "singleton" => Some(Self::Singleton),
            "scoped" => Some(Self::Scoped),
            "transient" => Some(Self::Transient),
            _ => None,
        }
    }
}

/// Shared factory closure that builds one registered state.
pub type StateBuilder =
    Rc<dyn Fn(&StateFactory, Option<&dyn Injector>) -> Result<AnyState, StateError>>;

/// A type discovered by a container, state or not.
#[derive(Clone)]
pub struct TypeCandidate {
    type_id: TypeId,
    type_name: &'static str,
    builder: Option<StateBuilder>,
}

impl fmt::Debug for TypeCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCandidate")
            .field("type_name", &self.type_name)
            .field("is_state", &self.is_state())
            .finish()
    }
}

impl TypeCandidate {
    /// A state type built through its `Default` implementation. A supplied
    /// injector is not consulted.
    #[must_use]
    pub fn state<S: State + Default>() -> Self {
        let builder: StateBuilder = Rc::new(|factory: &StateFactory, _: Option<&dyn Injector>| {
            factory.create::<S>().map(AnyState::new)
        });
        Self::with_builder::<S>(builder)
    }

    /// A state type built with injected dependencies. Building it without an
    /// injector is a construction error.
    #[must_use]
    pub fn injectable<S: Injectable>() -> Self {
        let builder: StateBuilder =
            Rc::new(|factory: &StateFactory, injector: Option<&dyn Injector>| {
                let Some(injector) = injector else {
                    let type_name = std::any::type_name::<S>();
                    return Err(StateError::Construction {
                        type_name,
                        source: ResolutionError::new(type_name, ResolutionErrorKind::NoInjector),
                    });
                };
                factory.create_with::<S>(injector).map(AnyState::new)
            });
        Self::with_builder::<S>(builder)
    }

    /// Any other type. Scanning skips it and constructing it fails.
    #[must_use]
    pub fn other<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            builder: None,
        }
    }

    fn with_builder<S: State>(builder: StateBuilder) -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: std::any::type_name::<S>(),
            builder: Some(builder),
        }
    }

    /// Type identity of the candidate.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the candidate is a state type.
    #[must_use]
    pub fn is_state(&self) -> bool {
        self.builder.is_some()
    }

    /// Build the candidate as a state.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::TypeMismatch`] if the candidate is not a state
    /// type, otherwise whatever the state's construction returns.
    pub fn construct(
        &self,
        factory: &StateFactory,
        injector: Option<&dyn Injector>,
    ) -> Result<AnyState, StateError> {
        match &self.builder {
            Some(builder) => builder(factory, injector),
            None => Err(StateError::TypeMismatch {
                expected: STATE_CONTRACT,
                found: self.type_name,
            }),
        }
    }
}

/// A state type ready to be registered with a container.
#[derive(Clone)]
pub struct StateRegistration {
    type_id: TypeId,
    type_name: &'static str,
    lifetime: ServiceLifetime,
    builder: StateBuilder,
}

impl fmt::Debug for StateRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRegistration")
            .field("type_name", &self.type_name)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl StateRegistration {
    /// Type identity of the registered state.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Requested service lifetime.
    #[must_use]
    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    /// Build a new wrapped instance.
    ///
    /// # Errors
    ///
    /// Returns whatever the state's validation or construction returns.
    pub fn build(
        &self,
        factory: &StateFactory,
        injector: Option<&dyn Injector>,
    ) -> Result<AnyState, StateError> {
        (self.builder)(factory, injector)
    }

    /// The factory closure, detached from the registration.
    #[must_use]
    pub fn factory(&self) -> StateBuilder {
        Rc::clone(&self.builder)
    }
}

/// Keep the state types among `candidates`, in order.
#[must_use]
pub fn scan(
    candidates: impl IntoIterator<Item = TypeCandidate>,
    lifetime: ServiceLifetime,
) -> Vec<StateRegistration> {
    let registrations: Vec<StateRegistration> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let builder = candidate.builder?;
            Some(StateRegistration {
                type_id: candidate.type_id,
                type_name: candidate.type_name,
                lifetime,
                builder,
            })
        })
        .collect();
    debug!(
        registered = registrations.len(),
        ?lifetime,
        "scanned state candidates"
    );
    registrations
}

/// A wrapped state with its type erased.
#[derive(Clone)]
pub struct AnyState {
    type_id: TypeId,
    type_name: &'static str,
    value: Rc<dyn Any>,
}

impl fmt::Debug for AnyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyState")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl AnyState {
    /// Erase the type of `state`.
    #[must_use]
    pub fn new<S: State>(state: Wrapped<S>) -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: std::any::type_name::<S>(),
            value: Rc::new(state),
        }
    }

    /// Type identity of the held state.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name of the held state.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the held state is an `S`.
    #[must_use]
    pub fn is<S: State>(&self) -> bool {
        self.type_id == TypeId::of::<S>()
    }

    /// Recover the typed handle.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::TypeMismatch`] if the held state is not an `S`.
    pub fn downcast<S: State>(&self) -> Result<Wrapped<S>, StateError> {
        self.value
            .downcast_ref::<Wrapped<S>>()
            .cloned()
            .ok_or(StateError::TypeMismatch {
                expected: std::any::type_name::<S>(),
                found: self.type_name,
            })
    }
}
