#![forbid(unsafe_code)]

//! Creation of wrapped states.
//!
//! [`StateFactory`] is an explicit object, not a process-wide singleton: it
//! holds the [`FactoryConfig`] and a per-type cache of validated
//! definitions. The first use of a state type builds and validates its
//! definition; later uses reuse the cached copy.
//!
//! # Invariants
//!
//! 1. Validation runs before any raw value is constructed, so a type with a
//!    bad definition never produces an instance.
//! 2. Only definitions that passed validation are cached.
//! 3. Each `create*` call builds a new raw value and its single wrapped
//!    handle. Deduplicating instances per consumer scope is left to the
//!    caller.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::definition::{State, StateDefinition, describe};
use super::wrapped::Wrapped;
use crate::config::FactoryConfig;
use crate::error::StateError;
use crate::inject::{Injectable, Injector};
use crate::registration::{StateRegistration, TypeCandidate, scan};

/// Builds [`Wrapped`] states and caches validated definitions.
#[derive(Default)]
pub struct StateFactory {
    config: FactoryConfig,
    definitions: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl fmt::Debug for StateFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateFactory")
            .field("config", &self.config)
            .field("validated_types", &self.definitions.borrow().len())
            .finish()
    }
}

impl StateFactory {
    /// Create a factory with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with the given configuration.
    #[must_use]
    pub fn with_config(config: FactoryConfig) -> Self {
        Self {
            config,
            definitions: RefCell::new(HashMap::new()),
        }
    }

    /// The factory's configuration.
    #[must_use]
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Validated definition of `S`, built on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Configuration`] if the definition is invalid.
    pub fn definition<S: State>(&self) -> Result<Rc<StateDefinition<S>>, StateError> {
        let key = TypeId::of::<S>();
        let cached = self.definitions.borrow().get(&key).cloned();
        if let Some(def) = cached.and_then(|any| any.downcast::<StateDefinition<S>>().ok()) {
            return Ok(def);
        }

        let def = describe::<S>();
        def.validate()?;
        debug!(
            state = def.type_name(),
            fields = def.fields().len(),
            "validated state definition"
        );
        let def = Rc::new(def);
        let erased: Rc<dyn Any> = def.clone();
        self.definitions.borrow_mut().insert(key, erased);
        Ok(def)
    }

    /// Validate `S` without constructing it.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Configuration`] if the definition is invalid.
    pub fn validate<S: State>(&self) -> Result<(), StateError> {
        self.definition::<S>().map(|_| ())
    }

    /// Whether `S` has already passed validation on this factory.
    #[must_use]
    pub fn is_validated<S: State>(&self) -> bool {
        self.definitions.borrow().contains_key(&TypeId::of::<S>())
    }

    /// Wrap a raw value the caller already built.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Configuration`] if the definition is invalid.
    pub fn wrap<S: State>(&self, raw: S) -> Result<Wrapped<S>, StateError> {
        let def = self.definition::<S>()?;
        Ok(self.finish(raw, def))
    }

    /// Construct `S` through its no-argument path and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Configuration`] if the definition is invalid.
    pub fn create<S: State + Default>(&self) -> Result<Wrapped<S>, StateError> {
        let def = self.definition::<S>()?;
        Ok(self.finish(S::default(), def))
    }

    /// Construct `S` with dependencies from `injector`, fill its injected
    /// fields, and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Configuration`] if the definition is invalid
    /// and [`StateError::Construction`] if a dependency does not resolve.
    pub fn create_with<S: Injectable>(
        &self,
        injector: &dyn Injector,
    ) -> Result<Wrapped<S>, StateError> {
        let def = self.definition::<S>()?;
        let construction = |source| StateError::Construction {
            type_name: def.type_name(),
            source,
        };
        let mut raw = S::construct(injector).map_err(construction)?;
        raw.inject_fields(injector).map_err(construction)?;
        Ok(self.finish(raw, def))
    }

    /// Keep the state candidates, registered with the configured default
    /// lifetime.
    #[must_use]
    pub fn scan(&self, candidates: impl IntoIterator<Item = TypeCandidate>) -> Vec<StateRegistration> {
        scan(candidates, self.config.default_lifetime)
    }

    fn finish<S: State>(&self, raw: S, def: Rc<StateDefinition<S>>) -> Wrapped<S> {
        debug!(state = def.type_name(), "created wrapped state");
        Wrapped::new(raw, def, self.config.callback_policy)
    }
}
