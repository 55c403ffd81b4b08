#![forbid(unsafe_code)]

//! Dependency injection seam.
//!
//! The runtime does not ship a container. It consumes any [`Injector`] that
//! can turn a type into a shared instance, and state types that need
//! dependencies implement [`Injectable`] to pull them during construction.
//! [`ServiceMap`] is a minimal injector backed by a type map, enough for
//! tests and small applications.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{ResolutionError, ResolutionErrorKind};
use crate::state::State;

/// Resolves services by type.
pub trait Injector {
    /// Produce the service registered for `type_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] if no usable service exists.
    fn resolve_erased(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Rc<dyn Any>, ResolutionError>;
}

impl dyn Injector + '_ {
    /// Produce the service registered for `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] if `T` is not registered or the
    /// registered service is of a different type.
    pub fn resolve<T: 'static>(&self) -> Result<Rc<T>, ResolutionError> {
        self.resolve_erased(TypeId::of::<T>(), type_name::<T>())?
            .downcast::<T>()
            .map_err(|_| ResolutionError::new(type_name::<T>(), ResolutionErrorKind::WrongType))
    }
}

/// A state type constructed with injected dependencies.
pub trait Injectable: State {
    /// Build the raw state, resolving constructor dependencies.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] if a dependency does not resolve.
    fn construct(injector: &dyn Injector) -> Result<Self, ResolutionError>;

    /// Fill field-level dependencies after construction.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] if a dependency does not resolve.
    fn inject_fields(&mut self, _injector: &dyn Injector) -> Result<(), ResolutionError> {
        Ok(())
    }
}

/// Type-keyed service map.
#[derive(Default)]
pub struct ServiceMap {
    services: HashMap<TypeId, Rc<dyn Any>>,
}

impl fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceMap")
            .field("service_count", &self.services.len())
            .finish()
    }
}

impl ServiceMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` as the service for `T`, replacing any previous one.
    pub fn insert<T: 'static>(&mut self, value: T) -> &mut Self {
        self.insert_rc(Rc::new(value))
    }

    /// Register a shared instance as the service for `T`.
    pub fn insert_rc<T: 'static>(&mut self, value: Rc<T>) -> &mut Self {
        self.services.insert(TypeId::of::<T>(), value);
        self
    }

    /// Whether a service for `T` is registered.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }
}

impl Injector for ServiceMap {
    fn resolve_erased(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Rc<dyn Any>, ResolutionError> {
        self.services
            .get(&type_id)
            .cloned()
            .ok_or_else(|| ResolutionError::new(type_name, ResolutionErrorKind::Unregistered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Clock(u64);

    #[test]
    fn resolve_registered_service() {
        let mut services = ServiceMap::new();
        services.insert(Clock(42)).insert(String::from("eu-west"));
        let injector: &dyn Injector = &services;

        assert_eq!(*injector.resolve::<Clock>().unwrap(), Clock(42));
        assert_eq!(injector.resolve::<String>().unwrap().as_str(), "eu-west");
        assert!(services.contains::<String>());
    }

    #[test]
    fn shared_instances_resolve_to_same_rc() {
        let shared = Rc::new(Clock(1));
        let mut services = ServiceMap::new();
        services.insert_rc(Rc::clone(&shared));
        let injector: &dyn Injector = &services;
        assert!(Rc::ptr_eq(&injector.resolve::<Clock>().unwrap(), &shared));
    }

    #[test]
    fn missing_service_is_unregistered() {
        let services = ServiceMap::new();
        let injector: &dyn Injector = &services;
        let err = injector.resolve::<Clock>().unwrap_err();
        assert_eq!(err.kind, ResolutionErrorKind::Unregistered);
        assert!(!services.contains::<Clock>());
    }

    struct Liar;

    impl Injector for Liar {
        fn resolve_erased(
            &self,
            _type_id: TypeId,
            _type_name: &'static str,
        ) -> Result<Rc<dyn Any>, ResolutionError> {
            Ok(Rc::new(0u8))
        }
    }

    #[test]
    fn wrong_concrete_type_is_reported() {
        let injector: &dyn Injector = &Liar;
        let err = injector.resolve::<Clock>().unwrap_err();
        assert_eq!(err.kind, ResolutionErrorKind::WrongType);
    }
}
