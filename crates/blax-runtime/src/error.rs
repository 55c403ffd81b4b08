#![forbid(unsafe_code)]

//! Error types for state construction and field access.
//!
//! # Failure Modes
//!
//! | Error | Raised by | Cause |
//! |-------|-----------|-------|
//! | [`StateError::Configuration`] | validation | observable field is sealed, or a field name repeats |
//! | [`StateError::Construction`] | `create_with`, registrations | injector missing or a dependency did not resolve |
//! | [`StateError::TypeMismatch`] | construction by type, `downcast` | type is not a state type, or is a different one |
//! | [`StateError::ReadOnlyField`] | `Wrapped::set` / `update` | write targets a sealed field |
//!
//! All errors are returned synchronously to the caller of the operation
//! that raised them.

use std::fmt;

/// Why a state definition failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationIssue {
    /// The field is observable but has no mutable accessor to intercept.
    NotInterceptable,
    /// The field name is declared more than once.
    DuplicateField,
}

/// Errors from state validation, construction and field writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A state definition is invalid.
    Configuration {
        type_name: &'static str,
        field: &'static str,
        issue: ConfigurationIssue,
    },
    /// The raw state could not be constructed.
    Construction {
        type_name: &'static str,
        source: ResolutionError,
    },
    /// A type was used where a different (state) type was required.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A write targeted a field without a mutable accessor.
    ReadOnlyField {
        type_name: &'static str,
        field: &'static str,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration {
                type_name,
                field,
                issue: ConfigurationIssue::NotInterceptable,
            } => write!(
                f,
                "field '{field}' in state type '{type_name}' is marked observable but is not interceptable"
            ),
            Self::Configuration {
                type_name,
                field,
                issue: ConfigurationIssue::DuplicateField,
            } => write!(
                f,
                "field '{field}' is declared more than once in state type '{type_name}'"
            ),
            Self::Construction { type_name, source } => {
                write!(f, "cannot construct state type '{type_name}': {source}")
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected '{expected}', found '{found}'")
            }
            Self::ReadOnlyField { type_name, field } => {
                write!(f, "field '{field}' in state type '{type_name}' is read-only")
            }
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Construction { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Why an injector could not produce a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    /// Construction needed an injector but none was supplied.
    NoInjector,
    /// No service is registered for the type.
    Unregistered,
    /// The registered service has a different concrete type.
    WrongType,
}

/// A dependency that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionError {
    /// Type that was being resolved.
    pub type_name: &'static str,
    /// What went wrong.
    pub kind: ResolutionErrorKind,
}

impl ResolutionError {
    /// Create a resolution error for `type_name`.
    #[must_use]
    pub fn new(type_name: &'static str, kind: ResolutionErrorKind) -> Self {
        Self { type_name, kind }
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = self.type_name;
        match &self.kind {
            ResolutionErrorKind::NoInjector => {
                write!(f, "no injector supplied to resolve '{type_name}'")
            }
            ResolutionErrorKind::Unregistered => {
                write!(f, "no service registered for '{type_name}'")
            }
            ResolutionErrorKind::WrongType => {
                write!(f, "service registered for '{type_name}' has a different type")
            }
        }
    }
}

impl std::error::Error for ResolutionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn configuration_message_names_field_and_type() {
        let err = StateError::Configuration {
            type_name: "app::Counter",
            field: "count",
            issue: ConfigurationIssue::NotInterceptable,
        };
        let msg = err.to_string();
        assert!(msg.contains("'count'"));
        assert!(msg.contains("'app::Counter'"));
        assert!(msg.contains("not interceptable"));
    }

    #[test]
    fn construction_exposes_source() {
        let err = StateError::Construction {
            type_name: "app::Basket",
            source: ResolutionError::new("alloc::string::String", ResolutionErrorKind::Unregistered),
        };
        assert!(err.to_string().contains("no service registered"));
        let source = err.source().map(ToString::to_string).unwrap_or_default();
        assert!(source.starts_with("no service registered for"));
        assert!(source.contains("String"));
    }

    #[test]
    fn other_variants_have_no_source() {
        let err = StateError::TypeMismatch {
            expected: "a",
            found: "b",
        };
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "type mismatch: expected 'a', found 'b'");
    }
}
