#![forbid(unsafe_code)]

//! Factory configuration.
//!
//! Settings can be built in code with the `with_*` builders or read from the
//! environment:
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `BLAX_CALLBACK_POLICY` | `propagate`, `isolate` | `propagate` |
//! | `BLAX_DEFAULT_LIFETIME` | `singleton`, `scoped`, `transient` | `scoped` |
//!
//! Unrecognized values fall back to the default.

use crate::registration::ServiceLifetime;

/// How a subscriber set reacts to a panicking callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallbackPolicy {
    /// Let the panic unwind to whatever triggered the notification.
    #[default]
    Propagate,
    /// Catch the panic, log it, and keep notifying the remaining callbacks.
    Isolate,
}

impl CallbackPolicy {
    /// Parse a policy name (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "propagate" => Some(Self::Propagate),
            "isolate" => Some(Self::Isolate),
            _ => None,
        }
    }
}

/// Configuration for a [`StateFactory`](crate::state::StateFactory).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Panic policy given to every subscriber set the factory creates.
    pub callback_policy: CallbackPolicy,
    /// Lifetime used by [`scan`](crate::registration::scan) callers that do
    /// not pick one explicitly.
    pub default_lifetime: ServiceLifetime,
}

impl FactoryConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read settings using a custom environment lookup.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(policy) = get_env("BLAX_CALLBACK_POLICY")
            .as_deref()
            .and_then(CallbackPolicy::parse)
        {
            config.callback_policy = policy;
        }
        if let Some(lifetime) = get_env("BLAX_DEFAULT_LIFETIME")
            .as_deref()
            .and_then(ServiceLifetime::parse)
        {
            config.default_lifetime = lifetime;
        }
        config
    }

    /// Set the callback panic policy.
    #[must_use]
    pub fn with_callback_policy(mut self, policy: CallbackPolicy) -> Self {
        self.callback_policy = policy;
        self
    }

    /// Set the default service lifetime.
    #[must_use]
    pub fn with_default_lifetime(mut self, lifetime: ServiceLifetime) -> Self {
        self.default_lifetime = lifetime;
        self
    }
}
