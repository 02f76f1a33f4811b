//! Error types for the service bridge.

use thiserror::Error;

use crate::key::ServiceKey;

/// Dependency injection errors
///
/// Every failure the bridge can report, grouped into three families:
///
/// - **Configuration** ([`InvalidLifetime`](DiError::InvalidLifetime),
///   [`InvalidOption`](DiError::InvalidOption),
///   [`MalformedDescriptor`](DiError::MalformedDescriptor),
///   [`DuplicateRegistration`](DiError::DuplicateRegistration)): programmer
///   errors raised at startup.
/// - **Resolution** ([`NotFound`](DiError::NotFound),
///   [`TypeMismatch`](DiError::TypeMismatch), [`Circular`](DiError::Circular),
///   [`DepthExceeded`](DiError::DepthExceeded),
///   [`NoActiveScope`](DiError::NoActiveScope), [`Factory`](DiError::Factory)).
/// - **Lifecycle** ([`ScopeDisposed`](DiError::ScopeDisposed)): resolving
///   through a scope after it was released.
///
/// # Examples
///
/// ```rust
/// use service_bridge::{DiError, ServiceCollection};
///
/// let bridge = ServiceCollection::new().build().unwrap();
/// match bridge.root_provider().get_required::<String>() {
///     Err(DiError::NotFound(key)) => {
///         assert_eq!(key.type_name(), "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// A lifetime tag outside {Singleton, Scoped, Transient}
    #[error("Invalid lifetime: {0}")]
    InvalidLifetime(String),
    /// Descriptor without exactly one implementation source
    #[error("Malformed descriptor for {service}: {reason}")]
    MalformedDescriptor {
        service: &'static str,
        reason: &'static str,
    },
    /// Container option that could not be parsed
    #[error("Invalid value {value:?} for option {option}")]
    InvalidOption {
        option: &'static str,
        value: String,
    },
    /// Service registered twice under the `Reject` conflict policy
    #[error("Duplicate registration: {0}")]
    DuplicateRegistration(&'static str),
    /// Service not registered; carries the key that missed
    #[error("Service not found: {0}")]
    NotFound(ServiceKey),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Scoped service resolved at root while strict scoping is enabled
    #[error("No active scope to resolve scoped service: {0}")]
    NoActiveScope(&'static str),
    /// Resolution through a scope that was already disposed
    #[error("Scope has been disposed")]
    ScopeDisposed,
    /// A user factory refused to build its service
    #[error("Factory for {service} failed: {message}")]
    Factory {
        service: &'static str,
        message: String,
    },
}

impl DiError {
    /// Builds a [`DiError::Factory`] for service `S`.
    pub fn factory<S: ?Sized + 'static>(message: impl Into<String>) -> Self {
        DiError::Factory {
            service: std::any::type_name::<S>(),
            message: message.into(),
        }
    }

    /// `true` when the requested service simply has no registration.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::NotFound(_))
    }

    /// `true` for startup-time programmer errors.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DiError::InvalidLifetime(_)
                | DiError::InvalidOption { .. }
                | DiError::MalformedDescriptor { .. }
                | DiError::DuplicateRegistration(_)
        )
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
