//! The container capability boundary.
//!
//! The bridge talks to a container only through the traits in this module:
//! [`Registrar`] (register), [`ContainerScope`] (resolve, open a scope,
//! dispose) and [`Container`], which ties both to a root scope. Values cross
//! the boundary type-erased as [`AnyArc`]; registrations cross it as the
//! neutral [`Registration`] type. Nothing container-specific leaks out.
//!
//! [`NativeContainer`] is the implementation shipped with the crate.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::lifetime::Reuse;
use crate::traits::Dispose;

pub mod context;
pub mod native;

pub use context::ResolverContext;
pub use native::NativeContainer;

/// Type-erased service value.
///
/// A service `S` is always stored as an `Arc<S>` boxed behind this `Arc`, which
/// lets sized types and `dyn Trait` objects share one representation.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Erases a service value for storage.
#[inline]
pub(crate) fn erase<S: ?Sized + Send + Sync + 'static>(value: Arc<S>) -> AnyArc {
    Arc::new(value)
}

/// Recovers a service value erased by [`erase`].
#[inline]
pub(crate) fn downcast<S: ?Sized + Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<S>> {
    any.downcast::<Arc<S>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<S>()))
}

/// Output of a constructor: the value plus, optionally, the handle that
/// disposes it.
pub struct Constructed {
    pub value: AnyArc,
    pub disposable: Option<Arc<dyn Dispose>>,
}

impl Constructed {
    pub fn new(value: AnyArc) -> Self {
        Self { value, disposable: None }
    }

    pub fn with_disposable(value: AnyArc, disposable: Option<Arc<dyn Dispose>>) -> Self {
        Self { value, disposable }
    }
}

/// Constructor invoked by the container, receiving the resolving scope.
pub type Ctor = Arc<dyn Fn(&ResolverContext) -> DiResult<Constructed> + Send + Sync>;

/// How a registration produces its value.
#[derive(Clone)]
pub enum Activation {
    /// Built from an implementation type; `implementation` identifies the type
    /// so that re-registering the same pair can be detected.
    Constructor {
        implementation: ServiceKey,
        ctor: Ctor,
    },
    /// Built by an opaque delegate.
    Delegate(Ctor),
    /// A value supplied up front and owned by the caller.
    Instance(AnyArc),
}

/// A container-neutral registration.
#[derive(Clone)]
pub struct Registration {
    pub(crate) reuse: Reuse,
    pub(crate) activation: Activation,
    pub(crate) append: bool,
    pub(crate) root_expected: bool,
}

impl Registration {
    /// Registration backed by an implementation type.
    pub fn constructor(reuse: Reuse, implementation: ServiceKey, ctor: Ctor) -> Self {
        Self {
            reuse,
            activation: Activation::Constructor { implementation, ctor },
            append: false,
            root_expected: false,
        }
    }

    /// Registration backed by a delegate.
    pub fn delegate(reuse: Reuse, ctor: Ctor) -> Self {
        Self {
            reuse,
            activation: Activation::Delegate(ctor),
            append: false,
            root_expected: false,
        }
    }

    /// Registration of a pre-built value. Always appended next to existing
    /// registrations of the same service, whatever the conflict policy.
    pub fn instance(value: AnyArc) -> Self {
        Self {
            reuse: Reuse::Singleton,
            activation: Activation::Instance(value),
            append: true,
            root_expected: false,
        }
    }

    /// Marks a scoped registration as meant to be resolved at the root too,
    /// so the process-wide fallback is not reported as a warning.
    pub fn expected_at_root(mut self) -> Self {
        self.root_expected = true;
        self
    }

    pub fn reuse(&self) -> Reuse {
        self.reuse
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    /// Implementation type, for constructor registrations.
    pub fn implementation(&self) -> Option<ServiceKey> {
        match &self.activation {
            Activation::Constructor { implementation, .. } => Some(*implementation),
            _ => None,
        }
    }

    pub fn is_append_only(&self) -> bool {
        self.append
    }
}

/// Write side of a container.
pub trait Registrar: Send + Sync {
    /// Registers `registration` under `key`, applying the container's
    /// conflict policy.
    ///
    /// Returns `Ok(false)` when the policy decided to keep the existing
    /// registrations untouched.
    fn register(&self, key: ServiceKey, registration: Registration) -> DiResult<bool>;

    /// Number of registrations currently held for `key`.
    fn registration_count(&self, key: &ServiceKey) -> usize;

    fn is_registered(&self, key: &ServiceKey) -> bool {
        self.registration_count(key) > 0
    }
}

/// A resolution scope: the root container or one of its nested scopes.
///
/// States: active until [`dispose`](ContainerScope::dispose) is called, then
/// disposed for good. Every resolution attempted on a disposed scope fails
/// with [`DiError::ScopeDisposed`].
pub trait ContainerScope: Send + Sync {
    /// Resolves the last registration of `key`.
    fn resolve(&self, key: &ServiceKey) -> DiResult<AnyArc>;

    /// Resolves every registration of `key` in registration order.
    fn resolve_all(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>>;

    /// Opens a nested scope owned by the caller.
    fn open_scope(&self) -> DiResult<Arc<dyn ContainerScope>>;

    /// Releases everything this scope owns.
    ///
    /// Returns `false` if the scope was already disposed; the second call
    /// does nothing.
    fn dispose(&self) -> bool;

    fn is_disposed(&self) -> bool;

    /// `true` for the container's root scope.
    fn is_root(&self) -> bool;

    /// Takes ownership of `disposable`, releasing it with this scope.
    fn track(&self, disposable: Arc<dyn Dispose>) -> DiResult<()>;

    /// Process-unique scope number, for diagnostics.
    fn scope_id(&self) -> u64;
}

/// A complete container: a registrar with a root scope.
pub trait Container: Registrar + ContainerScope {
    /// The root scope as a shareable handle.
    fn root_scope(self: Arc<Self>) -> Arc<dyn ContainerScope>;

    /// This container seen as its raw registrar.
    fn registrar(&self) -> &dyn Registrar;
}
