//! Scope creation for units of work.
//!
//! A [`ScopeFactory`] opens nested scopes from a parent scope. Each new scope
//! gets its own [`ScopeContext`], which adopts the scope so that services
//! holding on to "the current container" see the scope they were built in.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

use crate::container::ContainerScope;
use crate::error::{DiError, DiResult};
use crate::provider::{ScopedProvider, UnresolvedPolicy};

struct Adopted {
    scope: Weak<dyn ContainerScope>,
    unresolved: Option<UnresolvedPolicy>,
}

/// Per-scope lifecycle manager.
///
/// Registered as a scoped service. The scope factory resolves it inside every
/// new scope and makes it adopt that scope; the bridge does the same for the
/// root. Services that need to reach the container later, instead of
/// resolving everything up front, depend on `ScopeContext` and call
/// [`provider`](ScopeContext::provider) when needed.
///
/// The adopted scope is held weakly: a `ScopeContext` never keeps its own
/// scope alive.
#[derive(Default)]
pub struct ScopeContext {
    adopted: RwLock<Option<Adopted>>,
}

impl ScopeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `scope` the operative container of this context, replacing any
    /// earlier one.
    pub fn adopt(&self, scope: &Arc<dyn ContainerScope>, unresolved: Option<UnresolvedPolicy>) {
        debug!(scope = scope.scope_id(), "scope context adopted");
        *self.adopted.write() = Some(Adopted {
            scope: Arc::downgrade(scope),
            unresolved,
        });
    }

    pub fn is_adopted(&self) -> bool {
        self.adopted.read().is_some()
    }

    /// The adopted scope, while it is alive and not disposed.
    pub fn current(&self) -> Option<Arc<dyn ContainerScope>> {
        self.adopted
            .read()
            .as_ref()
            .and_then(|adopted| adopted.scope.upgrade())
            .filter(|scope| !scope.is_disposed())
    }

    /// A provider over the adopted scope.
    ///
    /// Fails with [`DiError::ScopeDisposed`] once the scope is released, and
    /// with [`DiError::NoActiveScope`] if nothing was adopted yet.
    pub fn provider(&self) -> DiResult<ScopedProvider> {
        let adopted = self.adopted.read();
        let adopted = adopted
            .as_ref()
            .ok_or(DiError::NoActiveScope(std::any::type_name::<ScopeContext>()))?;
        let scope = adopted.scope.upgrade().ok_or(DiError::ScopeDisposed)?;
        if scope.is_disposed() {
            return Err(DiError::ScopeDisposed);
        }
        Ok(ScopedProvider::new(scope, adopted.unresolved.clone()))
    }
}

impl fmt::Debug for ScopeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeContext")
            .field("scope", &self.current().map(|s| s.scope_id()))
            .finish()
    }
}

/// Opens nested scopes from a parent scope.
///
/// Resolving `ScopeFactory` through a provider yields a factory whose parent
/// is that provider's scope, so scopes nest naturally.
///
/// # Examples
///
/// ```
/// use service_bridge::{Lifetime, ServiceCollection};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let built = Arc::new(AtomicUsize::new(0));
/// let counter = built.clone();
///
/// let mut services = ServiceCollection::new();
/// services.add_factory::<usize, _>(Lifetime::Scoped, move |_| {
///     Ok(Arc::new(counter.fetch_add(1, Ordering::SeqCst)))
/// });
/// let bridge = services.build().unwrap();
/// let factory = bridge.scope_factory();
///
/// let first = factory.create_scope().unwrap();
/// let second = factory.create_scope().unwrap();
/// assert_eq!(*first.provider().get_required::<usize>().unwrap(), 0);
/// assert_eq!(*first.provider().get_required::<usize>().unwrap(), 0);
/// assert_eq!(*second.provider().get_required::<usize>().unwrap(), 1);
/// ```
#[derive(Clone)]
pub struct ScopeFactory {
    parent: Arc<dyn ContainerScope>,
    unresolved: Option<UnresolvedPolicy>,
}

impl ScopeFactory {
    pub fn new(parent: Arc<dyn ContainerScope>, unresolved: Option<UnresolvedPolicy>) -> Self {
        Self { parent, unresolved }
    }

    /// Opens a new scope, initializes its [`ScopeContext`] and returns it
    /// wrapped as a [`ServiceScope`].
    pub fn create_scope(&self) -> DiResult<ServiceScope> {
        let scope = self.parent.open_scope()?;
        let provider = ScopedProvider::new(scope.clone(), self.unresolved.clone());

        let context = match provider.get_required::<ScopeContext>() {
            Ok(context) => context,
            Err(e) => {
                scope.dispose();
                return Err(e);
            }
        };
        context.adopt(&scope, self.unresolved.clone());

        Ok(ServiceScope { provider })
    }
}

impl fmt::Debug for ScopeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeFactory")
            .field("parent", &self.parent.scope_id())
            .finish()
    }
}

/// A scope owned by one unit of work.
///
/// Disposes its scope when dropped, so an early return or a panic in the unit
/// of work still releases what the scope owns. Calling
/// [`dispose`](ServiceScope::dispose) explicitly first is fine; the drop then
/// does nothing.
pub struct ServiceScope {
    provider: ScopedProvider,
}

impl ServiceScope {
    /// The provider resolving from this scope.
    pub fn provider(&self) -> &ScopedProvider {
        &self.provider
    }

    /// Releases the scope. Returns `false` on the second call.
    pub fn dispose(&self) -> bool {
        self.provider.dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.provider.is_disposed()
    }

    pub fn id(&self) -> u64 {
        self.provider.scope().scope_id()
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        self.provider.dispose();
    }
}

impl fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceScope")
            .field("id", &self.id())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
