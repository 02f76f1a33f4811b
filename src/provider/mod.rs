//! The service-provider façade handed to framework code.
//!
//! A [`ScopedProvider`] wraps exactly one container scope and exposes its
//! resolution under the two operations framework consumers expect:
//! resolve-or-absent ([`get_service`](ScopedProvider::get_service)) and
//! resolve-or-fail ([`get_required_service`](ScopedProvider::get_required_service)).

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::container::{downcast, AnyArc, ContainerScope};
use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::traits::{Dispose, ResolverCore};

/// Decides, per requested service, whether a missing registration surfaces
/// the container's [`DiError::NotFound`] (`true`) or resolves to absence
/// (`false`).
pub type UnresolvedPolicy = Arc<dyn Fn(&ServiceKey) -> bool + Send + Sync>;

/// Service-locator façade over one resolution scope.
///
/// Holds no state of its own beyond the optional [`UnresolvedPolicy`]; cloning
/// it yields another handle to the same scope.
///
/// Without a policy every missing service resolves to `None` through
/// [`get_service`](Self::get_service). The required variants always fail on a
/// miss, and every operation fails with [`DiError::ScopeDisposed`] once the
/// scope is gone.
///
/// # Examples
///
/// ```
/// use service_bridge::{DiError, ServiceCollection, ServiceKey, ServiceBridge, ContainerOptions};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_instance(Arc::new(String::from("configured")));
///
/// let bridge = ServiceBridge::builder_with_options(ContainerOptions::default())
///     .unresolved_policy(|key: &ServiceKey| key.type_name().ends_with("u64"))
///     .build()
///     .unwrap();
/// bridge.populate(services).unwrap();
///
/// let provider = bridge.root_provider();
/// assert_eq!(provider.get::<String>().unwrap().unwrap().as_str(), "configured");
/// assert!(provider.get::<u32>().unwrap().is_none());
/// assert_eq!(provider.get::<u64>().unwrap_err(), DiError::NotFound(ServiceKey::of::<u64>()));
/// ```
#[derive(Clone)]
pub struct ScopedProvider {
    scope: Arc<dyn ContainerScope>,
    unresolved: Option<UnresolvedPolicy>,
}

impl ScopedProvider {
    pub fn new(scope: Arc<dyn ContainerScope>, unresolved: Option<UnresolvedPolicy>) -> Self {
        Self { scope, unresolved }
    }

    /// The wrapped scope.
    pub fn scope(&self) -> &Arc<dyn ContainerScope> {
        &self.scope
    }

    pub fn unresolved_policy(&self) -> Option<&UnresolvedPolicy> {
        self.unresolved.as_ref()
    }

    fn fails_loudly(&self, key: &ServiceKey) -> bool {
        self.unresolved.as_ref().is_some_and(|policy| policy(key))
    }

    /// Resolve-or-absent.
    ///
    /// A missing registration of `key` itself gives `Ok(None)` unless the
    /// policy asks for the error. Missing dependencies further down the graph,
    /// and every other failure, are always surfaced.
    pub fn get_service(&self, key: &ServiceKey) -> DiResult<Option<AnyArc>> {
        match self.scope.resolve(key) {
            Ok(value) => Ok(Some(value)),
            Err(DiError::NotFound(missed)) if missed == *key && !self.fails_loudly(key) => {
                trace!(service = key.type_name(), "unresolved service treated as absent");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve-or-fail, whatever the policy says.
    pub fn get_required_service(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        self.scope.resolve(key)
    }

    /// Typed [`get_service`](Self::get_service).
    pub fn get<S>(&self) -> DiResult<Option<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.get_service(&ServiceKey::of::<S>())?.map(downcast::<S>).transpose()
    }

    /// Typed [`get_required_service`](Self::get_required_service).
    pub fn get_required<S>(&self) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        downcast::<S>(self.get_required_service(&ServiceKey::of::<S>())?)
    }

    /// Every registration of `S`, in registration order. Empty when `S` is
    /// not registered.
    pub fn get_all<S>(&self) -> DiResult<Vec<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.scope
            .resolve_all(&ServiceKey::of::<S>())?
            .into_iter()
            .map(downcast::<S>)
            .collect()
    }

    /// Hands `service` to this scope; it is disposed with the scope.
    pub fn register_disposer<T: Dispose>(&self, service: Arc<T>) -> DiResult<()> {
        self.scope.track(service)
    }

    /// Disposes the underlying scope. Returns `false` when it was already
    /// disposed.
    pub fn dispose(&self) -> bool {
        self.scope.dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.scope.is_disposed()
    }

    pub fn is_root(&self) -> bool {
        self.scope.is_root()
    }
}

impl ResolverCore for ScopedProvider {
    fn resolve_any(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        self.get_required_service(key)
    }

    fn resolve_many(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>> {
        self.scope.resolve_all(key)
    }

    fn push_disposer(&self, disposable: Arc<dyn Dispose>) -> DiResult<()> {
        self.scope.track(disposable)
    }
}

impl fmt::Debug for ScopedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedProvider")
            .field("scope", &self.scope.scope_id())
            .field("root", &self.scope.is_root())
            .field("policy", &self.unresolved.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{erase, Constructed, Container, NativeContainer, Registrar, Registration, ResolverContext};
    use crate::lifetime::Reuse;
    use crate::traits::Resolver;

    #[derive(Debug)]
    struct Needs;

    fn provider_with(policy: Option<UnresolvedPolicy>) -> ScopedProvider {
        let container = Arc::new(NativeContainer::new());
        container
            .register(ServiceKey::of::<u8>(), Registration::instance(erase(Arc::new(3u8))))
            .unwrap();
        container
            .register(
                ServiceKey::of::<Needs>(),
                Registration::delegate(
                    Reuse::Transient,
                    Arc::new(|ctx: &ResolverContext| -> DiResult<Constructed> {
                        ctx.get::<u64>()?;
                        Ok(Constructed::new(erase(Arc::new(Needs))))
                    }),
                ),
            )
            .unwrap();
        ScopedProvider::new(container.root_scope(), policy)
    }

    #[test]
    fn missing_service_is_absent_by_default() {
        let provider = provider_with(None);
        assert!(provider.get::<u16>().unwrap().is_none());
        assert_eq!(*provider.get::<u8>().unwrap().unwrap(), 3);
    }

    #[test]
    fn required_lookup_ignores_policy() {
        let provider = provider_with(Some(Arc::new(|_: &ServiceKey| false)));
        assert_eq!(provider.get_required::<u16>().unwrap_err(), DiError::NotFound(ServiceKey::of::<u16>()));
    }

    #[test]
    fn missing_dependency_is_not_absence() {
        let provider = provider_with(None);
        assert_eq!(provider.get::<Needs>().unwrap_err(), DiError::NotFound(ServiceKey::of::<u64>()));
    }

    #[test]
    fn provider_is_a_resolver() {
        let provider = provider_with(None);
        let value: Arc<u8> = Resolver::get(&provider).unwrap();
        assert_eq!(*value, 3);
    }
}
