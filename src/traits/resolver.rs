//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::container::{downcast, AnyArc};
use crate::error::DiResult;
use crate::key::ServiceKey;
use crate::traits::Dispose;

/// Core resolver trait for object-safe service resolution.
///
/// Works on type-erased values keyed by [`ServiceKey`]. Most code uses the
/// generic methods of [`Resolver`] instead, which every `ResolverCore` gets
/// for free.
pub trait ResolverCore: Send + Sync {
    /// Resolves the last registration of `key`.
    fn resolve_any(&self, key: &ServiceKey) -> DiResult<AnyArc>;

    /// Resolves every registration of `key` in registration order.
    ///
    /// An unregistered key yields an empty vector, not an error.
    fn resolve_many(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>>;

    /// Hands `disposable` to the scope that is resolving, to be released with it.
    fn push_disposer(&self, disposable: Arc<dyn Dispose>) -> DiResult<()>;
}

/// Typed resolution on top of [`ResolverCore`].
///
/// # Examples
///
/// ```
/// use service_bridge::{Injectable, Lifetime, Resolver, ResolverContext, DiResult, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// impl Injectable for UserService {
///     fn construct(resolver: &ResolverContext) -> DiResult<Self> {
///         Ok(UserService { db: resolver.get::<Database>()? })
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_instance(Arc::new(Database { url: "postgres://localhost".into() }));
/// services.add_implementation::<UserService>(Lifetime::Transient);
///
/// let bridge = services.build().unwrap();
/// let users = bridge.root_provider().get_required::<UserService>().unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves service `S`, which may be a concrete type or `dyn Trait`.
    fn get<S>(&self) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let any = self.resolve_any(&ServiceKey::of::<S>())?;
        downcast::<S>(any)
    }

    /// Resolves every registration of service `S`.
    fn get_all<S>(&self) -> DiResult<Vec<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.resolve_many(&ServiceKey::of::<S>())?
            .into_iter()
            .map(downcast::<S>)
            .collect()
    }

    /// Registers `service` for disposal together with the resolving scope.
    fn register_disposer<T: Dispose>(&self, service: Arc<T>) -> DiResult<()> {
        self.push_disposer(service)
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
