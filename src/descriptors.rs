//! Service descriptors: what the host framework asks the container to register.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::{erase, AnyArc, Constructed, Ctor, ResolverContext};
use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::provider::ScopedProvider;
use crate::traits::Dispose;

/// Factory function of a descriptor, erased.
pub type FactoryFn = Arc<dyn Fn(&ScopedProvider) -> DiResult<AnyArc> + Send + Sync>;

/// A type the container knows how to build.
///
/// This is the Rust counterpart of "implementation type" registrations:
/// Rust has no runtime constructor discovery, so the type states how it is
/// assembled from other services.
///
/// # Examples
///
/// ```
/// use service_bridge::{Injectable, Resolver, ResolverContext, DiResult};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn construct(_: &ResolverContext) -> DiResult<Self> {
///         Ok(Clock)
///     }
/// }
///
/// struct Greeter { clock: Arc<Clock> }
/// impl Injectable for Greeter {
///     fn construct(resolver: &ResolverContext) -> DiResult<Self> {
///         Ok(Greeter { clock: resolver.get::<Clock>()? })
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Builds the value, resolving dependencies from `resolver`.
    fn construct(resolver: &ResolverContext) -> DiResult<Self>;

    /// The disposal handle for a built value, if the type is disposable.
    ///
    /// Returning `Some` hands the value to the owning scope, which disposes
    /// it when the scope is released.
    fn disposable(_this: Arc<Self>) -> Option<Arc<dyn Dispose>> {
        None
    }
}

/// Where a descriptor's service comes from. Exactly one per descriptor.
#[derive(Clone)]
pub enum ImplementationSource {
    /// An [`Injectable`] implementation type.
    Type {
        implementation: ServiceKey,
        ctor: Ctor,
    },
    /// A factory invoked with the provider of the resolving scope.
    Factory(FactoryFn),
    /// A value built by the caller.
    Instance(AnyArc),
}

impl ImplementationSource {
    pub fn kind(&self) -> &'static str {
        match self {
            ImplementationSource::Type { .. } => "type",
            ImplementationSource::Factory(_) => "factory",
            ImplementationSource::Instance(_) => "instance",
        }
    }

    fn of_type<S, I>(upcast: fn(Arc<I>) -> Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        let ctor: Ctor = Arc::new(move |resolver: &ResolverContext| -> DiResult<Constructed> {
            let built = Arc::new(I::construct(resolver)?);
            let disposable = I::disposable(built.clone());
            Ok(Constructed::with_disposable(erase(upcast(built)), disposable))
        });
        ImplementationSource::Type {
            implementation: ServiceKey::of::<I>(),
            ctor,
        }
    }

    fn of_factory<S, F>(factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&ScopedProvider) -> DiResult<Arc<S>> + Send + Sync + 'static,
    {
        ImplementationSource::Factory(Arc::new(move |provider: &ScopedProvider| {
            factory(provider).map(erase)
        }))
    }
}

impl fmt::Debug for ImplementationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImplementationSource::Type { implementation, .. } => {
                f.debug_tuple("Type").field(&implementation.type_name()).finish()
            }
            ImplementationSource::Factory(_) => f.write_str("Factory"),
            ImplementationSource::Instance(_) => f.write_str("Instance"),
        }
    }
}

/// Declarative record of one service: identifier, lifetime, implementation
/// source. Consumed once, during registration.
///
/// # Examples
///
/// ```rust
/// use service_bridge::{Injectable, Lifetime, ResolverContext, DiResult, ServiceDescriptor};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
/// impl Injectable for English {
///     fn construct(_: &ResolverContext) -> DiResult<Self> { Ok(English) }
/// }
///
/// let by_type = ServiceDescriptor::implementation::<dyn Greeter, English>(
///     Lifetime::Transient,
///     |e| e as Arc<dyn Greeter>,
/// );
/// assert_eq!(by_type.source().kind(), "type");
/// assert_eq!(by_type.implementation_type().unwrap().type_name(), std::any::type_name::<English>());
///
/// let by_instance = ServiceDescriptor::instance::<dyn Greeter>(Arc::new(English));
/// assert_eq!(by_instance.lifetime(), Lifetime::Singleton);
/// ```
#[derive(Clone)]
pub struct ServiceDescriptor {
    service: ServiceKey,
    lifetime: Lifetime,
    source: ImplementationSource,
}

impl ServiceDescriptor {
    /// Service `S` implemented by type `I`; `upcast` turns an `I` into an `S`
    /// (the identity for concrete services, a coercion for `dyn Trait`).
    pub fn implementation<S, I>(lifetime: Lifetime, upcast: fn(Arc<I>) -> Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        Self {
            service: ServiceKey::of::<S>(),
            lifetime,
            source: ImplementationSource::of_type::<S, I>(upcast),
        }
    }

    /// Concrete service `I` implemented by itself.
    pub fn concrete<I: Injectable>(lifetime: Lifetime) -> Self {
        Self::implementation::<I, I>(lifetime, |this| this)
    }

    /// Service `S` built by `factory`.
    pub fn factory<S, F>(lifetime: Lifetime, factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&ScopedProvider) -> DiResult<Arc<S>> + Send + Sync + 'static,
    {
        Self {
            service: ServiceKey::of::<S>(),
            lifetime,
            source: ImplementationSource::of_factory::<S, F>(factory),
        }
    }

    /// Service `S` backed by an existing value. Always a singleton.
    pub fn instance<S>(value: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self {
            service: ServiceKey::of::<S>(),
            lifetime: Lifetime::Singleton,
            source: ImplementationSource::Instance(erase(value)),
        }
    }

    /// Step-by-step construction with validation.
    pub fn builder<S>() -> DescriptorBuilder<S>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        DescriptorBuilder::new()
    }

    pub fn service(&self) -> ServiceKey {
        self.service
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn source(&self) -> &ImplementationSource {
        &self.source
    }

    /// Type name of the service.
    pub fn type_name(&self) -> &'static str {
        self.service.type_name()
    }

    /// Implementation type, for type-backed descriptors.
    pub fn implementation_type(&self) -> Option<ServiceKey> {
        match &self.source {
            ImplementationSource::Type { implementation, .. } => Some(*implementation),
            _ => None,
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service", &self.service.type_name())
            .field("lifetime", &self.lifetime)
            .field("source", &self.source)
            .finish()
    }
}

/// Builds a [`ServiceDescriptor`] from parts, rejecting descriptors that do
/// not have exactly one implementation source.
///
/// # Examples
///
/// ```rust
/// use service_bridge::{DiError, ServiceDescriptor};
/// use std::sync::Arc;
///
/// let err = ServiceDescriptor::builder::<u32>()
///     .lifetime_tag("singleton").unwrap()
///     .build()
///     .unwrap_err();
/// assert!(matches!(err, DiError::MalformedDescriptor { .. }));
///
/// let ok = ServiceDescriptor::builder::<u32>()
///     .instance(Arc::new(5))
///     .build()
///     .unwrap();
/// assert_eq!(ok.source().kind(), "instance");
/// ```
pub struct DescriptorBuilder<S: ?Sized> {
    lifetime: Option<Lifetime>,
    sources: Vec<ImplementationSource>,
    _service: PhantomData<fn() -> Arc<S>>,
}

impl<S> DescriptorBuilder<S>
where
    S: ?Sized + Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            lifetime: None,
            sources: Vec::new(),
            _service: PhantomData,
        }
    }

    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// Sets the lifetime from a configuration tag such as `"scoped"`.
    pub fn lifetime_tag(self, tag: &str) -> DiResult<Self> {
        Ok(self.lifetime(tag.parse()?))
    }

    pub fn implementation<I: Injectable>(mut self, upcast: fn(Arc<I>) -> Arc<S>) -> Self {
        self.sources.push(ImplementationSource::of_type::<S, I>(upcast));
        self
    }

    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ScopedProvider) -> DiResult<Arc<S>> + Send + Sync + 'static,
    {
        self.sources.push(ImplementationSource::of_factory::<S, F>(factory));
        self
    }

    pub fn instance(mut self, value: Arc<S>) -> Self {
        self.sources.push(ImplementationSource::Instance(erase(value)));
        self
    }

    pub fn build(mut self) -> DiResult<ServiceDescriptor> {
        let service = std::any::type_name::<S>();
        let source = match self.sources.len() {
            0 => {
                return Err(DiError::MalformedDescriptor {
                    service,
                    reason: "no implementation source",
                })
            }
            1 => self.sources.remove(0),
            _ => {
                return Err(DiError::MalformedDescriptor {
                    service,
                    reason: "more than one implementation source",
                })
            }
        };

        let lifetime = match (&source, self.lifetime) {
            (ImplementationSource::Instance(_), None | Some(Lifetime::Singleton)) => Lifetime::Singleton,
            (ImplementationSource::Instance(_), Some(_)) => {
                return Err(DiError::MalformedDescriptor {
                    service,
                    reason: "instances are always singletons",
                })
            }
            (_, Some(lifetime)) => lifetime,
            (_, None) => {
                return Err(DiError::MalformedDescriptor {
                    service,
                    reason: "no lifetime",
                })
            }
        };

        Ok(ServiceDescriptor {
            service: ServiceKey::of::<S>(),
            lifetime,
            source,
        })
    }
}
