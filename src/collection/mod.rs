//! Service collection: the ordered list of descriptors built during startup.

use std::sync::Arc;

use crate::bridge::ServiceBridge;
use crate::config::ContainerOptions;
use crate::descriptors::{Injectable, ServiceDescriptor};
use crate::error::DiResult;
use crate::lifetime::Lifetime;
use crate::provider::ScopedProvider;

/// Ordered collection of service descriptors.
///
/// The collection only records what should be registered; nothing reaches a
/// container until [`build`](ServiceCollection::build) or
/// [`ServiceBridge::populate`] consumes it. Order matters: for a service
/// registered several times, single resolution returns the last registration
/// and [`get_all`](ScopedProvider::get_all) returns them in this order.
///
/// # Examples
///
/// ```
/// use service_bridge::{Injectable, Lifetime, Resolver, ResolverContext, DiResult, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Settings { name: &'static str }
///
/// struct Greeter { settings: Arc<Settings> }
/// impl Injectable for Greeter {
///     fn construct(r: &ResolverContext) -> DiResult<Self> {
///         Ok(Greeter { settings: r.get::<Settings>()? })
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services
///     .add_instance(Arc::new(Settings { name: "demo" }))
///     .add_implementation::<Greeter>(Lifetime::Scoped);
/// assert_eq!(services.len(), 2);
///
/// let bridge = services.build().unwrap();
/// let scope = bridge.scope_factory().create_scope().unwrap();
/// let greeter = scope.provider().get_required::<Greeter>().unwrap();
/// assert_eq!(greeter.settings.name, "demo");
/// ```
#[derive(Default, Clone)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a prepared descriptor.
    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Registers concrete type `I` as its own service.
    pub fn add_implementation<I: Injectable>(&mut self, lifetime: Lifetime) -> &mut Self {
        self.add(ServiceDescriptor::concrete::<I>(lifetime))
    }

    /// Registers `I` as an implementation of service `S`, typically a trait
    /// object.
    ///
    /// ```
    /// use service_bridge::{Injectable, Lifetime, ResolverContext, DiResult, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// trait Clock: Send + Sync { fn now(&self) -> u64; }
    /// struct Fixed;
    /// impl Clock for Fixed { fn now(&self) -> u64 { 7 } }
    /// impl Injectable for Fixed {
    ///     fn construct(_: &ResolverContext) -> DiResult<Self> { Ok(Fixed) }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_implementation_as::<dyn Clock, Fixed>(Lifetime::Singleton, |f| f);
    /// let bridge = services.build().unwrap();
    /// assert_eq!(bridge.root_provider().get_required::<dyn Clock>().unwrap().now(), 7);
    /// ```
    pub fn add_implementation_as<S, I>(&mut self, lifetime: Lifetime, upcast: fn(Arc<I>) -> Arc<S>) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.add(ServiceDescriptor::implementation::<S, I>(lifetime, upcast))
    }

    /// Registers a factory, called with the provider of the resolving scope.
    pub fn add_factory<S, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&ScopedProvider) -> DiResult<Arc<S>> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory::<S, F>(lifetime, factory))
    }

    /// Registers an existing value. Instances are never disposed by the
    /// container, and several instances of one service coexist.
    pub fn add_instance<S>(&mut self, value: Arc<S>) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::instance(value))
    }

    pub fn add_singleton<I: Injectable>(&mut self) -> &mut Self {
        self.add_implementation::<I>(Lifetime::Singleton)
    }

    pub fn add_scoped<I: Injectable>(&mut self) -> &mut Self {
        self.add_implementation::<I>(Lifetime::Scoped)
    }

    pub fn add_transient<I: Injectable>(&mut self) -> &mut Self {
        self.add_implementation::<I>(Lifetime::Transient)
    }

    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Builds a bridge over the bundled container with default options.
    pub fn build(self) -> DiResult<ServiceBridge> {
        self.build_with(ContainerOptions::default())
    }

    /// Builds a bridge over the bundled container configured by `options`.
    pub fn build_with(self, options: ContainerOptions) -> DiResult<ServiceBridge> {
        let bridge = ServiceBridge::new(options)?;
        bridge.populate(self)?;
        Ok(bridge)
    }
}

impl IntoIterator for ServiceCollection {
    type Item = ServiceDescriptor;
    type IntoIter = std::vec::IntoIter<ServiceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.into_iter()
    }
}

impl Extend<ServiceDescriptor> for ServiceCollection {
    fn extend<T: IntoIterator<Item = ServiceDescriptor>>(&mut self, iter: T) {
        self.descriptors.extend(iter);
    }
}

impl FromIterator<ServiceDescriptor> for ServiceCollection {
    fn from_iter<T: IntoIterator<Item = ServiceDescriptor>>(iter: T) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.descriptors).finish()
    }
}
