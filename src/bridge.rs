//! The composition root.
//!
//! [`ServiceBridge`] binds a container to the provider conventions: it
//! registers the infrastructure services ([`ScopedProvider`],
//! [`ScopeFactory`], [`ScopeContext`]), populates the container from
//! descriptors, and hands out the root provider and the scope factory.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::ContainerOptions;
use crate::container::{
    erase, Constructed, Container, ContainerScope, NativeContainer, Registrar, Registration, ResolverContext,
};
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::provider::{ScopedProvider, UnresolvedPolicy};
use crate::registrar::{DescriptorRegistrar, RegistrationHook};
use crate::scope_factory::{ScopeContext, ScopeFactory};

/// Adapter between a container and framework code.
///
/// The container is process-wide state owned by whoever builds the bridge;
/// nothing here is global. Populate first, then resolve: registrations are
/// not meant to interleave with resolutions that depend on them.
///
/// # Examples
///
/// ```
/// use service_bridge::{Injectable, Lifetime, ResolverContext, DiResult, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Repository: Send + Sync { fn name(&self) -> &'static str; }
///
/// struct InMemory;
/// impl Repository for InMemory { fn name(&self) -> &'static str { "memory" } }
/// impl Injectable for InMemory {
///     fn construct(_: &ResolverContext) -> DiResult<Self> { Ok(InMemory) }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_implementation_as::<dyn Repository, InMemory>(Lifetime::Scoped, |r| r);
/// let bridge = services.build().unwrap();
///
/// // One scope per unit of work.
/// let scope = bridge.scope_factory().create_scope().unwrap();
/// let repo = scope.provider().get_required::<dyn Repository>().unwrap();
/// assert_eq!(repo.name(), "memory");
/// ```
pub struct ServiceBridge {
    container: Arc<dyn Container>,
    root: Arc<dyn ContainerScope>,
    registrar: DescriptorRegistrar,
    unresolved: Option<UnresolvedPolicy>,
}

impl ServiceBridge {
    /// A bridge over a fresh [`NativeContainer`].
    pub fn new(options: ContainerOptions) -> DiResult<Self> {
        Self::builder_with_options(options).build()
    }

    /// A bridge over an existing container.
    pub fn with_container<C: Container + 'static>(container: Arc<C>) -> DiResult<Self> {
        Self::builder(container).build()
    }

    pub fn builder<C: Container + 'static>(container: Arc<C>) -> ServiceBridgeBuilder {
        ServiceBridgeBuilder {
            container,
            unresolved: None,
            hook: None,
        }
    }

    /// Builder over a fresh [`NativeContainer`] configured by `options`.
    pub fn builder_with_options(options: ContainerOptions) -> ServiceBridgeBuilder {
        Self::builder(Arc::new(NativeContainer::with_options(options)))
    }

    /// Registers a batch of descriptors. May be called any number of times.
    ///
    /// Returns how many descriptors were registered.
    pub fn populate<I>(&self, descriptors: I) -> DiResult<usize>
    where
        I: IntoIterator<Item = ServiceDescriptor>,
    {
        self.registrar.populate(self.container.registrar(), descriptors)
    }

    /// The provider over the root scope.
    pub fn root_provider(&self) -> ScopedProvider {
        ScopedProvider::new(self.root.clone(), self.unresolved.clone())
    }

    /// The factory opening scopes directly under the root.
    pub fn scope_factory(&self) -> ScopeFactory {
        ScopeFactory::new(self.root.clone(), self.unresolved.clone())
    }

    pub fn container(&self) -> &Arc<dyn Container> {
        &self.container
    }

    /// Disposes the root scope and with it every singleton the container
    /// owns. Returns `false` if it was already shut down.
    pub fn shutdown(&self) -> bool {
        self.root.dispose()
    }
}

impl fmt::Debug for ServiceBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBridge")
            .field("root", &self.root.scope_id())
            .field("registrar", &self.registrar)
            .field("policy", &self.unresolved.is_some())
            .finish()
    }
}

/// Configures the optional knobs of a [`ServiceBridge`].
pub struct ServiceBridgeBuilder {
    container: Arc<dyn Container>,
    unresolved: Option<UnresolvedPolicy>,
    hook: Option<RegistrationHook>,
}

impl ServiceBridgeBuilder {
    /// Services for which `policy` returns `true` fail with
    /// [`DiError::NotFound`] when missing instead of resolving to absence.
    pub fn unresolved_policy<F>(mut self, policy: F) -> Self
    where
        F: Fn(&ServiceKey) -> bool + Send + Sync + 'static,
    {
        self.unresolved = Some(Arc::new(policy));
        self
    }

    /// Offers every descriptor to `hook` before default registration.
    pub fn registration_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Registrar, &ServiceDescriptor) -> DiResult<bool> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Registers the infrastructure services and adopts the root scope.
    pub fn build(self) -> DiResult<ServiceBridge> {
        let ServiceBridgeBuilder {
            container,
            unresolved,
            hook,
        } = self;

        register_infrastructure(&*container, &unresolved)?;
        let root = container.clone().root_scope();

        // Under strict scoping the root has no context of its own.
        match ScopedProvider::new(root.clone(), unresolved.clone()).get_required::<ScopeContext>() {
            Ok(context) => context.adopt(&root, unresolved.clone()),
            Err(DiError::NoActiveScope(_)) => {
                debug!("strict scoping: root scope context not adopted");
            }
            Err(e) => return Err(e),
        }

        let registrar = match hook {
            Some(hook) => DescriptorRegistrar::with_hook(hook),
            None => DescriptorRegistrar::new(),
        };

        debug!(root = root.scope_id(), "service bridge ready");
        Ok(ServiceBridge {
            container,
            root,
            registrar,
            unresolved,
        })
    }
}

fn register_infrastructure(container: &dyn Container, unresolved: &Option<UnresolvedPolicy>) -> DiResult<()> {
    let registrar = container.registrar();

    let policy = unresolved.clone();
    registrar.register(
        ServiceKey::of::<ScopedProvider>(),
        Registration::delegate(
            Lifetime::Transient.reuse(),
            Arc::new(move |resolver: &ResolverContext| -> DiResult<Constructed> {
                let provider = ScopedProvider::new(resolver.scope().clone(), policy.clone());
                Ok(Constructed::new(erase(Arc::new(provider))))
            }),
        ),
    )?;

    let policy = unresolved.clone();
    registrar.register(
        ServiceKey::of::<ScopeFactory>(),
        Registration::delegate(
            Lifetime::Transient.reuse(),
            Arc::new(move |resolver: &ResolverContext| -> DiResult<Constructed> {
                let factory = ScopeFactory::new(resolver.scope().clone(), policy.clone());
                Ok(Constructed::new(erase(Arc::new(factory))))
            }),
        ),
    )?;

    registrar.register(
        ServiceKey::of::<ScopeContext>(),
        Registration::delegate(
            Lifetime::Scoped.reuse(),
            Arc::new(|_: &ResolverContext| -> DiResult<Constructed> {
                Ok(Constructed::new(erase(Arc::new(ScopeContext::new()))))
            }),
        )
        .expected_at_root(),
    )?;

    Ok(())
}
