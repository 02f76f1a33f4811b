//! Descriptor registrar: turns service descriptors into container
//! registrations.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::container::{Constructed, Registrar, Registration, ResolverContext};
use crate::descriptors::{ImplementationSource, ServiceDescriptor};
use crate::error::DiResult;
use crate::provider::ScopedProvider;
use crate::traits::Resolver;

/// Per-descriptor override.
///
/// Receives the raw registrar and the descriptor before default handling.
/// Returning `Ok(true)` means the hook registered the descriptor itself and
/// the default path is skipped; `Ok(false)` falls through to it.
pub type RegistrationHook = Arc<dyn Fn(&dyn Registrar, &ServiceDescriptor) -> DiResult<bool> + Send + Sync>;

/// Registers descriptors into a container.
///
/// Default handling by implementation source:
///
/// - **Type**: a constructor registration under the translated reuse policy.
/// - **Factory**: a delegate that resolves the [`ScopedProvider`] of the
///   resolving scope and hands it to the factory.
/// - **Instance**: the value itself, appended next to any existing
///   registrations of the service.
///
/// # Examples
///
/// ```
/// use service_bridge::{DescriptorRegistrar, NativeContainer, Registrar, ServiceDescriptor, ServiceKey};
/// use std::sync::Arc;
///
/// let container = NativeContainer::new();
/// let registrar = DescriptorRegistrar::new();
///
/// let added = registrar
///     .populate(&container, vec![
///         ServiceDescriptor::instance(Arc::new(1u32)),
///         ServiceDescriptor::instance(Arc::new(2u32)),
///     ])
///     .unwrap();
///
/// assert_eq!(added, 2);
/// assert_eq!(container.registration_count(&ServiceKey::of::<u32>()), 2);
/// ```
#[derive(Clone, Default)]
pub struct DescriptorRegistrar {
    hook: Option<RegistrationHook>,
}

impl DescriptorRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(hook: RegistrationHook) -> Self {
        Self { hook: Some(hook) }
    }

    pub fn hook(&self) -> Option<&RegistrationHook> {
        self.hook.as_ref()
    }

    /// Registers every descriptor in order.
    ///
    /// Returns how many descriptors ended up registered, counting those the
    /// hook handled. Descriptors skipped by the conflict policy are not
    /// counted. Stops at the first error.
    pub fn populate<I>(&self, registrar: &dyn Registrar, descriptors: I) -> DiResult<usize>
    where
        I: IntoIterator<Item = ServiceDescriptor>,
    {
        let mut added = 0;
        let mut seen = 0;
        for descriptor in descriptors {
            seen += 1;
            if self.register(registrar, &descriptor)? {
                added += 1;
            }
        }
        debug!(seen, added, "descriptors populated");
        Ok(added)
    }

    /// Registers a single descriptor, offering it to the hook first.
    pub fn register(&self, registrar: &dyn Registrar, descriptor: &ServiceDescriptor) -> DiResult<bool> {
        if let Some(hook) = &self.hook {
            if hook(registrar, descriptor)? {
                debug!(service = descriptor.type_name(), "registration handled by hook");
                return Ok(true);
            }
        }

        trace!(
            service = descriptor.type_name(),
            lifetime = %descriptor.lifetime(),
            source = descriptor.source().kind(),
            "registering descriptor"
        );
        registrar.register(descriptor.service(), registration_for(descriptor))
    }
}

impl fmt::Debug for DescriptorRegistrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorRegistrar")
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// The default registration for `descriptor`.
///
/// Exposed so that hooks can decorate the default registration instead of
/// rebuilding it.
pub fn registration_for(descriptor: &ServiceDescriptor) -> Registration {
    let reuse = descriptor.lifetime().reuse();
    match descriptor.source() {
        ImplementationSource::Type { implementation, ctor } => {
            Registration::constructor(reuse, *implementation, ctor.clone())
        }
        ImplementationSource::Factory(factory) => {
            let factory = factory.clone();
            Registration::delegate(
                reuse,
                Arc::new(move |resolver: &ResolverContext| -> DiResult<Constructed> {
                    let provider = resolver.get::<ScopedProvider>()?;
                    Ok(Constructed::new(factory(&provider)?))
                }),
            )
        }
        ImplementationSource::Instance(value) => Registration::instance(value.clone()),
    }
}
