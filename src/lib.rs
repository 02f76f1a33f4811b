//! # service-bridge
//!
//! Binds a dependency-injection container to service-provider conventions:
//! lifetimes, service descriptors, a provider façade and scope factories.
//!
//! ## Features
//!
//! - **Lifetime translation**: Singleton, Scoped and Transient map onto the
//!   container's reuse policies; Scoped resolved outside a scope falls back
//!   to a process-wide instance unless strict scoping is configured
//! - **Descriptor registration**: implementation types, factories and
//!   pre-built instances, with an optional per-descriptor override hook
//! - **Provider façade**: resolve-or-absent and resolve-or-fail, with a
//!   per-service policy for unresolved lookups
//! - **Scopes**: one scope per unit of work, disposed exactly once
//! - **Container boundary**: the bridge only needs [`Registrar`] and
//!   [`ContainerScope`]; [`NativeContainer`] ships with the crate
//!
//! ## Quick Start
//!
//! ```rust
//! use service_bridge::{Injectable, Lifetime, Resolver, ResolverContext, DiResult, ServiceCollection};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     fn construct(resolver: &ResolverContext) -> DiResult<Self> {
//!         Ok(UserService { db: resolver.get::<Database>()? })
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_instance(Arc::new(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! }));
//! services.add_implementation::<UserService>(Lifetime::Transient);
//!
//! let bridge = services.build().unwrap();
//! let user_service = bridge.root_provider().get_required::<UserService>().unwrap();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once and shared across the entire application
//! - **Scoped**: Created once per scope (ideal for web request contexts)
//! - **Transient**: Created fresh on every resolution
//!
//! ## Scoped Services
//!
//! ```rust
//! use service_bridge::{Lifetime, ServiceCollection};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct RequestId(String);
//!
//! let counter = Arc::new(AtomicUsize::new(0));
//! let mut services = ServiceCollection::new();
//! services.add_factory::<RequestId, _>(Lifetime::Scoped, move |_| {
//!     let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
//!     Ok(Arc::new(RequestId(format!("req-{}", n))))
//! });
//!
//! let bridge = services.build().unwrap();
//! let scope1 = bridge.scope_factory().create_scope().unwrap();
//! let scope2 = bridge.scope_factory().create_scope().unwrap();
//!
//! let req1 = scope1.provider().get_required::<RequestId>().unwrap();
//! let req2 = scope2.provider().get_required::<RequestId>().unwrap();
//! // Different scopes get different instances
//! assert_ne!(req1.0, req2.0);
//! ```

pub mod bridge;
pub mod collection;
pub mod config;
pub mod container;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod provider;
pub mod registrar;
pub mod scope_factory;
pub mod traits;

// Internal modules
mod internal;

pub use bridge::{ServiceBridge, ServiceBridgeBuilder};
pub use collection::ServiceCollection;
pub use config::{ConflictPolicy, ContainerOptions, ScopedFallback, ENV_PREFIX};
pub use container::{
    Activation, AnyArc, Constructed, Container, ContainerScope, Ctor, NativeContainer, Registrar, Registration,
    ResolverContext,
};
pub use descriptors::{DescriptorBuilder, FactoryFn, ImplementationSource, Injectable, ServiceDescriptor};
pub use error::{DiError, DiResult};
pub use key::ServiceKey;
pub use lifetime::{Lifetime, Reuse};
pub use provider::{ScopedProvider, UnresolvedPolicy};
pub use registrar::{registration_for, DescriptorRegistrar, RegistrationHook};
pub use scope_factory::{ScopeContext, ScopeFactory, ServiceScope};
pub use traits::{Dispose, Resolver, ResolverCore};
