//! Simulates a host framework serving concurrent requests.
//!
//! Startup builds the container and populates it once; every request then
//! opens its own scope, resolves a handler, and releases the scope when it
//! is done, even if the handler fails.
//!
//! Run with `RUST_LOG=service_bridge=debug cargo run --example request_scopes`.

use service_bridge::{
    ContainerOptions, DiError, DiResult, Dispose, Injectable, Lifetime, Resolver, ResolverContext, ScopeFactory,
    ServiceCollection,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

trait Repository: Send + Sync {
    fn find_user(&self, id: u32) -> Option<String>;
}

struct InMemoryRepository;

impl Repository for InMemoryRepository {
    fn find_user(&self, id: u32) -> Option<String> {
        (id % 5 != 0).then(|| format!("user-{}", id))
    }
}

impl Injectable for InMemoryRepository {
    fn construct(_: &ResolverContext) -> DiResult<Self> {
        info!("repository created");
        Ok(InMemoryRepository)
    }
}

/// One per request.
struct RequestContext {
    id: usize,
}

impl Dispose for RequestContext {
    fn dispose(&self) {
        info!(request = self.id, "request context released");
    }
}

struct UserHandler {
    request: Arc<RequestContext>,
    repository: Arc<dyn Repository>,
}

impl Injectable for UserHandler {
    fn construct(r: &ResolverContext) -> DiResult<Self> {
        Ok(UserHandler {
            request: r.get::<RequestContext>()?,
            repository: r.get::<dyn Repository>()?,
        })
    }
}

impl UserHandler {
    fn handle(&self, user: u32) -> Result<String, String> {
        self.repository
            .find_user(user)
            .map(|name| format!("request {} -> {}", self.request.id, name))
            .ok_or_else(|| format!("request {}: user {} not found", self.request.id, user))
    }
}

fn serve(factory: &ScopeFactory, user: u32) -> DiResult<()> {
    // Dropping the scope releases it on every path out of this function.
    let scope = factory.create_scope()?;
    let handler = scope.provider().get_required::<UserHandler>()?;
    match handler.handle(user) {
        Ok(body) => info!(scope = scope.id(), %body, "handled"),
        Err(e) => warn!(scope = scope.id(), error = %e, "request failed"),
    }
    Ok(())
}

fn main() -> Result<(), DiError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = ContainerOptions::from_env()?;
    let next_request = Arc::new(AtomicUsize::new(1));

    let mut services = ServiceCollection::new();
    services.add_implementation_as::<dyn Repository, InMemoryRepository>(Lifetime::Singleton, |r| r);
    services.add_factory::<RequestContext, _>(Lifetime::Scoped, move |sp| {
        let context = Arc::new(RequestContext {
            id: next_request.fetch_add(1, Ordering::SeqCst),
        });
        sp.register_disposer(context.clone())?;
        Ok(context)
    });
    services.add_transient::<UserHandler>();

    let bridge = services.build_with(options)?;
    let factory = bridge.scope_factory();

    let workers: Vec<_> = (0..4u32)
        .map(|worker| {
            let factory = factory.clone();
            thread::spawn(move || -> DiResult<()> {
                for i in 0..3 {
                    serve(&factory, worker * 3 + i)?;
                }
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        match worker.join() {
            Ok(result) => result?,
            Err(_) => warn!("worker panicked"),
        }
    }

    bridge.shutdown();
    info!("shut down");
    Ok(())
}
