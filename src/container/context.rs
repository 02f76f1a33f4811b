//! Resolver context handed to constructors.

use std::sync::Arc;

use super::{AnyArc, ContainerScope};
use crate::error::DiResult;
use crate::key::ServiceKey;
use crate::traits::{Dispose, ResolverCore};

/// Context passed to constructors and factories for resolving dependencies.
///
/// Wraps the scope that is currently resolving, so that dependencies are
/// taken from the right scope: the root for singletons, the requesting scope
/// for scoped and transient services.
#[derive(Clone)]
pub struct ResolverContext {
    scope: Arc<dyn ContainerScope>,
}

impl ResolverContext {
    pub fn new(scope: Arc<dyn ContainerScope>) -> Self {
        Self { scope }
    }

    /// The scope this context resolves from.
    pub fn scope(&self) -> &Arc<dyn ContainerScope> {
        &self.scope
    }
}

impl ResolverCore for ResolverContext {
    fn resolve_any(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        self.scope.resolve(key)
    }

    fn resolve_many(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>> {
        self.scope.resolve_all(key)
    }

    fn push_disposer(&self, disposable: Arc<dyn Dispose>) -> DiResult<()> {
        self.scope.track(disposable)
    }
}
