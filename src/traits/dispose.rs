//! Disposal trait for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this trait for services that need structured teardown (e.g., flushing caches,
/// closing connections). A scope runs the disposers it owns in LIFO order when it is
/// disposed; the root container does the same for singletons.
///
/// Implementation types opt into automatic tracking through
/// [`Injectable::disposable`](crate::Injectable::disposable). Factories register
/// their products explicitly through
/// [`ScopedProvider::register_disposer`](crate::ScopedProvider::register_disposer).
///
/// # Examples
///
/// ```
/// use service_bridge::{Dispose, Injectable, Lifetime, ResolverContext, DiResult, ServiceCollection};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Connection {
///     closed: AtomicBool,
/// }
///
/// impl Dispose for Connection {
///     fn dispose(&self) {
///         self.closed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// impl Injectable for Connection {
///     fn construct(_: &ResolverContext) -> DiResult<Self> {
///         Ok(Connection { closed: AtomicBool::new(false) })
///     }
///
///     fn disposable(this: Arc<Self>) -> Option<Arc<dyn Dispose>> {
///         Some(this)
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_implementation::<Connection>(Lifetime::Scoped);
/// let bridge = services.build().unwrap();
///
/// let scope = bridge.scope_factory().create_scope().unwrap();
/// let conn = scope.provider().get_required::<Connection>().unwrap();
/// scope.dispose();
/// assert!(conn.closed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
