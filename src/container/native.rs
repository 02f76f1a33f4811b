//! The bundled container implementation.
//!
//! One shared registration table, one root scope, and any number of nested
//! scopes. Lifetimes are honored through the [`Reuse`] of each registration:
//!
//! - **Singleton**: built once in the root scope and cached in the
//!   registration itself; disposables are owned by the root.
//! - **ScopedOrSingleton**: cached per scope. The root scope caches too, which
//!   turns a scoped service resolved outside any scope into a process-wide
//!   instance, unless [`ScopedFallback::Strict`] is configured.
//! - **Transient**: built on every resolution; disposables are owned by the
//!   resolving scope when transient tracking is enabled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use super::{Activation, AnyArc, Container, ContainerScope, Registrar, Registration, ResolverContext};
use crate::config::{ConflictPolicy, ContainerOptions, ScopedFallback};
use crate::error::{DiError, DiResult};
use crate::internal::{with_circular_check, BuildTable, DisposeBag};
use crate::key::ServiceKey;
use crate::lifetime::Reuse;
use crate::traits::Dispose;

#[cfg(feature = "ahash")]
type Map<K, V> = HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
type Map<K, V> = HashMap<K, V>;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// A registration plus its runtime state.
struct Entry {
    id: u64,
    registration: Registration,
    singleton: OnceCell<AnyArc>,
}

struct Shared {
    registry: RwLock<Map<ServiceKey, Vec<Arc<Entry>>>>,
    next_entry_id: AtomicU64,
    builds: BuildTable,
    options: ContainerOptions,
}

impl Shared {
    fn last(&self, key: &ServiceKey) -> Option<Arc<Entry>> {
        self.registry.read().get(key).and_then(|entries| entries.last().cloned())
    }

    fn all(&self, key: &ServiceKey) -> Vec<Arc<Entry>> {
        self.registry.read().get(key).cloned().unwrap_or_default()
    }
}

/// Root or nested resolution scope.
struct NativeScope {
    id: u64,
    shared: Arc<Shared>,
    /// `None` for the root.
    parent: Option<Arc<NativeScope>>,
    this: Weak<NativeScope>,
    /// Scoped instances keyed by registration id.
    scoped: Mutex<Map<u64, AnyArc>>,
    disposers: Mutex<DisposeBag>,
    disposed: AtomicBool,
}

impl NativeScope {
    fn new_root(shared: Arc<Shared>) -> Arc<Self> {
        Self::new(shared, None)
    }

    fn new(shared: Arc<Shared>, parent: Option<Arc<NativeScope>>) -> Arc<Self> {
        Arc::new_cyclic(|this| NativeScope {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            shared,
            parent,
            this: this.clone(),
            scoped: Mutex::new(Map::default()),
            disposers: Mutex::new(DisposeBag::default()),
            disposed: AtomicBool::new(false),
        })
    }

    fn self_arc(&self) -> DiResult<Arc<NativeScope>> {
        self.this.upgrade().ok_or(DiError::ScopeDisposed)
    }

    fn root(&self) -> DiResult<Arc<NativeScope>> {
        match &self.parent {
            Some(parent) => parent.root(),
            None => self.self_arc(),
        }
    }

    fn ensure_active(&self) -> DiResult<()> {
        if self.is_disposed() {
            Err(DiError::ScopeDisposed)
        } else {
            Ok(())
        }
    }

    fn resolve_entry(&self, key: &ServiceKey, entry: &Entry) -> DiResult<AnyArc> {
        let ctor = match &entry.registration.activation {
            Activation::Instance(value) => return Ok(value.clone()),
            Activation::Constructor { ctor, .. } | Activation::Delegate(ctor) => ctor,
        };
        let name = key.type_name();
        let max_depth = self.shared.options.max_resolution_depth;

        match entry.registration.reuse {
            Reuse::Singleton => {
                if let Some(value) = entry.singleton.get() {
                    return Ok(value.clone());
                }
                let root = self.root()?;
                with_circular_check(name, max_depth, || {
                    // The cell is only filled by the claim holder, so waiting
                    // happens in the build table where cycles are visible.
                    let claim = self.shared.builds.claim(entry.id, name, || entry.singleton.get().is_some())?;
                    let Some(_claim) = claim else {
                        return entry.singleton.get().cloned().ok_or(DiError::NotFound(*key));
                    };

                    trace!(service = name, "building singleton");
                    let built = ctor(&ResolverContext::new(root.clone()))?;
                    if let Some(disposable) = built.disposable {
                        root.track(disposable)?;
                    }
                    Ok(entry.singleton.get_or_init(|| built.value).clone())
                })
            }
            Reuse::ScopedOrSingleton => {
                if self.parent.is_none() && self.shared.options.scoped_fallback == ScopedFallback::Strict {
                    return Err(DiError::NoActiveScope(name));
                }
                if let Some(value) = self.scoped.lock().get(&entry.id) {
                    return Ok(value.clone());
                }
                if self.parent.is_none() {
                    if entry.registration.root_expected {
                        debug!(service = name, "scoped service shared by the root scope");
                    } else {
                        warn!(service = name, "scoped service resolved outside of a scope; sharing it process-wide");
                    }
                }

                let this = self.self_arc()?;
                let built = with_circular_check(name, max_depth, || ctor(&ResolverContext::new(this)))?;

                // Never hold the cache lock while a constructor runs.
                let mut cache = self.scoped.lock();
                let raced = cache.get(&entry.id).cloned();
                if let Some(existing) = raced {
                    drop(cache);
                    if let Some(disposable) = built.disposable {
                        disposable.dispose();
                    }
                    return Ok(existing);
                }
                cache.insert(entry.id, built.value.clone());
                drop(cache);

                if let Some(disposable) = built.disposable {
                    self.track(disposable)?;
                }
                Ok(built.value)
            }
            Reuse::Transient => {
                let this = self.self_arc()?;
                let built = with_circular_check(name, max_depth, || ctor(&ResolverContext::new(this)))?;
                if let Some(disposable) = built.disposable {
                    if self.shared.options.track_disposable_transients {
                        self.track(disposable)?;
                    }
                }
                Ok(built.value)
            }
        }
    }

    fn release(&self) -> usize {
        let pending = self.disposers.lock().drain_reverse();
        let cached = std::mem::take(&mut *self.scoped.lock());
        let count = pending.len();
        for disposable in pending {
            disposable.dispose();
        }
        drop(cached);
        count
    }
}

impl ContainerScope for NativeScope {
    fn resolve(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        self.ensure_active()?;
        trace!(scope = self.id, service = key.type_name(), "resolve");
        let entry = self
            .shared
            .last(key)
            .ok_or(DiError::NotFound(*key))?;
        self.resolve_entry(key, &entry)
    }

    fn resolve_all(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>> {
        self.ensure_active()?;
        self.shared
            .all(key)
            .iter()
            .map(|entry| self.resolve_entry(key, entry))
            .collect()
    }

    fn open_scope(&self) -> DiResult<Arc<dyn ContainerScope>> {
        self.ensure_active()?;
        let scope = NativeScope::new(self.shared.clone(), Some(self.self_arc()?));
        debug!(scope = scope.id, parent = self.id, "scope opened");
        Ok(scope)
    }

    fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            trace!(scope = self.id, "scope already disposed");
            return false;
        }
        let released = self.release();
        debug!(scope = self.id, released, "scope disposed");
        true
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
            || self.parent.as_ref().is_some_and(|parent| parent.is_disposed())
    }

    fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    fn track(&self, disposable: Arc<dyn Dispose>) -> DiResult<()> {
        self.ensure_active()?;
        self.disposers.lock().push(disposable);
        Ok(())
    }

    fn scope_id(&self) -> u64 {
        self.id
    }
}

impl Drop for NativeScope {
    fn drop(&mut self) {
        if *self.disposed.get_mut() {
            return;
        }
        let bag = self.disposers.get_mut();
        if !bag.is_empty() {
            let pending = bag.len();
            warn!(scope = self.id, pending, "scope dropped without being disposed; releasing its resources");
        }
        *self.disposed.get_mut() = true;
        self.release();
    }
}

/// The container shipped with the crate.
///
/// # Examples
///
/// ```
/// use service_bridge::{ContainerOptions, NativeContainer, ServiceBridge, ServiceCollection, Lifetime};
/// use std::sync::Arc;
///
/// let container = Arc::new(NativeContainer::with_options(ContainerOptions::default()));
/// let bridge = ServiceBridge::with_container(container).unwrap();
///
/// let mut services = ServiceCollection::new();
/// services.add_instance(Arc::new(42u32));
/// bridge.populate(services).unwrap();
///
/// assert_eq!(*bridge.root_provider().get_required::<u32>().unwrap(), 42);
/// ```
pub struct NativeContainer {
    root: Arc<NativeScope>,
}

impl NativeContainer {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        debug!(?options, "container created");
        let shared = Arc::new(Shared {
            registry: RwLock::new(Map::default()),
            next_entry_id: AtomicU64::new(0),
            builds: BuildTable::default(),
            options,
        });
        Self {
            root: NativeScope::new_root(shared),
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.root.shared.options
    }

    /// Dumps the registration table.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let registry = self.root.shared.registry.read();
        let mut keys: Vec<&ServiceKey> = registry.keys().collect();
        keys.sort_by_key(|k| k.type_name());

        let mut s = String::from("=== Container Registrations ===\n");
        for key in keys {
            for entry in &registry[key] {
                let kind = match &entry.registration.activation {
                    Activation::Constructor { implementation, .. } => format!("type {}", implementation),
                    Activation::Delegate(_) => "factory".to_string(),
                    Activation::Instance(_) => "instance".to_string(),
                };
                s.push_str(&format!("  {} #{}: {:?} ({})\n", key, entry.id, entry.registration.reuse, kind));
            }
        }
        s
    }
}

impl Default for NativeContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Registrar for NativeContainer {
    fn register(&self, key: ServiceKey, registration: Registration) -> DiResult<bool> {
        let shared = &self.root.shared;
        let mut registry = shared.registry.write();
        let entries = registry.entry(key).or_default();

        if !registration.append && !entries.is_empty() {
            match shared.options.conflict_policy {
                ConflictPolicy::LastWins => {
                    if let Some(implementation) = registration.implementation() {
                        let duplicate = entries
                            .iter()
                            .any(|e| e.registration.implementation() == Some(implementation));
                        if duplicate {
                            debug!(service = key.type_name(), implementation = implementation.type_name(), "implementation already registered");
                            return Ok(false);
                        }
                    }
                }
                ConflictPolicy::Replace => {
                    debug!(service = key.type_name(), replaced = entries.len(), "replacing registrations");
                    entries.clear();
                }
                ConflictPolicy::KeepFirst => {
                    debug!(service = key.type_name(), "keeping existing registration");
                    return Ok(false);
                }
                ConflictPolicy::Reject => return Err(DiError::DuplicateRegistration(key.type_name())),
            }
        }

        let id = shared.next_entry_id.fetch_add(1, Ordering::Relaxed);
        debug!(service = key.type_name(), reuse = ?registration.reuse, id, "registered");
        entries.push(Arc::new(Entry {
            id,
            registration,
            singleton: OnceCell::new(),
        }));
        Ok(true)
    }

    fn registration_count(&self, key: &ServiceKey) -> usize {
        self.root.shared.registry.read().get(key).map_or(0, Vec::len)
    }
}

impl ContainerScope for NativeContainer {
    fn resolve(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        self.root.resolve(key)
    }

    fn resolve_all(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>> {
        self.root.resolve_all(key)
    }

    fn open_scope(&self) -> DiResult<Arc<dyn ContainerScope>> {
        self.root.open_scope()
    }

    fn dispose(&self) -> bool {
        self.root.dispose()
    }

    fn is_disposed(&self) -> bool {
        self.root.is_disposed()
    }

    fn is_root(&self) -> bool {
        true
    }

    fn track(&self, disposable: Arc<dyn Dispose>) -> DiResult<()> {
        self.root.track(disposable)
    }

    fn scope_id(&self) -> u64 {
        self.root.id
    }
}

impl Container for NativeContainer {
    fn root_scope(self: Arc<Self>) -> Arc<dyn ContainerScope> {
        self.root.clone()
    }

    fn registrar(&self) -> &dyn Registrar {
        self
    }
}
