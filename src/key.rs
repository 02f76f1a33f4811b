//! Service identifiers.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identifier of a service.
///
/// A service is identified by the `TypeId` of the type it is requested as,
/// which may be a concrete type (`Database`) or a trait object
/// (`dyn Logger`). The type name is carried along for diagnostics only and
/// takes no part in equality or hashing.
///
/// The generic service-locator boundary cannot keep static types, so this
/// key plus a `dyn Any` downcast is where resolution goes dynamic.
///
/// # Examples
///
/// ```rust
/// use service_bridge::ServiceKey;
///
/// trait Logger: Send + Sync {}
///
/// let a = ServiceKey::of::<String>();
/// let b = ServiceKey::of::<String>();
/// assert_eq!(a, b);
/// assert_eq!(a.type_name(), "alloc::string::String");
///
/// let logger = ServiceKey::of::<dyn Logger>();
/// assert_ne!(a, logger);
/// assert!(logger.type_name().contains("Logger"));
/// ```
#[derive(Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    /// Key for service type `S` (sized or `dyn Trait`).
    #[inline(always)]
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
        }
    }

    /// The underlying `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name, as reported by `std::any::type_name`.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Whether this key names service `S`.
    pub fn is<S: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<S>()
    }
}

impl PartialEq for ServiceKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
