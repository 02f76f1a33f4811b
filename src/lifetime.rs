//! Service lifetimes and their translation into container reuse policies.

use std::fmt;
use std::str::FromStr;

use crate::error::DiError;

/// Service lifetimes as declared by the host framework.
///
/// # Examples
///
/// ```rust
/// use service_bridge::{Lifetime, Reuse};
///
/// assert_eq!(Reuse::from(Lifetime::Singleton), Reuse::Singleton);
/// assert_eq!(Reuse::from(Lifetime::Scoped), Reuse::ScopedOrSingleton);
/// assert_eq!(Reuse::from(Lifetime::Transient), Reuse::Transient);
///
/// // Tags coming from configuration are validated.
/// assert_eq!("scoped".parse::<Lifetime>().unwrap(), Lifetime::Scoped);
/// assert!("pooled".parse::<Lifetime>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// Single instance per root container, cached forever
    Singleton,
    /// Single instance per scope, cached for the scope's lifetime
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    /// All lifetimes, in declaration order.
    pub const ALL: [Lifetime; 3] = [Lifetime::Singleton, Lifetime::Scoped, Lifetime::Transient];

    /// Translates this lifetime into the container's reuse policy.
    #[inline]
    pub fn reuse(self) -> Reuse {
        match self {
            Lifetime::Singleton => Reuse::Singleton,
            // Infrastructure services get resolved before any scope exists.
            Lifetime::Scoped => Reuse::ScopedOrSingleton,
            Lifetime::Transient => Reuse::Transient,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "scoped" => Ok(Lifetime::Scoped),
            "transient" => Ok(Lifetime::Transient),
            _ => Err(DiError::InvalidLifetime(s.to_string())),
        }
    }
}

/// Numeric tags, in the host framework's declaration order.
impl TryFrom<u8> for Lifetime {
    type Error = DiError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Lifetime::Singleton),
            1 => Ok(Lifetime::Scoped),
            2 => Ok(Lifetime::Transient),
            other => Err(DiError::InvalidLifetime(other.to_string())),
        }
    }
}

/// How the container reuses the instances it builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reuse {
    /// One instance for the whole container, owned by the root.
    Singleton,
    /// One instance per open scope. Outside of any scope the root acts as
    /// the scope, so the instance becomes process-wide instead of failing.
    ScopedOrSingleton,
    /// A fresh instance for every resolution.
    Transient,
}

impl From<Lifetime> for Reuse {
    fn from(lifetime: Lifetime) -> Self {
        lifetime.reuse()
    }
}
