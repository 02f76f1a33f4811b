//! Container configuration.
//!
//! Options are plain data with defaults matching the host framework's
//! expectations. They can be tuned in code, read from `SERVICE_BRIDGE_*`
//! environment variables, or (with the `config` feature) loaded from JSON.

use std::env;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Prefix of the environment variables read by [`ContainerOptions::from_env`].
pub const ENV_PREFIX: &str = "SERVICE_BRIDGE_";

/// What happens when a service is registered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum ConflictPolicy {
    /// Append the new registration; single resolution uses the last one.
    /// Registering the same implementation type twice is a no-op.
    #[default]
    LastWins,
    /// Drop earlier registrations of the service.
    Replace,
    /// Ignore the new registration if the service already has one.
    KeepFirst,
    /// Fail with [`DiError::DuplicateRegistration`].
    Reject,
}

impl FromStr for ConflictPolicy {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last_wins" | "lastwins" => Ok(ConflictPolicy::LastWins),
            "replace" => Ok(ConflictPolicy::Replace),
            "keep_first" | "keepfirst" => Ok(ConflictPolicy::KeepFirst),
            "reject" => Ok(ConflictPolicy::Reject),
            _ => Err(DiError::InvalidOption {
                option: "conflict_policy",
                value: s.to_string(),
            }),
        }
    }
}

/// How a scoped service behaves when resolved with no scope open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum ScopedFallback {
    /// The root acts as the scope: one process-wide instance.
    #[default]
    SingletonOutsideScope,
    /// Fail with [`DiError::NoActiveScope`].
    Strict,
}

impl FromStr for ScopedFallback {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton_outside_scope" | "singleton" => Ok(ScopedFallback::SingletonOutsideScope),
            "strict" => Ok(ScopedFallback::Strict),
            _ => Err(DiError::InvalidOption {
                option: "scoped_fallback",
                value: s.to_string(),
            }),
        }
    }
}

/// Container options
///
/// # Examples
///
/// ```
/// use service_bridge::{ConflictPolicy, ContainerOptions, ScopedFallback};
///
/// let options = ContainerOptions::default()
///     .with_conflict_policy(ConflictPolicy::Reject)
///     .with_scoped_fallback(ScopedFallback::Strict);
///
/// assert!(options.track_disposable_transients);
/// assert_eq!(options.max_resolution_depth, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    pub conflict_policy: ConflictPolicy,
    /// Disposable transients are released with the scope that built them.
    pub track_disposable_transients: bool,
    pub scoped_fallback: ScopedFallback,
    pub max_resolution_depth: usize,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::LastWins,
            track_disposable_transients: true,
            scoped_fallback: ScopedFallback::SingletonOutsideScope,
            max_resolution_depth: 1024,
        }
    }
}

impl ContainerOptions {
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn with_disposable_transient_tracking(mut self, enabled: bool) -> Self {
        self.track_disposable_transients = enabled;
        self
    }

    pub fn with_scoped_fallback(mut self, fallback: ScopedFallback) -> Self {
        self.scoped_fallback = fallback;
        self
    }

    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// Defaults overridden by `SERVICE_BRIDGE_*` environment variables.
    ///
    /// Recognized: `CONFLICT_POLICY`, `TRACK_DISPOSABLE_TRANSIENTS`,
    /// `SCOPED_FALLBACK`, `MAX_RESOLUTION_DEPTH`. Unparseable values are
    /// configuration errors.
    pub fn from_env() -> DiResult<Self> {
        Self::from_lookup(|name| env::var(format!("{ENV_PREFIX}{name}")).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading from any source.
    pub fn from_lookup<F>(lookup: F) -> DiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(value) = lookup("CONFLICT_POLICY") {
            options.conflict_policy = value.parse()?;
        }
        if let Some(value) = lookup("TRACK_DISPOSABLE_TRANSIENTS") {
            options.track_disposable_transients = parse_bool(&value).ok_or_else(|| DiError::InvalidOption {
                option: "track_disposable_transients",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("SCOPED_FALLBACK") {
            options.scoped_fallback = value.parse()?;
        }
        if let Some(value) = lookup("MAX_RESOLUTION_DEPTH") {
            options.max_resolution_depth = value.trim().parse().map_err(|_| DiError::InvalidOption {
                option: "max_resolution_depth",
                value: value.clone(),
            })?;
        }

        tracing::debug!(?options, "container options loaded");
        Ok(options)
    }

    /// Parses options from JSON; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::InvalidOption {
            option: "json",
            value: e.to_string(),
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
