//! Cluster membership detection.
//!
//! Whether the process runs inside a Kubernetes cluster is probed once and
//! then cached for the life of the process. A process that is not in a
//! cluster is never probed again.

#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::ProviderError;

/// Set by Kubernetes in every container; its presence means we are meant
/// to be in a cluster.
pub const KUBERNETES_SERVICE_HOST: &str = "KUBERNETES_SERVICE_HOST";

/// Seconds between repeated "not in a cluster" warnings.
pub const WARNING_INTERVAL_ENV: &str = "K8SKP_LOGGED_WARNING_INTERVAL_SECS";

pub const DEFAULT_WARNING_INTERVAL: Duration = Duration::from_secs(600);

/// Failure to load in-cluster configuration.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ProbeError(pub String);

/// Source of truth for cluster membership.
pub trait ClusterProbe: Send + Sync {
    /// Load the service-account configuration mounted into cluster pods.
    fn load_incluster_config(&self) -> Result<(), ProbeError>;

    /// Whether the environment claims we are running in a cluster.
    fn in_cluster_env(&self) -> bool {
        std::env::var_os(KUBERNETES_SERVICE_HOST).is_some()
    }
}

/// Probe backed by kube's in-cluster configuration loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubeInClusterProbe;

impl ClusterProbe for KubeInClusterProbe {
    fn load_incluster_config(&self) -> Result<(), ProbeError> {
        kube::Config::incluster()
            .map(|_| ())
            .map_err(|e| ProbeError(e.to_string()))
    }
}

/// Result of the membership probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    InCluster,
    NotInCluster,
}

#[derive(Debug, Clone)]
enum Verdict {
    InCluster,
    NotInCluster,
    Misconfigured(String),
}

/// Provider configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Minimum time between "not in a cluster" warnings.
    pub warning_interval: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            warning_interval: DEFAULT_WARNING_INTERVAL,
        }
    }
}

impl ProviderConfig {
    /// Read `K8SKP_LOGGED_WARNING_INTERVAL_SECS`, falling back to the default
    /// when it is unset or not a whole number of seconds.
    pub fn from_env() -> Self {
        let warning_interval = match std::env::var(WARNING_INTERVAL_ENV) {
            Ok(value) => match value.trim().parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    warn!(
                        "Ignoring {}={:?}: expected a number of seconds",
                        WARNING_INTERVAL_ENV, value
                    );
                    DEFAULT_WARNING_INTERVAL
                }
            },
            Err(_) => DEFAULT_WARNING_INTERVAL,
        };
        Self { warning_interval }
    }
}

/// Lazily probed, thread-safe cluster membership cache.
///
/// Concurrent first callers race to probe; exactly one probe runs and the
/// rest observe its verdict.
pub struct ClusterMembership {
    probe: Box<dyn ClusterProbe>,
    verdict: OnceLock<Verdict>,
    warning_interval: Duration,
    last_warning: Mutex<Option<Instant>>,
    #[cfg(test)]
    warnings_logged: AtomicU64,
}

impl std::fmt::Debug for ClusterMembership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterMembership")
            .field("verdict", &self.verdict.get())
            .field("warning_interval", &self.warning_interval)
            .finish_non_exhaustive()
    }
}

impl ClusterMembership {
    pub fn new(probe: impl ClusterProbe + 'static, warning_interval: Duration) -> Self {
        Self {
            probe: Box::new(probe),
            verdict: OnceLock::new(),
            warning_interval,
            last_warning: Mutex::new(None),
            #[cfg(test)]
            warnings_logged: AtomicU64::new(0),
        }
    }

    /// Membership backed by kube, configured from the environment.
    pub fn from_env() -> Self {
        Self::new(KubeInClusterProbe, ProviderConfig::from_env().warning_interval)
    }

    /// Whether this process runs inside a cluster.
    ///
    /// A failed probe while `KUBERNETES_SERVICE_HOST` is set is a broken
    /// deployment: that verdict is cached too, and every call returns it as
    /// an error.
    pub fn membership(&self) -> Result<Membership, ProviderError> {
        match self.verdict.get_or_init(|| self.run_probe()) {
            Verdict::InCluster => Ok(Membership::InCluster),
            Verdict::NotInCluster => Ok(Membership::NotInCluster),
            Verdict::Misconfigured(reason) => Err(ProviderError::Misconfigured(reason.clone())),
        }
    }

    fn run_probe(&self) -> Verdict {
        match self.probe.load_incluster_config() {
            Ok(()) => {
                debug!("Loaded in-cluster Kubernetes configuration");
                Verdict::InCluster
            }
            Err(e) if self.probe.in_cluster_env() => Verdict::Misconfigured(e.to_string()),
            Err(e) => {
                debug!("Not running in a Kubernetes cluster: {}", e);
                Verdict::NotInCluster
            }
        }
    }

    pub fn warning_interval(&self) -> Duration {
        self.warning_interval
    }

    /// Log the "not in a cluster" warning unless one was logged within the
    /// warning interval. Returns whether the warning was logged.
    pub fn warn_not_in_cluster(&self) -> bool {
        if !self.warning_due_at(Instant::now()) {
            return false;
        }
        warn!(
            "Kubernetes kernel provider is not running within a Kubernetes cluster; \
             its kernels are unavailable. This warning repeats at most every {} seconds ({}).",
            self.warning_interval.as_secs(),
            WARNING_INTERVAL_ENV
        );
        #[cfg(test)]
        self.warnings_logged.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Claim the warning slot at `now` if the interval has elapsed.
    pub fn warning_due_at(&self, now: Instant) -> bool {
        let mut last = self
            .last_warning
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(previous) if now.saturating_duration_since(previous) < self.warning_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn warnings_logged(&self) -> u64 {
        self.warnings_logged.load(Ordering::Relaxed)
    }
}
