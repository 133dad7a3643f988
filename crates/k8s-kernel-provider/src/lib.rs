//! Kernel provider registration for kernels running in a Kubernetes cluster.
//!
//! The host kernel manager asks [`KubernetesKernelProvider`] for the kernels
//! it can launch. Discovery is gated on cluster membership: outside a
//! cluster the provider reports no kernels and logs a rate-limited warning.

pub mod error;
pub mod membership;
pub mod provider;

pub use error::ProviderError;
pub use membership::{
    ClusterMembership, ClusterProbe, KubeInClusterProbe, Membership, ProbeError, ProviderConfig,
    DEFAULT_WARNING_INTERVAL, KUBERNETES_SERVICE_HOST, WARNING_INTERVAL_ENV,
};
pub use provider::{
    DiscoveredKernel, KubernetesKernelProvider, LIFECYCLE_MANAGER_CLASS, PROVIDER_ID,
};
