//! Error types for kernel discovery.

/// Errors surfaced by the provider to the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// `KUBERNETES_SERVICE_HOST` is set, so the process is meant to run in a
    /// cluster, but the in-cluster configuration could not be loaded.
    #[error("Failed to load in-cluster Kubernetes configuration although KUBERNETES_SERVICE_HOST is set: {0}")]
    Misconfigured(String),
}
