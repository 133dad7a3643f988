//! The provider the host kernel manager discovers kernels through.

use std::path::PathBuf;

use k8s_kernelspec::{KernelSpec, KernelSpecManager, KERNEL_FILE};
use log::{debug, warn};
use serde::Serialize;

use crate::error::ProviderError;
use crate::membership::{ClusterMembership, Membership};

/// Identifier the host registers this provider under.
pub const PROVIDER_ID: &str = "k8skp";

/// Lifecycle manager instantiated by the host for each discovered kernel.
pub const LIFECYCLE_MANAGER_CLASS: &str =
    "kubernetes_kernel_provider.k8s.KubernetesKernelLifecycleManager";

/// A kernel spec this provider can launch.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredKernel {
    pub name: String,
    pub resource_dir: PathBuf,
    pub spec: KernelSpec,
}

impl DiscoveredKernel {
    /// Kernel (or Spark driver) image from the lifecycle manager config.
    pub fn image_name(&self) -> Option<&str> {
        self.spec.lifecycle_manager_config("image_name")
    }

    pub fn executor_image_name(&self) -> Option<&str> {
        self.spec.lifecycle_manager_config("executor_image_name")
    }
}

/// Kernel provider for kernels launched as Kubernetes pods.
///
/// Discovery is only meaningful inside a cluster; elsewhere
/// [`find_kernels`](Self::find_kernels) reports nothing.
#[derive(Debug)]
pub struct KubernetesKernelProvider {
    manager: KernelSpecManager,
    lifecycle_manager_classes: Vec<String>,
    membership: ClusterMembership,
}

impl Default for KubernetesKernelProvider {
    fn default() -> Self {
        Self::new(
            KernelSpecManager::new(KERNEL_FILE),
            ClusterMembership::from_env(),
        )
    }
}

impl KubernetesKernelProvider {
    pub fn new(manager: KernelSpecManager, membership: ClusterMembership) -> Self {
        Self {
            manager,
            lifecycle_manager_classes: vec![LIFECYCLE_MANAGER_CLASS.to_string()],
            membership,
        }
    }

    pub fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    pub fn kernel_file(&self) -> &str {
        self.manager.kernel_file()
    }

    pub fn lifecycle_manager_classes(&self) -> &[String] {
        &self.lifecycle_manager_classes
    }

    pub fn membership(&self) -> &ClusterMembership {
        &self.membership
    }

    /// Kernels available to the host.
    ///
    /// Outside a cluster this is empty, with a rate-limited warning.
    pub fn find_kernels(&self) -> Result<Vec<DiscoveredKernel>, ProviderError> {
        match self.membership.membership()? {
            Membership::InCluster => Ok(self.find_installed_kernels()),
            Membership::NotInCluster => {
                self.membership.warn_not_in_cluster();
                Ok(Vec::new())
            }
        }
    }

    /// Installed kernel specs handled by one of our lifecycle managers,
    /// regardless of cluster membership.
    pub fn find_installed_kernels(&self) -> Vec<DiscoveredKernel> {
        let mut kernels = Vec::new();
        for (name, resource_dir) in self.manager.find_kernel_specs() {
            let spec = match self.manager.get_kernel_spec(&resource_dir) {
                Ok(spec) => spec,
                Err(e) => {
                    warn!("Skipping kernel spec '{}': {}", name, e);
                    continue;
                }
            };

            match spec.lifecycle_manager_class() {
                Some(class) if self.lifecycle_manager_classes.iter().any(|c| c == class) => {
                    kernels.push(DiscoveredKernel {
                        name,
                        resource_dir,
                        spec,
                    });
                }
                other => {
                    debug!(
                        "Skipping kernel spec '{}': lifecycle manager {:?} is not handled by {}",
                        name, other, PROVIDER_ID
                    );
                }
            }
        }
        kernels
    }
}
