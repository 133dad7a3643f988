//! Kernel specifications for Jupyter kernels running in a Kubernetes cluster.
//!
//! This crate installs kernel specs consumed by the Kubernetes kernel
//! provider. It includes:
//!
//! - Installer options and the validation pass that resolves them
//! - Bundled kernel file templates, launcher scripts and logos
//! - Placeholder substitution for kernel file templates
//! - A kernel-spec registry that copies specs into the Jupyter data
//!   directories and finds them again
//!
//! # Installing
//!
//! ```ignore
//! use k8s_kernelspec::{Installer, InstallerConfig};
//!
//! let config = InstallerConfig {
//!     spark: true,
//!     user: true,
//!     ..Default::default()
//! };
//! let install_dir = Installer::default().install(config)?;
//! ```

pub mod assets;
pub mod config;
pub mod error;
pub mod installer;
pub mod kernelspec;
pub mod paths;
pub mod spec_manager;
pub mod template;

/// File name of the kernel spec document written by the installer and
/// read by the provider.
pub const KERNEL_FILE: &str = "k8skp_kernel.json";

// Re-export commonly used items
pub use config::{
    InstallScope, InstallerConfig, KernelFlavor, Language, ResolvedInstall, SparkInitMode,
    DEFAULT_SPARK_HOME,
};
pub use error::{InstallError, InstallResult, ValidationError};
pub use installer::{finalize_kernel_json, render_kernel_json, Installer};
pub use kernelspec::{InterruptMode, KernelSpec};
pub use spec_manager::KernelSpecManager;
