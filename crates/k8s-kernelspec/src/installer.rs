//! Installs a resolved kernel spec into the registry.
//!
//! Installation happens in three steps: the bundled template is staged in
//! a temporary directory, the registry copies the staged directory into
//! place, and finally the kernel file is rewritten in its installed
//! location. Finalizing after the copy is what lets templates refer to
//! `${install_dir}`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::Value;

use crate::assets;
use crate::config::{InstallerConfig, ResolvedInstall};
use crate::error::{InstallError, InstallResult};
use crate::kernelspec::KernelSpec;
use crate::spec_manager::KernelSpecManager;
use crate::template::{json_string_escape, safe_substitute, strip_comments};
use crate::KERNEL_FILE;

/// Installs kernel specs for the Kubernetes kernel provider.
#[derive(Debug, Clone)]
pub struct Installer {
    manager: KernelSpecManager,
}

impl Default for Installer {
    fn default() -> Self {
        Self::new(KernelSpecManager::new(KERNEL_FILE))
    }
}

impl Installer {
    pub fn new(manager: KernelSpecManager) -> Self {
        Self { manager }
    }

    /// Validate `config` and install the resulting kernel spec.
    ///
    /// Validation failures are returned before anything touches the
    /// filesystem. Returns the installed spec directory.
    pub fn install(&self, config: InstallerConfig) -> InstallResult<PathBuf> {
        let resolved = config.resolve()?;
        self.install_resolved(&resolved)
    }

    pub fn install_resolved(&self, resolved: &ResolvedInstall) -> InstallResult<PathBuf> {
        let staging = assets::stage(&resolved.template_dir, resolved.resource_type())?;

        info!(
            "Installing Kubernetes Kernel Provider kernel specification for '{}'",
            resolved.display_name
        );
        let install_dir =
            self.manager
                .install_kernel_spec(staging.path(), &resolved.kernel_name, &resolved.scope)?;
        drop(staging);

        debug!(
            "Finalizing kernel json file for kernel: '{}'",
            resolved.display_name
        );
        finalize_kernel_json(
            &install_dir.join(self.manager.kernel_file()),
            &resolved.substitutions(&install_dir),
        )?;

        Ok(install_dir)
    }
}

/// Render a kernel file template into its final document.
///
/// Comments are stripped, placeholders substituted (values escaped for a
/// JSON string context), and the result is laid over the default kernel
/// spec.
pub fn render_kernel_json(
    template: &str,
    substitutions: &BTreeMap<&'static str, String>,
) -> InstallResult<String> {
    let escaped: BTreeMap<&str, String> = substitutions
        .iter()
        .map(|(k, v)| (*k, json_string_escape(v)))
        .collect();
    let substituted = safe_substitute(&strip_comments(template), &escaped);

    let Value::Object(document) = serde_json::from_str::<Value>(&substituted)? else {
        return Err(InstallError::NotAnObject);
    };
    let merged = KernelSpec::merge_over_defaults(document);
    Ok(serde_json::to_string_pretty(&merged)?)
}

/// Rewrite the kernel file at `kernel_file` in place.
pub fn finalize_kernel_json(
    kernel_file: &Path,
    substitutions: &BTreeMap<&'static str, String>,
) -> InstallResult<()> {
    let template = fs::read_to_string(kernel_file)
        .map_err(|e| InstallError::io("Failed to read kernel file", kernel_file, e))?;
    let rendered = render_kernel_json(&template, substitutions)?;
    fs::write(kernel_file, rendered)
        .map_err(|e| InstallError::io("Failed to write kernel file", kernel_file, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn subs() -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("display_name", "My \"Quoted\" Kernel".to_string()),
            ("image_name", "foo/bar:zed".to_string()),
            ("install_dir", "/kernels/k".to_string()),
        ])
    }

    const TEMPLATE: &str = r#"# Kernel template
{
  "display_name": "${display_name}",  # shown in the launcher
  "language": "python",
  "argv": ["python", "${install_dir}/scripts/launch_kubernetes.py", "{response_address}"],
  "metadata": {
    "lifecycle_manager": {
      "config": {
        "image_name": "${image_name}",
        "executor_image_name": "${executor_image_name}"
      }
    }
  }
}
"#;

    #[test]
    fn test_render_substitutes_and_merges() {
        let rendered = render_kernel_json(TEMPLATE, &subs()).unwrap();
        let doc: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(doc["display_name"], json!("My \"Quoted\" Kernel"));
        assert_eq!(
            doc["argv"],
            json!(["python", "/kernels/k/scripts/launch_kubernetes.py", "{response_address}"])
        );
        assert_eq!(
            doc["metadata"]["lifecycle_manager"]["config"]["image_name"],
            json!("foo/bar:zed")
        );
        // Unresolved placeholders pass through.
        assert_eq!(
            doc["metadata"]["lifecycle_manager"]["config"]["executor_image_name"],
            json!("${executor_image_name}")
        );
        // Defaults the template omits are present.
        assert_eq!(doc["env"], json!({}));
        assert_eq!(doc["interrupt_mode"], json!("signal"));
    }

    #[test]
    fn test_render_is_pretty_printed() {
        let rendered = render_kernel_json(TEMPLATE, &subs()).unwrap();
        assert!(rendered.starts_with("{\n  \""));
        assert!(!rendered.ends_with('\n'));
    }

    #[test]
    fn test_render_rejects_non_object() {
        let err = render_kernel_json("[1, 2]", &subs()).unwrap_err();
        assert!(matches!(err, InstallError::NotAnObject));
    }

    #[test]
    fn test_render_rejects_invalid_json() {
        let err = render_kernel_json("{\"a\": }", &subs()).unwrap_err();
        assert!(matches!(err, InstallError::Json(_)));
    }

    #[test]
    fn test_finalize_twice_is_byte_identical() {
        let temp = tempfile::tempdir().unwrap();
        let first = temp.path().join("first.json");
        let second = temp.path().join("second.json");
        fs::write(&first, TEMPLATE).unwrap();
        fs::write(&second, TEMPLATE).unwrap();

        finalize_kernel_json(&first, &subs()).unwrap();
        finalize_kernel_json(&second, &subs()).unwrap();

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }
}
