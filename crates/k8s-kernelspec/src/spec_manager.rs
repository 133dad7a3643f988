//! Kernel-spec registry: installing spec directories and finding them again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::InstallScope;
use crate::error::{InstallError, InstallResult};
use crate::kernelspec::KernelSpec;
use crate::paths;

/// Manages kernel spec directories identified by a specific kernel file name.
///
/// Only directories containing the kernel file count as kernel specs, so
/// specs for other providers sharing the registry are ignored.
#[derive(Debug, Clone)]
pub struct KernelSpecManager {
    kernel_file: String,
    search_path: Option<Vec<PathBuf>>,
}

impl KernelSpecManager {
    pub fn new(kernel_file: impl Into<String>) -> Self {
        Self {
            kernel_file: kernel_file.into(),
            search_path: None,
        }
    }

    /// Restrict discovery to the given data directories instead of the Jupyter path.
    pub fn with_search_path(mut self, data_dirs: Vec<PathBuf>) -> Self {
        self.search_path = Some(data_dirs);
        self
    }

    pub fn kernel_file(&self) -> &str {
        &self.kernel_file
    }

    /// Copy `source_dir` into the registry as `kernel_name` and return the destination.
    ///
    /// The name is lower-cased. An existing spec with the same name in the
    /// destination is replaced.
    pub fn install_kernel_spec(
        &self,
        source_dir: &Path,
        kernel_name: &str,
        scope: &InstallScope,
    ) -> InstallResult<PathBuf> {
        let kernel_name = kernel_name.to_lowercase();
        if !is_valid_kernel_name(&kernel_name) {
            return Err(InstallError::InvalidKernelName(kernel_name));
        }

        let kernel_file = source_dir.join(&self.kernel_file);
        if !kernel_file.is_file() {
            return Err(InstallError::MissingKernelFile(kernel_file));
        }

        let destination = paths::kernels_dir(scope).join(&kernel_name);
        if destination.exists() {
            debug!("Removing existing kernelspec in {}", destination.display());
            fs::remove_dir_all(&destination)
                .map_err(|e| InstallError::io("Failed to remove existing kernelspec", &destination, e))?;
        }

        debug!("Installing kernelspec in {}", destination.display());
        copy_tree(source_dir, &destination)?;
        Ok(destination)
    }

    /// Map of kernel name to spec directory across the search path.
    ///
    /// When the same name appears in several data directories, the first
    /// one in search order wins.
    pub fn find_kernel_specs(&self) -> BTreeMap<String, PathBuf> {
        let data_dirs = self.search_path.clone().unwrap_or_else(paths::jupyter_path);
        let mut specs = BTreeMap::new();

        for data_dir in data_dirs {
            let kernels_dir = data_dir.join("kernels");
            let Ok(entries) = fs::read_dir(&kernels_dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.join(&self.kernel_file).is_file() {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let name = name.to_lowercase();
                if !specs.contains_key(&name) {
                    debug!("Found kernel spec {} in {}", name, kernels_dir.display());
                    specs.insert(name, path);
                }
            }
        }

        specs
    }

    /// Read and parse the kernel file in a spec directory.
    pub fn get_kernel_spec(&self, resource_dir: &Path) -> InstallResult<KernelSpec> {
        let kernel_file = resource_dir.join(&self.kernel_file);
        let contents = fs::read_to_string(&kernel_file)
            .map_err(|e| InstallError::io("Failed to read kernel file", &kernel_file, e))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Kernel names are limited to ASCII letters, digits, `.`, `_` and `-`.
pub fn is_valid_kernel_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Recursively copy a directory tree, creating `dst` and its parents.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> InstallResult<()> {
    fs::create_dir_all(dst).map_err(|e| InstallError::io("Failed to create directory", dst, e))?;

    let entries = fs::read_dir(src).map_err(|e| InstallError::io("Failed to read directory", src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| InstallError::io("Failed to read directory", src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| InstallError::io("Failed to copy file", &from, e))?;
        }
    }
    Ok(())
}
