//! Bundled kernel spec templates and the staging directory built from them.
//!
//! Layout under `assets/`:
//! - `kernelspecs/<template_dir>/`: one kernel file template per flavor
//! - `kernel-launchers/<launcher_type>/`: scripts copied into every spec
//! - `kernel-resources/<resource_type>/`: logos for the language or tensorflow

use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use log::debug;
use rust_embed::Embed;
use tempfile::TempDir;

use crate::error::{InstallError, InstallResult};

#[derive(Embed)]
#[folder = "assets/"]
struct Assets;

/// Launcher type for every spec installed by this crate.
pub const LAUNCHER_TYPE: &str = "kubernetes";

/// Names of the bundled template directories.
pub fn template_dirs() -> Vec<String> {
    let mut dirs: Vec<String> = Assets::iter()
        .filter_map(|path| {
            let rest = path.strip_prefix("kernelspecs/")?;
            rest.split_once('/').map(|(dir, _)| dir.to_string())
        })
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

/// Write every embedded file under `prefix` into `dest`, keeping relative paths.
///
/// Returns the number of files written.
fn extract(prefix: &str, dest: &Path) -> InstallResult<usize> {
    let mut written = 0;
    for path in Assets::iter() {
        let Some(relative) = path.strip_prefix(prefix) else {
            continue;
        };
        let Some(file) = Assets::get(&path) else {
            continue;
        };
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| InstallError::io("Failed to create staging directory", parent, e))?;
        }
        fs::write(&target, file.data.as_ref())
            .map_err(|e| InstallError::io("Failed to write staged file", &target, e))?;

        // Embedded files carry no mode bits; shell launchers are run directly.
        #[cfg(unix)]
        {
            if target.extension().is_some_and(|ext| ext == "sh") {
                fs::set_permissions(&target, fs::Permissions::from_mode(0o755))
                    .map_err(|e| InstallError::io("Failed to set permissions", &target, e))?;
            }
        }
        written += 1;
    }
    Ok(written)
}

/// Assemble a kernel spec directory in a fresh temporary directory.
///
/// The template files come first, then the launcher scripts and the logos
/// for `resource_type` are laid over them. The directory is removed when
/// the returned [`TempDir`] is dropped.
pub fn stage(template_dir: &str, resource_type: &str) -> InstallResult<TempDir> {
    let staging = tempfile::Builder::new()
        .prefix("k8skp_staging_")
        .tempdir()
        .map_err(|e| InstallError::io("Failed to create staging directory", std::env::temp_dir(), e))?;

    let copied = extract(&format!("kernelspecs/{template_dir}/"), staging.path())?;
    if copied == 0 {
        return Err(InstallError::MissingTemplate(template_dir.to_string()));
    }

    let scripts = extract(&format!("kernel-launchers/{LAUNCHER_TYPE}/"), staging.path())?;
    let resources = extract(&format!("kernel-resources/{resource_type}/"), staging.path())?;
    debug!(
        "Staged template '{}' in {} ({} template, {} launcher, {} resource files)",
        template_dir,
        staging.path().display(),
        copied,
        scripts,
        resources
    );

    Ok(staging)
}
