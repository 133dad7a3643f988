//! Jupyter data directory resolution.
//!
//! Kernel specs live in `<data dir>/kernels/<name>`. The search order is:
//! the user data directory, entries of `JUPYTER_PATH`, the active
//! environment prefix, then the system directories.

use std::path::{Path, PathBuf};

use crate::config::InstallScope;

/// Get the per-user Jupyter data directory.
///
/// `JUPYTER_DATA_DIR` wins when set; otherwise:
/// - Linux: `$XDG_DATA_HOME/jupyter` or `~/.local/share/jupyter`
/// - macOS: `~/Library/Jupyter`
/// - Windows: `%APPDATA%\jupyter`
pub fn jupyter_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("JUPYTER_DATA_DIR").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Library")
            .join("Jupyter")
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jupyter")
    }
}

/// System-wide Jupyter data directories, most specific first.
pub fn system_jupyter_dirs() -> Vec<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var_os("PROGRAMDATA")
            .map(|p| vec![PathBuf::from(p).join("jupyter")])
            .unwrap_or_default()
    }

    #[cfg(not(windows))]
    {
        vec![
            PathBuf::from("/usr/local/share/jupyter"),
            PathBuf::from("/usr/share/jupyter"),
        ]
    }
}

/// Prefix of the active Python environment (`VIRTUAL_ENV`, then `CONDA_PREFIX`).
pub fn active_env_prefix() -> Option<PathBuf> {
    ["VIRTUAL_ENV", "CONDA_PREFIX"]
        .iter()
        .filter_map(std::env::var_os)
        .find(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Jupyter data directory inside an installation prefix.
pub fn prefix_data_dir(prefix: &Path) -> PathBuf {
    prefix.join("share").join("jupyter")
}

/// Directory holding kernel specs for the given scope.
pub fn kernels_dir(scope: &InstallScope) -> PathBuf {
    let data_dir = match scope {
        InstallScope::User => jupyter_data_dir(),
        InstallScope::Prefix(prefix) => prefix_data_dir(prefix),
        InstallScope::System => system_jupyter_dirs()
            .into_iter()
            .next()
            .unwrap_or_else(|| prefix_data_dir(Path::new("/usr/local"))),
    };
    data_dir.join("kernels")
}

/// All Jupyter data directories to search, in priority order, without duplicates.
pub fn jupyter_path() -> Vec<PathBuf> {
    let mut paths = vec![jupyter_data_dir()];

    if let Some(extra) = std::env::var_os("JUPYTER_PATH") {
        paths.extend(std::env::split_paths(&extra).filter(|p| !p.as_os_str().is_empty()));
    }
    if let Some(prefix) = active_env_prefix() {
        paths.push(prefix_data_dir(&prefix));
    }
    paths.extend(system_jupyter_dirs());

    let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        if !unique.contains(&path) {
            unique.push(path);
        }
    }
    unique
}
