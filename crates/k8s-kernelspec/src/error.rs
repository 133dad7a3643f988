//! Error types for kernel spec installation.

use std::path::PathBuf;

use crate::config::{Language, SparkInitMode};

/// Result type for installer operations.
pub type InstallResult<T> = Result<T, InstallError>;

/// Rejections produced while resolving an [`InstallerConfig`](crate::InstallerConfig).
///
/// Each variant corresponds to one validation rule; the messages are shown
/// to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Can't specify both user and prefix. Please choose one or the other.")]
    ConflictingScope,

    #[error(
        "Language '{entered}' is not in the set of supported languages: {}",
        Language::supported_list()
    )]
    UnsupportedLanguage { entered: String },

    #[error("Tensorflow support is only available for use by Python kernels.")]
    TensorflowRequiresPython,

    #[error("Tensorflow support is mutually exclusive with Spark support.")]
    TensorflowWithSpark,

    #[error(
        "Spark initialization mode '{entered}' is not in the set of supported initialization modes: {}",
        SparkInitMode::supported_list()
    )]
    UnsupportedSparkInitMode { entered: String },
}

/// Errors that can occur while staging, installing or finalizing a kernel spec.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{context} ({}): {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No kernel spec template named '{0}' is bundled with this installer")]
    MissingTemplate(String),

    #[error("Kernel file '{}' was not found", .0.display())]
    MissingKernelFile(PathBuf),

    #[error("Invalid kernel name '{0}': kernel names may only contain ASCII letters, digits, '.', '_' and '-'")]
    InvalidKernelName(String),

    #[error("Kernel spec template did not produce valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Kernel spec template must be a JSON object")]
    NotAnObject,

    #[error("No active environment found; set VIRTUAL_ENV or CONDA_PREFIX, or use --prefix")]
    NoActiveEnvironment,
}

impl InstallError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
