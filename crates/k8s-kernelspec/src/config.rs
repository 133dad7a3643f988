//! Installer configuration and the validation pass that resolves it.
//!
//! [`InstallerConfig`] mirrors the command line: anything the caller did not
//! supply is `None`. [`InstallerConfig::resolve`] applies every validation
//! rule in a fixed order and fills in language, Spark and Tensorflow
//! specific defaults, producing a [`ResolvedInstall`] with no optional
//! names left.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default Spark home when neither `--spark_home` nor `SPARK_HOME` is set.
pub const DEFAULT_SPARK_HOME: &str = "/opt/spark";

const SPARK_SUFFIX: &str = "_spark";
const SPARK_DISPLAY_NAME_SUFFIX: &str = " (with Spark)";
const TENSORFLOW_SUFFIX: &str = "_tf";
const TENSORFLOW_DISPLAY_NAME_SUFFIX: &str = " (with Tensorflow)";
const TENSORFLOW_IMAGE_NAME: &str = "elyra/kernel-tf-py:dev";

/// Kernel languages with bundled templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    Scala,
    R,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Scala, Language::R];

    /// Case-insensitive lookup (`Python`, `python` and `PYTHON` all match).
    pub fn parse(value: &str) -> Option<Self> {
        let lowered = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|l| l.as_str() == lowered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Scala => "scala",
            Language::R => "r",
        }
    }

    pub fn default_kernel_name(&self) -> &'static str {
        match self {
            Language::Python => "k8skp_python",
            Language::Scala => "k8skp_scala",
            Language::R => "k8skp_r",
        }
    }

    pub fn default_display_name(&self) -> &'static str {
        match self {
            Language::Python => "Kubernetes Python",
            Language::Scala => "Kubernetes Scala",
            Language::R => "Kubernetes R",
        }
    }

    pub fn default_image_name(&self) -> &'static str {
        match self {
            Language::Python => "elyra/kernel-py:dev",
            Language::Scala => "elyra/kernel-scala:dev",
            Language::R => "elyra/kernel-r:dev",
        }
    }

    /// Driver image used when Spark support is requested.
    pub fn default_spark_image_name(&self) -> &'static str {
        match self {
            Language::Python => "elyra/kernel-spark-py:dev",
            Language::Scala => "elyra/kernel-scala:dev",
            Language::R => "elyra/kernel-spark-r:dev",
        }
    }

    pub(crate) fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the Spark context is created when the kernel starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SparkInitMode {
    #[default]
    Lazy,
    Eager,
    None,
}

impl SparkInitMode {
    pub const ALL: [SparkInitMode; 3] = [SparkInitMode::Lazy, SparkInitMode::Eager, SparkInitMode::None];

    pub fn parse(value: &str) -> Option<Self> {
        let lowered = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|m| m.as_str() == lowered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SparkInitMode::Lazy => "lazy",
            SparkInitMode::Eager => "eager",
            SparkInitMode::None => "none",
        }
    }

    pub(crate) fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for SparkInitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which template family a kernel spec is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelFlavor {
    Plain,
    Spark,
    Tensorflow,
}

impl KernelFlavor {
    fn kernel_name_suffix(&self) -> &'static str {
        match self {
            KernelFlavor::Plain => "",
            KernelFlavor::Spark => SPARK_SUFFIX,
            KernelFlavor::Tensorflow => TENSORFLOW_SUFFIX,
        }
    }

    fn display_name_suffix(&self) -> &'static str {
        match self {
            KernelFlavor::Plain => "",
            KernelFlavor::Spark => SPARK_DISPLAY_NAME_SUFFIX,
            KernelFlavor::Tensorflow => TENSORFLOW_DISPLAY_NAME_SUFFIX,
        }
    }
}

/// Where in the kernel-spec registry a spec is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallScope {
    /// The per-user Jupyter data directory.
    User,
    /// `PREFIX/share/jupyter/kernels`, e.g. a virtual or conda environment.
    Prefix(PathBuf),
    /// The system-wide Jupyter data directory.
    System,
}

/// Installer options as supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct InstallerConfig {
    /// Language name as entered; matched case-insensitively.
    pub language: Option<String>,
    pub kernel_name: Option<String>,
    pub display_name: Option<String>,
    pub image_name: Option<String>,
    pub executor_image_name: Option<String>,
    pub spark_home: Option<String>,
    pub spark_init_mode: Option<String>,
    pub extra_spark_opts: Option<String>,
    pub user: bool,
    pub prefix: Option<PathBuf>,
    pub spark: bool,
    pub tensorflow: bool,
}

/// A fully validated installation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstall {
    pub language: Language,
    pub flavor: KernelFlavor,
    pub kernel_name: String,
    pub display_name: String,
    /// Bundled template directory, e.g. `k8skp_python_spark`.
    pub template_dir: String,
    pub image_name: String,
    /// Falls back to `image_name` when not given.
    pub executor_image_name: String,
    pub spark_home: String,
    pub spark_init_mode: SparkInitMode,
    pub extra_spark_opts: String,
    pub scope: InstallScope,
}

impl InstallerConfig {
    /// Validate the options and derive every defaulted value.
    ///
    /// Rules are applied in order: scope flags, language, Tensorflow
    /// language restriction, Tensorflow/Spark exclusion, Spark init mode.
    pub fn resolve(self) -> Result<ResolvedInstall, ValidationError> {
        let prefix = self.prefix.filter(|p| !p.as_os_str().is_empty());
        if self.user && prefix.is_some() {
            return Err(ValidationError::ConflictingScope);
        }
        let scope = match prefix {
            Some(prefix) => InstallScope::Prefix(prefix),
            None if self.user => InstallScope::User,
            None => InstallScope::System,
        };

        let language = match self.language.as_deref() {
            None => Language::default(),
            Some(entered) => {
                Language::parse(entered).ok_or_else(|| ValidationError::UnsupportedLanguage {
                    entered: entered.to_string(),
                })?
            }
        };

        if self.tensorflow {
            if language != Language::Python {
                return Err(ValidationError::TensorflowRequiresPython);
            }
            if self.spark {
                return Err(ValidationError::TensorflowWithSpark);
            }
        }

        let flavor = if self.spark {
            KernelFlavor::Spark
        } else if self.tensorflow {
            KernelFlavor::Tensorflow
        } else {
            KernelFlavor::Plain
        };

        let mut extra_spark_opts = self.extra_spark_opts.unwrap_or_default();
        let spark_init_mode = if flavor == KernelFlavor::Spark {
            match self.spark_init_mode.as_deref() {
                None => SparkInitMode::default(),
                Some(entered) => SparkInitMode::parse(entered).ok_or_else(|| {
                    ValidationError::UnsupportedSparkInitMode {
                        entered: entered.to_lowercase(),
                    }
                })?,
            }
        } else {
            if !extra_spark_opts.is_empty() {
                warn!("--extra_spark_opts will be ignored since --spark has not been specified.");
                extra_spark_opts.clear();
            }
            SparkInitMode::None
        };

        let template_dir = format!(
            "{}{}",
            language.default_kernel_name(),
            flavor.kernel_name_suffix()
        );
        // Names equal to the global (Python) defaults count as left at default.
        let global = Language::default();
        let kernel_name = match self.kernel_name {
            Some(name) if name != global.default_kernel_name() => name,
            _ => template_dir.clone(),
        };
        let display_name = match self.display_name {
            Some(name) if name != global.default_display_name() => name,
            _ => format!(
                "{}{}",
                language.default_display_name(),
                flavor.display_name_suffix()
            ),
        };

        let image_name = self.image_name.unwrap_or_else(|| {
            match flavor {
                KernelFlavor::Plain => language.default_image_name(),
                KernelFlavor::Spark => language.default_spark_image_name(),
                KernelFlavor::Tensorflow => TENSORFLOW_IMAGE_NAME,
            }
            .to_string()
        });
        let executor_image_name = self
            .executor_image_name
            .unwrap_or_else(|| image_name.clone());

        Ok(ResolvedInstall {
            language,
            flavor,
            kernel_name: sanitize_kernel_name(&kernel_name),
            display_name,
            template_dir,
            image_name,
            executor_image_name,
            spark_home: self
                .spark_home
                .unwrap_or_else(|| DEFAULT_SPARK_HOME.to_string()),
            spark_init_mode,
            extra_spark_opts,
            scope,
        })
    }
}

impl ResolvedInstall {
    /// Resource type used to select logos: `tensorflow` or the language.
    pub fn resource_type(&self) -> &'static str {
        match self.flavor {
            KernelFlavor::Tensorflow => "tensorflow",
            _ => self.language.as_str(),
        }
    }

    /// Values substituted into the kernel file once the install directory is known.
    pub fn substitutions(&self, install_dir: &Path) -> BTreeMap<&'static str, String> {
        let mut subs = BTreeMap::new();
        subs.insert("spark_home", self.spark_home.clone());
        subs.insert("image_name", self.image_name.clone());
        subs.insert("executor_image_name", self.executor_image_name.clone());
        subs.insert("extra_spark_opts", self.extra_spark_opts.clone());
        subs.insert("spark_init_mode", self.spark_init_mode.to_string());
        subs.insert("display_name", self.display_name.clone());
        subs.insert("install_dir", install_dir.display().to_string());
        subs
    }
}

fn sanitize_kernel_name(name: &str) -> String {
    name.replace(' ', "_")
}
