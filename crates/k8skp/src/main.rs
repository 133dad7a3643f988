use std::convert::Infallible;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use k8s_kernel_provider::{DiscoveredKernel, KubernetesKernelProvider};
use k8s_kernelspec::{paths, InstallError, Installer, InstallerConfig, ValidationError};
use log::{debug, error, info};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

mod logging;

#[derive(Parser)]
#[command(
    name = "jupyter-k8s-kernelspec",
    version,
    about = "Application used to create kernelspecs for use on Kubernetes clusters",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// A Jupyter kernel for use within a Kubernetes cluster
    Install(InstallArgs),
    /// List installed Kubernetes kernel specifications
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// List installed specs even when not running in a cluster
        #[arg(long)]
        ignore_cluster: bool,
    },
}

#[derive(Args, Debug)]
struct InstallArgs {
    /// Install to the per-user kernel registry
    #[arg(long)]
    user: bool,

    /// Install to the active virtual or conda environment
    #[arg(long = "sys-prefix", conflicts_with = "prefix")]
    sys_prefix: bool,

    /// Install kernelspec for Spark on Kubernetes
    #[arg(long)]
    spark: bool,

    /// Install kernelspec with tensorflow support
    #[arg(long)]
    tensorflow: bool,

    /// Set log level to DEBUG
    #[arg(long)]
    debug: bool,

    /// Specify a prefix to install to, e.g. an env. The kernelspec will be
    /// installed in PREFIX/share/jupyter/kernels/
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<PathBuf>,

    /// Install the kernel spec into a directory with this name
    #[arg(long = "kernel_name", visible_alias = "kernel-name", value_parser = unquote)]
    kernel_name: Option<String>,

    /// The display name of the kernel
    #[arg(long = "display_name", visible_alias = "display-name", value_parser = unquote)]
    display_name: Option<String>,

    /// The kernel image (or Spark driver image) to use
    #[arg(
        long = "image_name",
        visible_alias = "image-name",
        env = "K8SKP_IMAGE_NAME",
        value_parser = unquote
    )]
    image_name: Option<String>,

    /// The Spark executor image; defaults to the kernel image
    #[arg(
        long = "executor_image_name",
        visible_alias = "executor-image-name",
        env = "K8SKP_EXECUTOR_IMAGE_NAME",
        value_parser = unquote
    )]
    executor_image_name: Option<String>,

    /// The language of the underlying kernel: 'Python', 'R' or 'Scala' [default: Python]
    #[arg(long, value_parser = unquote)]
    language: Option<String>,

    /// Where the Spark files can be found [default: /opt/spark]
    #[arg(
        long = "spark_home",
        visible_alias = "spark-home",
        env = "SPARK_HOME",
        value_parser = unquote
    )]
    spark_home: Option<String>,

    /// Spark context initialization mode: 'lazy', 'eager' or 'none' [default: lazy]
    #[arg(
        long = "spark_init_mode",
        visible_alias = "spark-init-mode",
        value_parser = unquote
    )]
    spark_init_mode: Option<String>,

    /// Additional Spark options
    #[arg(
        long = "extra_spark_opts",
        visible_alias = "extra-spark-opts",
        value_parser = unquote,
        allow_hyphen_values = true
    )]
    extra_spark_opts: Option<String>,
}

/// Drop one pair of matching surrounding quotes, as a shell would.
fn unquote(value: &str) -> Result<String, Infallible> {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Ok(inner.to_string());
        }
    }
    Ok(value.to_string())
}

#[derive(Tabled)]
struct KernelTableRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "LANGUAGE")]
    language: String,
    #[tabled(rename = "DISPLAY NAME")]
    display_name: String,
    #[tabled(rename = "IMAGE")]
    image: String,
    #[tabled(rename = "PATH")]
    path: String,
}

impl From<&DiscoveredKernel> for KernelTableRow {
    fn from(kernel: &DiscoveredKernel) -> Self {
        KernelTableRow {
            name: kernel.name.clone(),
            language: kernel.spec.language.clone(),
            display_name: kernel.spec.display_name.clone(),
            image: kernel.image_name().unwrap_or("-").to_string(),
            path: shorten_path(&kernel.resource_dir),
        }
    }
}

/// Shorten a path for display by replacing home directory with ~
fn shorten_path(path: &std::path::Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}

#[derive(Serialize)]
struct KernelListing<'a> {
    name: &'a str,
    resource_dir: &'a std::path::Path,
    display_name: &'a str,
    language: &'a str,
    image_name: Option<&'a str>,
    executor_image_name: Option<&'a str>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; usage errors exit 1.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let (app, debug, command) = match cli.command {
        Some(Commands::Install(args)) => (logging::INSTALLER_APP, args.debug, Commands::Install(args)),
        Some(command @ Commands::List { .. }) => (logging::PROVIDER_APP, false, command),
        None => {
            println!("No subcommand specified. Must specify one of: install, list");
            println!();
            println!("{}", Cli::command().render_help());
            std::process::exit(1);
        }
    };

    logging::init(app, debug);

    let result = match command {
        Commands::Install(args) => install(args),
        Commands::List {
            json,
            ignore_cluster,
        } => list_kernels(json, ignore_cluster),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn install(args: InstallArgs) -> Result<()> {
    debug!("Install options: {:?}", args);

    // Scope conflicts are reported before the environment is looked up.
    if args.user && args.sys_prefix {
        return Err(ValidationError::ConflictingScope.into());
    }
    let prefix = if args.sys_prefix {
        Some(paths::active_env_prefix().ok_or(InstallError::NoActiveEnvironment)?)
    } else {
        args.prefix
    };

    let config = InstallerConfig {
        language: args.language,
        kernel_name: args.kernel_name,
        display_name: args.display_name,
        image_name: args.image_name,
        executor_image_name: args.executor_image_name,
        spark_home: args.spark_home,
        spark_init_mode: args.spark_init_mode,
        extra_spark_opts: args.extra_spark_opts,
        user: args.user,
        prefix,
        spark: args.spark,
        tensorflow: args.tensorflow,
    };

    let install_dir = Installer::default().install(config)?;
    debug!("Installed kernel specification in {}", install_dir.display());
    Ok(())
}

fn list_kernels(json_output: bool, ignore_cluster: bool) -> Result<()> {
    let provider = KubernetesKernelProvider::default();
    let kernels = if ignore_cluster {
        provider.find_installed_kernels()
    } else {
        provider.find_kernels()?
    };
    info!("Found {} kernel specification(s)", kernels.len());

    if json_output {
        let listing: Vec<KernelListing> = kernels
            .iter()
            .map(|k| KernelListing {
                name: &k.name,
                resource_dir: &k.resource_dir,
                display_name: &k.spec.display_name,
                language: &k.spec.language,
                image_name: k.image_name(),
                executor_image_name: k.executor_image_name(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if kernels.is_empty() {
        println!("No Kubernetes kernel specifications found.");
        return Ok(());
    }

    let rows: Vec<KernelTableRow> = kernels.iter().map(KernelTableRow::from).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}
