//! End-to-end installs into a scratch prefix.
//!
//! Every test installs with `InstallScope::Prefix` into its own temporary
//! directory, so no environment variables are touched.

use std::fs;
use std::path::{Path, PathBuf};

use k8s_kernelspec::{
    finalize_kernel_json, InstallError, Installer, InstallerConfig, ValidationError, KERNEL_FILE,
};
use serde_json::Value;
use tempfile::TempDir;

fn prefix_config(temp: &TempDir) -> InstallerConfig {
    InstallerConfig {
        prefix: Some(temp.path().to_path_buf()),
        ..Default::default()
    }
}

fn kernels_dir(temp: &TempDir) -> PathBuf {
    temp.path().join("share").join("jupyter").join("kernels")
}

fn read_kernel_json(install_dir: &Path) -> Value {
    let contents = fs::read_to_string(install_dir.join(KERNEL_FILE)).unwrap();
    serde_json::from_str(&contents).unwrap()
}

#[test]
fn test_install_python_spark_defaults() {
    let temp = TempDir::new().unwrap();
    let config = InstallerConfig {
        spark: true,
        spark_home: Some("/foo/bar".into()),
        ..prefix_config(&temp)
    };

    let install_dir = Installer::default().install(config).unwrap();
    assert_eq!(install_dir, kernels_dir(&temp).join("k8skp_python_spark"));

    let kernel = read_kernel_json(&install_dir);
    assert!(kernel["display_name"]
        .as_str()
        .unwrap()
        .ends_with("(with Spark)"));
    assert_eq!(kernel["env"]["SPARK_HOME"], "/foo/bar");
    let config = &kernel["metadata"]["lifecycle_manager"]["config"];
    assert_eq!(config["image_name"], "elyra/kernel-spark-py:dev");
    assert_eq!(config["executor_image_name"], "elyra/kernel-spark-py:dev");

    let argv = kernel["argv"].as_array().unwrap();
    assert_eq!(argv.last().unwrap(), "lazy");
    assert_eq!(
        argv[0].as_str().unwrap(),
        format!("{}/bin/run.sh", install_dir.display())
    );

    // Runtime variables in the Spark options are left for the launcher.
    let spark_opts = kernel["env"]["SPARK_OPTS"].as_str().unwrap();
    assert!(spark_opts.contains("${KUBERNETES_SERVICE_HOST}"));
    assert!(spark_opts.contains("spark.kubernetes.driver.container.image=elyra/kernel-spark-py:dev"));

    assert!(install_dir.join("bin").join("run.sh").is_file());
    assert!(install_dir.join("scripts").join("launch_kubernetes.py").is_file());
    assert!(install_dir.join("logo-svg.svg").is_file());
}

#[test]
fn test_install_named_python_kernel() {
    let temp = TempDir::new().unwrap();
    let config = InstallerConfig {
        display_name: Some("My Python Kernel".into()),
        kernel_name: Some("my_python_kernel".into()),
        image_name: Some("foo/bar:zed".into()),
        spark_home: Some("/bar/foo".into()),
        ..prefix_config(&temp)
    };

    let install_dir = Installer::default().install(config).unwrap();
    assert_eq!(install_dir, kernels_dir(&temp).join("my_python_kernel"));

    let kernel = read_kernel_json(&install_dir);
    assert_eq!(kernel["display_name"], "My Python Kernel");
    assert!(kernel["env"].get("SPARK_HOME").is_none());
    assert_eq!(
        kernel["metadata"]["lifecycle_manager"]["config"]["image_name"],
        "foo/bar:zed"
    );
    assert_eq!(kernel["interrupt_mode"], "signal");
}

#[test]
fn test_install_r_spark_kernel() {
    let temp = TempDir::new().unwrap();
    let config = InstallerConfig {
        language: Some("R".into()),
        display_name: Some("My R Kernel".into()),
        kernel_name: Some("my_r_kernel".into()),
        spark: true,
        spark_home: Some("/bar/foo".into()),
        ..prefix_config(&temp)
    };

    let install_dir = Installer::default().install(config).unwrap();
    let kernel = read_kernel_json(&install_dir);
    assert_eq!(kernel["display_name"], "My R Kernel");
    assert_eq!(kernel["language"], "R");
    assert_eq!(kernel["env"]["SPARK_HOME"], "/bar/foo");
    assert_eq!(kernel["argv"].as_array().unwrap().last().unwrap(), "lazy");
    assert_eq!(
        kernel["metadata"]["lifecycle_manager"]["config"]["image_name"],
        "elyra/kernel-spark-r:dev"
    );
}

#[test]
fn test_install_scala_spark_kernel_with_extra_opts() {
    let temp = TempDir::new().unwrap();
    let config = InstallerConfig {
        language: Some("Scala".into()),
        display_name: Some("My Scala Kernel".into()),
        kernel_name: Some("my_scala_kernel".into()),
        extra_spark_opts: Some("--MyExtraSparkOpts".into()),
        spark: true,
        ..prefix_config(&temp)
    };

    let install_dir = Installer::default().install(config).unwrap();
    let kernel = read_kernel_json(&install_dir);
    assert_eq!(kernel["display_name"], "My Scala Kernel");
    assert!(kernel["env"]["__TOREE_SPARK_OPTS__"]
        .as_str()
        .unwrap()
        .contains("--MyExtraSparkOpts"));
}

#[test]
fn test_install_tensorflow_kernel() {
    let temp = TempDir::new().unwrap();
    let config = InstallerConfig {
        tensorflow: true,
        display_name: Some("My TF Kernel".into()),
        kernel_name: Some("my_tf_kernel".into()),
        ..prefix_config(&temp)
    };

    let install_dir = Installer::default().install(config).unwrap();
    assert_eq!(install_dir, kernels_dir(&temp).join("my_tf_kernel"));

    let kernel = read_kernel_json(&install_dir);
    assert_eq!(kernel["language"], "python");
    assert_eq!(kernel["display_name"], "My TF Kernel");
    assert!(kernel["env"].get("SPARK_HOME").is_none());
    assert_eq!(
        kernel["argv"].as_array().unwrap().last().unwrap(),
        "{response_address}"
    );
    assert_eq!(
        kernel["metadata"]["lifecycle_manager"]["config"]["image_name"],
        "elyra/kernel-tf-py:dev"
    );
}

#[test]
fn test_every_flavor_writes_executor_image() {
    let cases = [
        (None, false, "elyra/kernel-py:dev"),
        (Some("R"), false, "elyra/kernel-r:dev"),
        (Some("Scala"), false, "elyra/kernel-scala:dev"),
        (None, true, "elyra/kernel-tf-py:dev"),
    ];

    for (language, tensorflow, image) in cases {
        let temp = TempDir::new().unwrap();
        let config = InstallerConfig {
            language: language.map(String::from),
            tensorflow,
            ..prefix_config(&temp)
        };
        let install_dir = Installer::default().install(config).unwrap();
        let kernel = read_kernel_json(&install_dir);
        let config = &kernel["metadata"]["lifecycle_manager"]["config"];
        assert_eq!(config["image_name"], image, "{}", install_dir.display());
        assert_eq!(config["executor_image_name"], image, "{}", install_dir.display());
    }
}

#[test]
fn test_explicit_executor_image_without_spark() {
    let temp = TempDir::new().unwrap();
    let config = InstallerConfig {
        executor_image_name: Some("foo/executor:1".into()),
        ..prefix_config(&temp)
    };
    let install_dir = Installer::default().install(config).unwrap();
    let kernel = read_kernel_json(&install_dir);
    assert_eq!(
        kernel["metadata"]["lifecycle_manager"]["config"]["executor_image_name"],
        "foo/executor:1"
    );
}

#[test]
fn test_global_default_names_take_spark_defaults() {
    let temp = TempDir::new().unwrap();
    let config = InstallerConfig {
        spark: true,
        kernel_name: Some("k8skp_python".into()),
        display_name: Some("Kubernetes Python".into()),
        ..prefix_config(&temp)
    };
    let install_dir = Installer::default().install(config).unwrap();
    assert_eq!(install_dir, kernels_dir(&temp).join("k8skp_python_spark"));
    let kernel = read_kernel_json(&install_dir);
    assert_eq!(kernel["display_name"], "Kubernetes Python (with Spark)");
}

#[test]
fn test_kernel_name_with_spaces_is_sanitized() {
    let temp = TempDir::new().unwrap();
    let config = InstallerConfig {
        kernel_name: Some("my spaced kernel".into()),
        ..prefix_config(&temp)
    };
    let install_dir = Installer::default().install(config).unwrap();
    assert_eq!(install_dir, kernels_dir(&temp).join("my_spaced_kernel"));
}

#[test]
fn test_invalid_combinations_write_nothing() {
    let temp = TempDir::new().unwrap();
    let cases = [
        (
            InstallerConfig {
                spark: true,
                tensorflow: true,
                ..prefix_config(&temp)
            },
            ValidationError::TensorflowWithSpark,
        ),
        (
            InstallerConfig {
                language: Some("R".into()),
                tensorflow: true,
                ..prefix_config(&temp)
            },
            ValidationError::TensorflowRequiresPython,
        ),
        (
            InstallerConfig {
                user: true,
                ..prefix_config(&temp)
            },
            ValidationError::ConflictingScope,
        ),
    ];

    for (config, expected) in cases {
        match Installer::default().install(config) {
            Err(InstallError::Validation(err)) => assert_eq!(err, expected),
            other => panic!("expected {expected:?}, got {other:?}"),
        }
    }
    assert!(!temp.path().join("share").exists());
}

#[test]
fn test_reinstall_produces_identical_kernel_file() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let make = |temp: &TempDir| InstallerConfig {
        kernel_name: Some("same".into()),
        spark: true,
        spark_home: Some("/opt/spark".into()),
        ..prefix_config(temp)
    };

    let a = Installer::default().install(make(&first)).unwrap();
    let b = Installer::default().install(make(&second)).unwrap();

    // The documents differ only in their install directory.
    let a_text = fs::read_to_string(a.join(KERNEL_FILE)).unwrap();
    let b_text = fs::read_to_string(b.join(KERNEL_FILE)).unwrap();
    assert_eq!(
        a_text.replace(&a.display().to_string(), "<dir>"),
        b_text.replace(&b.display().to_string(), "<dir>")
    );
}

#[test]
fn test_finalize_already_final_document_is_stable() {
    let temp = TempDir::new().unwrap();
    let install_dir = Installer::default().install(prefix_config(&temp)).unwrap();
    let kernel_file = install_dir.join(KERNEL_FILE);
    let before = fs::read(&kernel_file).unwrap();

    let resolved = prefix_config(&temp).resolve().unwrap();
    finalize_kernel_json(&kernel_file, &resolved.substitutions(&install_dir)).unwrap();

    assert_eq!(before, fs::read(&kernel_file).unwrap());
}
