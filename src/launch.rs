use std::path::{Path, PathBuf};

use url::Url;

use crate::config::EngineConfig;
use crate::error::{LaunchError, Result};

/// Engine property consulted when `--executor-memory` is not given.
pub const EXECUTOR_MEMORY_KEY: &str = "spark.executor.memory";
/// Engine property consulted when `--executor-cores` is not given.
pub const EXECUTOR_CORES_KEY: &str = "spark.executor.cores";
/// Engine property consulted when `--driver-memory` is not given.
pub const DRIVER_MEMORY_KEY: &str = "spark.driver.memory";

const DEFAULT_EXECUTOR_MEMORY: &str = "1024M";
const DEFAULT_EXECUTOR_CORES: u32 = 1;
const DEFAULT_DRIVER_MEMORY: &str = "512M";

const PRIMARY_PY_FILE: &str = "--primary-py-file";
const ARCHIVES: &str = "--archives";
const CLASS: &str = "--class";
const EXECUTOR_MEMORY: &str = "--executor-memory";
const EXECUTOR_CORES: &str = "--executor-cores";
const DRIVER_MEMORY: &str = "--driver-memory";
const FILES: &str = "--files";
const PY_FILES: &str = "--py-files";
const ARG: &str = "--arg";

/// An archive bundle unpacked on the cluster under a mount alias, e.g. a
/// packaged interpreter environment.
#[derive(Debug, Clone)]
pub struct Archive {
    pub uri: String,
    pub mount_alias: String,
}

impl Archive {
    pub fn new(uri: impl Into<String>, mount_alias: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mount_alias: mount_alias.into(),
        }
    }

    fn reference(&self) -> String {
        format!("{}#{}", self.uri, self.mount_alias)
    }
}

/// Caller-supplied description of one job launch.
///
/// Resource limits left at `None` fall back to the engine configuration
/// at parse time, then to built-in defaults.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Local path of the Python payload.
    pub primary_payload: PathBuf,
    /// Entry-point class of the remote runner.
    pub runner_class: String,
    pub archives: Vec<Archive>,
    pub executor_memory: Option<String>,
    pub executor_cores: Option<u32>,
    pub driver_memory: Option<String>,
    /// Auxiliary runtime files, e.g. a site-configuration file.
    pub files: Vec<String>,
    /// Secondary packaged-library references.
    pub py_files: Vec<String>,
    /// Pass-through arguments for the payload itself, in caller order.
    pub app_args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(primary_payload: impl Into<PathBuf>, runner_class: impl Into<String>) -> Self {
        Self {
            primary_payload: primary_payload.into(),
            runner_class: runner_class.into(),
            archives: Vec::new(),
            executor_memory: None,
            executor_cores: None,
            driver_memory: None,
            files: Vec::new(),
            py_files: Vec::new(),
            app_args: Vec::new(),
        }
    }

    pub fn with_archive(mut self, uri: impl Into<String>, mount_alias: impl Into<String>) -> Self {
        self.archives.push(Archive::new(uri, mount_alias));
        self
    }

    pub fn with_file(mut self, uri: impl Into<String>) -> Self {
        self.files.push(uri.into());
        self
    }

    pub fn with_py_file(mut self, uri: impl Into<String>) -> Self {
        self.py_files.push(uri.into());
        self
    }

    pub fn with_app_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.app_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build the ordered launch-argument list for the remote runner.
    ///
    /// Pure string construction: identical specs always produce an
    /// identical list, and flag/value adjacency is preserved. Fails if
    /// the payload path or any resource reference cannot be expressed as
    /// a URI.
    pub fn assemble(&self) -> Result<Vec<String>> {
        let mut args = Vec::new();

        args.push(PRIMARY_PY_FILE.to_string());
        args.push(payload_uri(&self.primary_payload)?);

        if !self.archives.is_empty() {
            for archive in &self.archives {
                ensure_uri(&archive.uri)?;
            }
            args.push(ARCHIVES.to_string());
            args.push(
                self.archives
                    .iter()
                    .map(Archive::reference)
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }

        args.push(CLASS.to_string());
        args.push(self.runner_class.clone());

        if let Some(memory) = &self.executor_memory {
            args.push(EXECUTOR_MEMORY.to_string());
            args.push(memory.clone());
        }
        if let Some(cores) = self.executor_cores {
            args.push(EXECUTOR_CORES.to_string());
            args.push(cores.to_string());
        }
        if let Some(memory) = &self.driver_memory {
            args.push(DRIVER_MEMORY.to_string());
            args.push(memory.clone());
        }

        if !self.files.is_empty() {
            for uri in &self.files {
                ensure_uri(uri)?;
            }
            args.push(FILES.to_string());
            args.push(self.files.join(","));
        }

        if !self.py_files.is_empty() {
            for uri in &self.py_files {
                ensure_uri(uri)?;
            }
            args.push(PY_FILES.to_string());
            args.push(self.py_files.join(","));
        }

        for arg in &self.app_args {
            args.push(ARG.to_string());
            args.push(arg.clone());
        }

        Ok(args)
    }
}

/// Launch arguments parsed into client-side submission form.
#[derive(Debug, Clone)]
pub struct ClientArguments {
    pub primary_py_file: String,
    pub archives: Vec<String>,
    pub runner_class: String,
    pub executor_memory: String,
    pub executor_cores: u32,
    pub driver_memory: String,
    pub files: Vec<String>,
    pub py_files: Vec<String>,
    pub app_args: Vec<String>,
}

impl ClientArguments {
    /// Parse a launch-argument list against the engine configuration.
    ///
    /// Unknown flags, flags without a value, a malformed core count and
    /// a missing primary payload are all rejected. Resource limits not
    /// present in the list fall back to the engine keys, then to the
    /// built-in defaults.
    pub fn parse(args: &[String], engine: &EngineConfig) -> Result<Self> {
        let mut primary_py_file = None;
        let mut archives = Vec::new();
        let mut runner_class = None;
        let mut executor_memory = None;
        let mut executor_cores = None;
        let mut driver_memory = None;
        let mut files = Vec::new();
        let mut py_files = Vec::new();
        let mut app_args = Vec::new();

        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            match flag.as_str() {
                PRIMARY_PY_FILE => primary_py_file = Some(take_value(flag, &mut iter)?),
                ARCHIVES => archives = split_refs(&take_value(flag, &mut iter)?),
                CLASS => runner_class = Some(take_value(flag, &mut iter)?),
                EXECUTOR_MEMORY => executor_memory = Some(take_value(flag, &mut iter)?),
                EXECUTOR_CORES => {
                    let raw = take_value(flag, &mut iter)?;
                    executor_cores = Some(parse_cores(EXECUTOR_CORES, &raw)?);
                }
                DRIVER_MEMORY => driver_memory = Some(take_value(flag, &mut iter)?),
                FILES => files = split_refs(&take_value(flag, &mut iter)?),
                PY_FILES => py_files = split_refs(&take_value(flag, &mut iter)?),
                ARG => app_args.push(take_value(flag, &mut iter)?),
                other => {
                    return Err(LaunchError::Arguments(format!(
                        "unrecognized launch flag: {other}"
                    )))
                }
            }
        }

        let primary_py_file = primary_py_file
            .ok_or_else(|| LaunchError::Arguments(format!("missing {PRIMARY_PY_FILE}")))?;
        let runner_class =
            runner_class.ok_or_else(|| LaunchError::Arguments(format!("missing {CLASS}")))?;

        let executor_cores = match executor_cores {
            Some(cores) => cores,
            None => match engine.get(EXECUTOR_CORES_KEY) {
                Some(raw) => parse_cores(EXECUTOR_CORES_KEY, raw)?,
                None => DEFAULT_EXECUTOR_CORES,
            },
        };

        Ok(Self {
            primary_py_file,
            archives,
            runner_class,
            executor_memory: executor_memory.unwrap_or_else(|| {
                engine
                    .get_or(EXECUTOR_MEMORY_KEY, DEFAULT_EXECUTOR_MEMORY)
                    .to_string()
            }),
            executor_cores,
            driver_memory: driver_memory.unwrap_or_else(|| {
                engine
                    .get_or(DRIVER_MEMORY_KEY, DEFAULT_DRIVER_MEMORY)
                    .to_string()
            }),
            files,
            py_files,
            app_args,
        })
    }
}

fn take_value(flag: &str, iter: &mut std::slice::Iter<'_, String>) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| LaunchError::Arguments(format!("{flag} requires a value")))
}

fn parse_cores(source: &str, raw: &str) -> Result<u32> {
    raw.parse()
        .map_err(|_| LaunchError::Arguments(format!("{source} expects a count, got {raw}")))
}

fn split_refs(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Locator of the primary payload in URI form. Relative paths resolve
/// against the current directory.
fn payload_uri(path: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let url = Url::from_file_path(&absolute).map_err(|_| {
        LaunchError::Arguments(format!(
            "payload path is not expressible as a URI: {}",
            absolute.display()
        ))
    })?;
    Ok(url.to_string())
}

fn ensure_uri(reference: &str) -> Result<()> {
    Url::parse(reference)
        .map_err(|e| LaunchError::Arguments(format!("invalid resource reference {reference}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNER: &str = "org.apache.spark.deploy.PythonRunner";

    fn full_spec() -> LaunchSpec {
        LaunchSpec::new("/jobs/iris05.py", RUNNER)
            .with_archive("hdfs://s0:8020/user/root/Python.zip", "Python")
            .with_file("hdfs://s0:8020/user/root/hive-site.xml")
            .with_py_file("hdfs://s0:8020/user/root/pyspark.zip")
            .with_py_file("hdfs://s0:8020/user/root/py4j-0.8.2.1-src.zip")
            .with_app_args(["--input", "default.t01", "--mode", "train"])
    }

    #[test]
    fn assemble_emits_the_full_ordered_sequence() {
        let mut spec = full_spec();
        spec.executor_memory = Some("720M".to_string());
        spec.executor_cores = Some(1);
        spec.driver_memory = Some("512M".to_string());

        let args = spec.assemble().unwrap();

        assert_eq!(
            args,
            [
                "--primary-py-file",
                "file:///jobs/iris05.py",
                "--archives",
                "hdfs://s0:8020/user/root/Python.zip#Python",
                "--class",
                "org.apache.spark.deploy.PythonRunner",
                "--executor-memory",
                "720M",
                "--executor-cores",
                "1",
                "--driver-memory",
                "512M",
                "--files",
                "hdfs://s0:8020/user/root/hive-site.xml",
                "--py-files",
                "hdfs://s0:8020/user/root/pyspark.zip,hdfs://s0:8020/user/root/py4j-0.8.2.1-src.zip",
                "--arg",
                "--input",
                "--arg",
                "default.t01",
                "--arg",
                "--mode",
                "--arg",
                "train",
            ]
            .map(String::from)
        );
    }

    #[test]
    fn unset_sections_are_omitted() {
        let spec = LaunchSpec::new("/jobs/iris05.py", RUNNER);
        let args = spec.assemble().unwrap();

        assert_eq!(
            args,
            [
                "--primary-py-file",
                "file:///jobs/iris05.py",
                "--class",
                "org.apache.spark.deploy.PythonRunner",
            ]
            .map(String::from)
        );
    }

    #[test]
    fn assemble_is_deterministic() {
        let spec = full_spec();
        assert_eq!(spec.assemble().unwrap(), spec.assemble().unwrap());
    }

    #[test]
    fn pass_through_arguments_keep_caller_order() {
        let spec = LaunchSpec::new("/jobs/iris05.py", RUNNER)
            .with_app_args(["--input", "tableA", "--mode", "train"]);
        let args = spec.assemble().unwrap();

        let tail: Vec<&str> = args[4..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            [
                "--arg", "--input", "--arg", "tableA", "--arg", "--mode", "--arg", "train"
            ]
        );
    }

    #[test]
    fn relative_payload_resolves_against_current_dir() {
        let spec = LaunchSpec::new("jobs/iris05.py", RUNNER);
        let args = spec.assemble().unwrap();

        assert!(args[1].starts_with("file:///"));
        assert!(args[1].ends_with("/jobs/iris05.py"));
    }

    #[test]
    fn invalid_archive_reference_fails_assembly() {
        let spec = LaunchSpec::new("/jobs/iris05.py", RUNNER)
            .with_archive("not a reference", "Python");
        let err = spec.assemble().unwrap_err();

        assert!(matches!(err, LaunchError::Arguments(_)));
    }

    #[test]
    fn parse_round_trips_an_assembled_list() {
        let mut spec = full_spec();
        spec.executor_memory = Some("720M".to_string());
        let args = spec.assemble().unwrap();

        let parsed = ClientArguments::parse(&args, &EngineConfig::new()).unwrap();

        assert_eq!(parsed.primary_py_file, "file:///jobs/iris05.py");
        assert_eq!(
            parsed.archives,
            vec!["hdfs://s0:8020/user/root/Python.zip#Python"]
        );
        assert_eq!(parsed.runner_class, RUNNER);
        assert_eq!(parsed.executor_memory, "720M");
        assert_eq!(parsed.py_files.len(), 2);
        assert_eq!(
            parsed.app_args,
            vec!["--input", "default.t01", "--mode", "train"]
        );
    }

    #[test]
    fn limits_fall_back_to_engine_config_then_defaults() {
        let args = LaunchSpec::new("/jobs/iris05.py", RUNNER).assemble().unwrap();

        let mut engine = EngineConfig::new();
        engine.set(EXECUTOR_MEMORY_KEY, "720M");
        engine.set(EXECUTOR_CORES_KEY, "4");

        let parsed = ClientArguments::parse(&args, &engine).unwrap();
        assert_eq!(parsed.executor_memory, "720M");
        assert_eq!(parsed.executor_cores, 4);
        assert_eq!(parsed.driver_memory, "512M");

        let parsed = ClientArguments::parse(&args, &EngineConfig::new()).unwrap();
        assert_eq!(parsed.executor_memory, "1024M");
        assert_eq!(parsed.executor_cores, 1);
    }

    #[test]
    fn explicit_flags_win_over_engine_config() {
        let mut spec = LaunchSpec::new("/jobs/iris05.py", RUNNER);
        spec.executor_memory = Some("2G".to_string());
        let args = spec.assemble().unwrap();

        let mut engine = EngineConfig::new();
        engine.set(EXECUTOR_MEMORY_KEY, "720M");

        let parsed = ClientArguments::parse(&args, &engine).unwrap();
        assert_eq!(parsed.executor_memory, "2G");
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let args: Vec<String> = ["--primary-py-file", "file:///a.py", "--bogus", "x"]
            .map(String::from)
            .to_vec();
        let err = ClientArguments::parse(&args, &EngineConfig::new()).unwrap_err();

        assert!(matches!(err, LaunchError::Arguments(_)));
    }

    #[test]
    fn trailing_flag_without_value_is_rejected() {
        let args: Vec<String> = ["--primary-py-file", "file:///a.py", "--class"]
            .map(String::from)
            .to_vec();
        let err = ClientArguments::parse(&args, &EngineConfig::new()).unwrap_err();

        assert!(matches!(err, LaunchError::Arguments(_)));
    }

    #[test]
    fn malformed_core_count_is_rejected() {
        let args: Vec<String> = [
            "--primary-py-file",
            "file:///a.py",
            "--class",
            RUNNER,
            "--executor-cores",
            "lots",
        ]
        .map(String::from)
        .to_vec();
        let err = ClientArguments::parse(&args, &EngineConfig::new()).unwrap_err();

        assert!(matches!(err, LaunchError::Arguments(_)));
    }

    #[test]
    fn missing_primary_payload_is_rejected() {
        let args: Vec<String> = ["--class", RUNNER].map(String::from).to_vec();
        let err = ClientArguments::parse(&args, &EngineConfig::new()).unwrap_err();

        assert!(matches!(err, LaunchError::Arguments(_)));
    }
}
