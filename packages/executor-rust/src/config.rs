//! Configuration types for executors and child-process transports.

use std::path::PathBuf;

/// Construction inputs for an [`OperationExecutor`](crate::OperationExecutor).
///
/// Only the target module is required; everything else is resolved against
/// it or against the working directory when the executor is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Path to the module whose model the operations act on.
    pub target_module: PathBuf,
    /// Path to the host (startup) module. Defaults to `target_module`.
    pub startup_module: Option<PathBuf>,
    /// Project directory. Defaults to the working directory.
    pub project_dir: Option<PathBuf>,
    /// Root namespace for generated code. Defaults to the target module identity.
    pub root_namespace: Option<String>,
    /// Language tag for generated artifacts.
    pub language: Option<String>,
    /// Working directory of the host. Defaults to the process current directory.
    pub working_dir: Option<PathBuf>,
}

impl ExecutorOptions {
    #[must_use]
    pub fn new(target_module: impl Into<PathBuf>) -> Self {
        Self {
            target_module: target_module.into(),
            startup_module: None,
            project_dir: None,
            root_namespace: None,
            language: None,
            working_dir: None,
        }
    }

    #[must_use]
    pub fn startup_module(mut self, path: impl Into<PathBuf>) -> Self {
        self.startup_module = Some(path.into());
        self
    }

    #[must_use]
    pub fn project_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn root_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.root_namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// How to start an out-of-process operation module.
///
/// No `Default` impl because the program path has no sensible default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Executable of the operation module.
    pub program: PathBuf,
    /// Arguments passed to the module executable.
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
    /// Working directory of the child. Inherits the host's when `None`.
    pub current_dir: Option<PathBuf>,
}

impl ProcessConfig {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}
