use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifying context of one executor, resolved once at construction.
///
/// Handed to the operation module before the first operation and reused
/// implicitly by every call. Never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    /// Identity of the module whose model the operations act on.
    pub target_name: String,
    /// Identity of the host (startup) module. Equal to `target_name` unless
    /// a separate host module was given.
    pub startup_target_name: String,
    /// Directory containing the host module.
    pub app_base_path: PathBuf,
    /// Directory the host process was started from.
    pub working_dir: PathBuf,
    /// Project directory that generated files are written relative to.
    pub project_dir: PathBuf,
    /// Namespace generated code is placed in by default.
    pub root_namespace: String,
    /// Language tag for generated artifacts, if one was requested.
    pub language: Option<String>,
}
