use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;
use tracing::debug;

use super::registry::{SpawnError, TestRunRegistry};

const PROJECT_ROOT_MARKER: &str = "build.zig";

/// Input to one `zig test` invocation.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Absolute path of the Zig file being tested.
    pub file_path: PathBuf,
    /// Specific test names to run; empty means every test in the file.
    pub functions: Vec<String>,
    /// The run was not requested explicitly; its output must not grab the
    /// output surface.
    pub background: bool,
}

impl TestConfig {
    pub fn file(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            functions: Vec::new(),
            background: false,
        }
    }
}

/// Build the argument vector for `zig test`.
pub fn test_args(config: &TestConfig) -> Vec<String> {
    let mut args = vec!["test".to_string(), config.file_path.display().to_string()];
    if !config.functions.is_empty() {
        args.push("--test-filter".to_string());
        args.extend(config.functions.iter().cloned());
    }
    args
}

/// Walks parent directories from `file_path` looking for `build.zig`.
/// Returns the first directory that contains one, or `None`.
pub fn detect_project_root(file_path: &Path) -> Option<PathBuf> {
    let mut dir = if file_path.is_file() {
        file_path.parent()?
    } else {
        file_path
    };
    loop {
        if dir.join(PROJECT_ROOT_MARKER).is_file() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

/// Spawn `zig test` for `config` through the registry.
///
/// The working directory is the enclosing project root when one is found,
/// otherwise the file's own directory.
pub fn run_tests(
    registry: &TestRunRegistry,
    zig_path: &str,
    config: &TestConfig,
) -> Result<JoinHandle<bool>, SpawnError> {
    let args = test_args(config);
    let cwd = detect_project_root(&config.file_path)
        .or_else(|| config.file_path.parent().map(Path::to_path_buf));
    if let Some(root) = &cwd {
        debug!("running tests from {}", root.display());
    }
    registry.spawn(zig_path, &args, cwd.as_deref(), config.background)
}

#[cfg(test)]
#[path = "../../tests/src/testing/runner_tests.rs"]
mod tests;
