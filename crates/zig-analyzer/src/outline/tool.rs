use std::{
    fmt::{Display, Formatter},
    path::Path,
    process::Stdio,
};

use tokio::process::Command;
use tracing::debug;

use super::declaration::Declaration;

/// Run `<tool> outline <file>` and parse its JSON declaration list.
///
/// The outline tool reads the file from disk, so callers that want an
/// up-to-date outline must make sure the buffer has been saved first.
pub async fn run_outline(
    tool: &str,
    file_path: &Path,
) -> Result<Vec<Declaration>, OutlineError> {
    debug!("outline: {tool} outline {}", file_path.display());

    let output = Command::new(tool)
        .arg("outline")
        .arg(file_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => OutlineError::ToolNotFound(tool.to_string()),
            _ => OutlineError::LaunchFailed {
                command: tool.to_string(),
                reason: error.to_string(),
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(OutlineError::ToolFailed {
            command: tool.to_string(),
            stderr: if stderr.is_empty() {
                format!("process exited with status {}", output.status)
            } else {
                stderr
            },
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_declarations(&stdout)
}

/// Parse the tool's stdout into declaration records.
pub fn parse_declarations(raw: &str) -> Result<Vec<Declaration>, OutlineError> {
    serde_json::from_str(raw).map_err(|error| OutlineError::InvalidOutput {
        reason: error.to_string(),
    })
}

#[derive(Debug)]
pub enum OutlineError {
    /// The outline executable was not found on the search path.
    ToolNotFound(String),
    /// The executable exists but could not be started.
    LaunchFailed {
        command: String,
        reason: String,
    },
    /// The tool ran and exited non-zero; `stderr` carries its raw diagnostics.
    ToolFailed {
        command: String,
        stderr: String,
    },
    /// The tool's stdout was not a JSON array of declaration records.
    InvalidOutput {
        reason: String,
    },
}

impl Display for OutlineError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::ToolNotFound(command) => {
                write!(
                    f,
                    "could not find {command}; add it to your PATH or point zig-analyzer.outlinePath at the binary"
                )
            },
            Self::LaunchFailed {
                command,
                reason,
            } => {
                write!(f, "failed to launch {command}: {reason}")
            },
            Self::ToolFailed {
                command,
                stderr,
            } => {
                write!(f, "{command} failed: {stderr}")
            },
            Self::InvalidOutput {
                reason,
            } => {
                write!(f, "outline output was not valid JSON: {reason}")
            },
        }
    }
}

impl std::error::Error for OutlineError {}

#[cfg(test)]
#[path = "../../tests/src/outline/tool_tests.rs"]
mod tests;
