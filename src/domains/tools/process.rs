//! Child-process execution for the passthrough tools.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

use super::ToolError;

/// Captured result of a finished child process.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CommandOutput {
    /// Exit code, absent when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Whether stdout or stderr was cut at the output limit.
    pub truncated: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout and stderr as one text block.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.trim_end().to_string();
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(stderr);
        }
        if self.truncated {
            text.push_str("\n\n(output truncated)");
        }
        text
    }
}

/// Limits applied to one invocation.
#[derive(Debug, Clone, Copy)]
pub struct CommandLimits {
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

/// Locate `binary`, preferring `local_bin` (e.g. `node_modules/.bin`) when given.
pub fn locate(binary: &str, local_bin: Option<&Path>, cwd: &Path) -> Result<PathBuf, ToolError> {
    if let Some(dir) = local_bin {
        if let Ok(path) = which::which_in(binary, Some(dir), cwd) {
            return Ok(path);
        }
    }
    which::which(binary).map_err(|e| ToolError::CommandUnavailable(format!("{}: {}", binary, e)))
}

/// Run `program` in `cwd`, with no stdin, killing it on timeout.
pub async fn run_command(
    program: &Path,
    args: &[String],
    cwd: &Path,
    envs: &[(&str, &str)],
    limits: CommandLimits,
) -> Result<CommandOutput, ToolError> {
    debug!(program = %program.display(), ?args, cwd = %cwd.display(), "Spawning");

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in envs {
        command.env(key, value);
    }

    let child = command.spawn().map_err(|e| {
        ToolError::execution_failed(format!("Failed to start {}: {}", program.display(), e))
    })?;

    let output = tokio::time::timeout(limits.timeout, child.wait_with_output())
        .await
        .map_err(|_| ToolError::Timeout(limits.timeout.as_secs()))??;

    let (stdout, cut_out) = truncate_lossy(&output.stdout, limits.max_output_bytes);
    let (stderr, cut_err) = truncate_lossy(&output.stderr, limits.max_output_bytes);

    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout,
        stderr,
        truncated: cut_out || cut_err,
    })
}

/// Decode as UTF-8 (lossy), keeping at most `max` bytes on a char boundary.
fn truncate_lossy(bytes: &[u8], max: usize) -> (String, bool) {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= max {
        return (text.into_owned(), false);
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (text[..end].to_string(), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_on_char_boundary() {
        let (text, cut) = truncate_lossy("héllo".as_bytes(), 2);
        assert_eq!(text, "h");
        assert!(cut);

        let (text, cut) = truncate_lossy(b"short", 100);
        assert_eq!(text, "short");
        assert!(!cut);
    }

    #[test]
    fn test_combined_output() {
        let output = CommandOutput {
            exit_code: Some(1),
            stdout: "out\n".to_string(),
            stderr: "err\n".to_string(),
            truncated: true,
        };
        assert!(!output.success());
        assert_eq!(output.combined(), "out\n\nerr\n\n(output truncated)");
    }

    #[test]
    fn test_missing_binary() {
        let cwd = std::env::temp_dir();
        let err = locate("definitely-not-a-real-binary-xyz", None, &cwd).unwrap_err();
        assert!(matches!(err, ToolError::CommandUnavailable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child() {
        let sleep = locate("sleep", None, Path::new("/")).unwrap();
        let limits = CommandLimits {
            timeout: Duration::from_millis(100),
            max_output_bytes: 1024,
        };
        let err = run_command(&sleep, &["5".to_string()], Path::new("/"), &[], limits)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
    }
}
