//! Git passthrough tool definition.
//!
//! Runs a fixed set of read-mostly git subcommands inside a validated
//! repository directory. Options that would point git at other locations
//! (`-C`, `--git-dir`, `--no-index`, `--output`, ...) or make it read a
//! named file (`blame --contents`, `grep -f`, ...) are refused.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Content, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, async_route, structured_result};
use crate::domains::tools::process::{CommandLimits, locate, run_command};

const ALLOWED_SUBCOMMANDS: &[&str] = &[
    "blame", "branch", "describe", "diff", "grep", "log", "ls-files", "remote", "rev-parse",
    "shortlog", "show", "status", "tag",
];

const FORBIDDEN_OPTIONS: &[&str] = &[
    "--git-dir",
    "--work-tree",
    "--exec-path",
    "--output",
    "--no-index",
    "--ext-diff",
    "--textconv",
    "--upload-pack",
    "--open-files-in-pager",
    "--config-env",
    "--pathspec-from-file",
];

/// Options whose value names a file git reads, keyed by subcommand.
/// Single-letter entries also match inside clustered short flags (`-nf`).
const FILE_READING_OPTIONS: &[(&str, &[&str])] = &[
    ("blame", &["--contents", "--ignore-revs-file", "-S"]),
    ("grep", &["--file", "-f"]),
    ("ls-files", &["--exclude-from", "-X"]),
];

/// Options that make `git branch` modify refs.
const MUTATING_BRANCH_OPTIONS: &[&str] = &[
    "-d", "-D", "--delete", "-m", "-M", "--move", "-c", "--copy", "-f", "--force", "-u",
    "--set-upstream-to", "--unset-upstream", "--edit-description",
];

/// Options that make `git tag` create or delete tags.
const MUTATING_TAG_OPTIONS: &[&str] = &[
    "-a", "--annotate", "-s", "--sign", "-u", "--local-user", "-f", "--force", "-d", "--delete",
    "-m", "--message", "-F", "--file",
];

/// Parameters for the git tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GitParams {
    /// Repository directory (or any directory inside a work tree).
    pub repo_path: String,

    /// Git subcommand, e.g. "status", "log", "diff".
    pub subcommand: String,

    /// Additional arguments passed to the subcommand.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Git tool - runs an allow-listed git subcommand.
pub struct GitTool;

impl GitTool {
    pub const NAME: &'static str = "git";

    pub const DESCRIPTION: &'static str = "Run a read-only git subcommand (status, log, diff, show, blame, branch, tag, ...) in a repository inside the allowed directories.";

    #[instrument(skip_all, fields(repo = %params.repo_path, subcommand = %params.subcommand))]
    pub async fn execute(params: GitParams, ctx: Arc<ToolContext>) -> CallToolResult {
        match Self::run(&params, &ctx).await {
            Ok(result) => result,
            Err(e) => e.into_call_result(),
        }
    }

    async fn run(params: &GitParams, ctx: &ToolContext) -> Result<CallToolResult, ToolError> {
        check_arguments(&params.subcommand, &params.args)?;

        let repo = ctx.validate(&params.repo_path)?;
        if !repo.is_dir() {
            return Err(ToolError::invalid_arguments(format!(
                "Not a directory: {}",
                params.repo_path
            )));
        }

        let git = locate(&ctx.config.tools.git_binary, None, &repo)?;
        let mut args = vec!["--no-pager".to_string(), params.subcommand.clone()];
        args.extend(params.args.iter().cloned());

        let limits = CommandLimits {
            timeout: Duration::from_secs(ctx.config.limits.command_timeout_secs),
            max_output_bytes: ctx.config.limits.max_output_bytes,
        };
        // Abbreviated long options would slip past the exact-match policy.
        let envs = [
            ("GIT_TERMINAL_PROMPT", "0"),
            ("GIT_OPTIONAL_LOCKS", "0"),
            ("GIT_TEST_DISALLOW_ABBREVIATED_OPTIONS", "1"),
        ];
        let output = run_command(&git, &args, &repo, &envs, limits).await?;

        info!(exit_code = ?output.exit_code, "git finished");

        if output.success() {
            let text = if output.combined().is_empty() {
                format!("git {} completed with no output", params.subcommand)
            } else {
                output.combined()
            };
            Ok(structured_result(text, &output))
        } else {
            Ok(CallToolResult::error(vec![Content::text(format!(
                "git {} failed (exit code {}):\n{}",
                params.subcommand,
                output
                    .exit_code
                    .map_or_else(|| "none".to_string(), |code| code.to_string()),
                output.combined()
            ))]))
        }
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<GitParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    pub fn create_route<S>(ctx: Arc<ToolContext>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        async_route(Self::to_tool(), ctx, Self::execute)
    }
}

/// Refuse subcommands and options outside the read-mostly policy.
fn check_arguments(subcommand: &str, args: &[String]) -> Result<(), ToolError> {
    if !ALLOWED_SUBCOMMANDS.contains(&subcommand) {
        return Err(ToolError::invalid_arguments(format!(
            "git subcommand '{}' is not allowed; allowed: {}",
            subcommand,
            ALLOWED_SUBCOMMANDS.join(", ")
        )));
    }

    for arg in args {
        let option = arg.split('=').next().unwrap_or(arg);
        if FORBIDDEN_OPTIONS.contains(&option) || arg == "-C" || arg == "-O" {
            return Err(ToolError::invalid_arguments(format!(
                "git option '{}' is not allowed",
                arg
            )));
        }
        if reads_file(subcommand, arg) {
            return Err(ToolError::invalid_arguments(format!(
                "git {} {} reads a file outside the path checks",
                subcommand, arg
            )));
        }
        let mutating = match subcommand {
            "branch" => MUTATING_BRANCH_OPTIONS.contains(&option),
            "tag" => MUTATING_TAG_OPTIONS.contains(&option),
            _ => false,
        };
        if mutating {
            return Err(ToolError::invalid_arguments(format!(
                "git {} {} would modify the repository",
                subcommand, arg
            )));
        }
    }

    // `git remote add|remove|rename|set-url ...` and `git tag <name>` mutate
    if subcommand == "remote" {
        if let Some(action) = args.iter().find(|a| !a.starts_with('-')) {
            if action != "show" && action != "get-url" {
                return Err(ToolError::invalid_arguments(format!(
                    "git remote {} would modify the repository",
                    action
                )));
            }
        }
    }
    if matches!(subcommand, "branch" | "tag") {
        let listing_flags = ["-l", "--list", "--contains", "--merged", "--no-merged", "--points-at"];
        let lists = args.is_empty() || args.iter().any(|a| listing_flags.contains(&a.as_str()));
        if !lists && args.iter().any(|a| !a.starts_with('-')) {
            return Err(ToolError::invalid_arguments(format!(
                "git {} with a name creates a ref; use --list to filter",
                subcommand
            )));
        }
    }

    Ok(())
}

fn reads_file(subcommand: &str, arg: &str) -> bool {
    let Some((_, options)) = FILE_READING_OPTIONS
        .iter()
        .find(|(name, _)| *name == subcommand)
    else {
        return false;
    };

    if arg.starts_with("--") {
        let option = arg.split('=').next().unwrap_or(arg);
        return options.contains(&option);
    }
    let Some(cluster) = arg.strip_prefix('-') else {
        return false;
    };
    options
        .iter()
        .filter_map(|option| option.strip_prefix('-'))
        .filter(|flag| flag.len() == 1)
        .any(|flag| cluster.contains(flag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::context::test_support::{is_error, sandbox, text};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_policy_allows_reads() {
        assert!(check_arguments("status", &args(&["--short"])).is_ok());
        assert!(check_arguments("log", &args(&["--oneline", "-n", "5"])).is_ok());
        assert!(check_arguments("branch", &args(&["-a", "-v"])).is_ok());
        assert!(check_arguments("tag", &args(&["--list", "v1.*"])).is_ok());
        assert!(check_arguments("remote", &args(&["-v"])).is_ok());
    }

    #[test]
    fn test_policy_refuses_writes_and_escapes() {
        assert!(check_arguments("commit", &args(&["-m", "x"])).is_err());
        assert!(check_arguments("push", &[]).is_err());
        assert!(check_arguments("diff", &args(&["--no-index", "/etc/passwd", "x"])).is_err());
        assert!(check_arguments("log", &args(&["--output=/tmp/x"])).is_err());
        assert!(check_arguments("status", &args(&["-C", "/"])).is_err());
        assert!(check_arguments("branch", &args(&["-D", "main"])).is_err());
        assert!(check_arguments("branch", &args(&["new-branch"])).is_err());
        assert!(check_arguments("tag", &args(&["v9"])).is_err());
        assert!(check_arguments("tag", &args(&["-a", "v9", "-m", "x"])).is_err());
        assert!(check_arguments("remote", &args(&["add", "o", "url"])).is_err());
    }

    #[test]
    fn test_policy_refuses_file_reading_options() {
        let refused: &[(&str, &[&str])] = &[
            ("blame", &["--contents", "/etc/passwd", "f.txt"]),
            ("blame", &["--contents=/etc/passwd", "f.txt"]),
            ("blame", &["-S", "/tmp/revs", "f.txt"]),
            ("blame", &["-S/tmp/revs", "f.txt"]),
            ("blame", &["--ignore-revs-file", "/tmp/revs", "f.txt"]),
            ("grep", &["-f", "/etc/passwd"]),
            ("grep", &["-nf", "/etc/passwd"]),
            ("grep", &["--file=/etc/passwd"]),
            ("ls-files", &["--exclude-from", "/etc/passwd"]),
            ("ls-files", &["-X", "/etc/passwd"]),
            ("ls-files", &["--pathspec-from-file=/etc/passwd"]),
        ];
        for (subcommand, list) in refused {
            assert!(
                check_arguments(subcommand, &args(list)).is_err(),
                "git {subcommand} {list:?} should be refused"
            );
        }

        assert!(check_arguments("blame", &args(&["-s", "-w", "f.txt"])).is_ok());
        assert!(check_arguments("grep", &args(&["-n", "-i", "todo"])).is_ok());
        assert!(check_arguments("ls-files", &args(&["--exclude=*.o", "-o"])).is_ok());
        assert!(check_arguments("log", &args(&["-f"])).is_ok());
    }

    #[tokio::test]
    async fn test_repo_outside_allowed() {
        let (_temp, _root, ctx) = sandbox();
        let outside = tempfile::TempDir::new().unwrap();
        let result = GitTool::execute(
            GitParams {
                repo_path: outside.path().to_string_lossy().to_string(),
                subcommand: "status".to_string(),
                args: Vec::new(),
            },
            Arc::new(ctx),
        )
        .await;
        assert!(is_error(&result));
        assert!(text(&result).contains("Path security validation failed"));
    }

    #[tokio::test]
    async fn test_status_in_fresh_repository() {
        if which::which("git").is_err() {
            return;
        }
        let (_temp, root, ctx) = sandbox();
        let init = std::process::Command::new("git")
            .arg("init")
            .current_dir(&root)
            .output()
            .unwrap();
        assert!(init.status.success());
        std::fs::write(root.join("new.txt"), "x").unwrap();

        let result = GitTool::execute(
            GitParams {
                repo_path: root.to_string_lossy().to_string(),
                subcommand: "status".to_string(),
                args: args(&["--porcelain"]),
            },
            Arc::new(ctx),
        )
        .await;
        assert!(!is_error(&result));
        assert!(text(&result).contains("?? new.txt"));
    }

    #[tokio::test]
    async fn test_blame_contents_outside_is_refused() {
        let (_temp, root, ctx) = sandbox();
        let outside = tempfile::TempDir::new().unwrap();
        let secret = outside.path().join("secret.txt");
        std::fs::write(&secret, "TOP-SECRET-LINE\n").unwrap();
        std::fs::write(root.join("f.txt"), "line\n").unwrap();

        let result = GitTool::execute(
            GitParams {
                repo_path: root.to_string_lossy().to_string(),
                subcommand: "blame".to_string(),
                args: vec![
                    "--contents".to_string(),
                    secret.to_string_lossy().to_string(),
                    "f.txt".to_string(),
                ],
            },
            Arc::new(ctx),
        )
        .await;
        assert!(is_error(&result));
        assert!(!text(&result).contains("TOP-SECRET-LINE"));
    }
}
