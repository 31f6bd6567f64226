//! Code check tool definition.
//!
//! Passes a validated file or project directory to `eslint` or
//! `tsc --noEmit`. A project-local `node_modules/.bin` copy of the checker
//! is preferred over one on `PATH`.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, async_route, structured_result};
use crate::domains::tools::process::{CommandLimits, CommandOutput, locate, run_command};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Checker {
    Eslint,
    Tsc,
}

/// Parameters for the code check tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CodeCheckParams {
    /// File or project directory to check.
    pub path: String,

    /// "eslint" or "tsc".
    pub checker: Checker,
}

#[derive(Debug, Serialize, JsonSchema)]
struct CheckReport {
    checker: Checker,
    target: String,
    /// True when the checker exited with status 0.
    passed: bool,
    output: CommandOutput,
}

/// Code check tool - lint or type-check JavaScript/TypeScript sources.
pub struct CodeCheckTool;

impl CodeCheckTool {
    pub const NAME: &'static str = "code_check";

    pub const DESCRIPTION: &'static str = "Check JavaScript/TypeScript code with eslint or the TypeScript compiler (tsc --noEmit). Reports whether the check passed and the checker's output.";

    #[instrument(skip_all, fields(path = %params.path, checker = ?params.checker))]
    pub async fn execute(params: CodeCheckParams, ctx: Arc<ToolContext>) -> CallToolResult {
        match Self::check(&params, &ctx).await {
            Ok(report) => {
                info!(passed = report.passed, "Code check finished");
                let verdict = if report.passed { "passed" } else { "reported problems" };
                let mut summary = format!("{:?} {} for {}", report.checker, verdict, report.target);
                let output = report.output.combined();
                if !output.is_empty() {
                    summary.push_str("\n\n");
                    summary.push_str(&output);
                }
                structured_result(summary, &report)
            }
            Err(e) => e.into_call_result(),
        }
    }

    async fn check(params: &CodeCheckParams, ctx: &ToolContext) -> Result<CheckReport, ToolError> {
        let target = ctx.validate(&params.path)?;
        let metadata = std::fs::metadata(&target)
            .map_err(|_| ToolError::not_found(format!("Path does not exist: {}", params.path)))?;

        let cwd = if metadata.is_dir() {
            target.clone()
        } else {
            target
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| ToolError::internal("file without parent directory"))?
        };

        let (binary, args) = match params.checker {
            Checker::Eslint => (
                &ctx.config.tools.eslint_binary,
                vec![
                    "--no-color".to_string(),
                    "--format".to_string(),
                    "stylish".to_string(),
                    target.to_string_lossy().to_string(),
                ],
            ),
            Checker::Tsc => (&ctx.config.tools.tsc_binary, tsc_arguments(&target, metadata.is_dir())?),
        };

        let local_bin = find_local_bin(&cwd, ctx);
        let program = locate(binary, local_bin.as_deref(), &cwd)?;

        let limits = CommandLimits {
            timeout: Duration::from_secs(ctx.config.limits.command_timeout_secs),
            max_output_bytes: ctx.config.limits.max_output_bytes,
        };
        let output = run_command(&program, &args, &cwd, &[("NO_COLOR", "1")], limits).await?;

        Ok(CheckReport {
            checker: params.checker,
            target: target.to_string_lossy().to_string(),
            passed: output.success(),
            output,
        })
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<CodeCheckParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<CheckReport>()),
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

/// `tsc` checks a project through its tsconfig.json, or a single file.
fn tsc_arguments(target: &Path, is_dir: bool) -> Result<Vec<String>, ToolError> {
    let mut args = vec![
        "--noEmit".to_string(),
        "--pretty".to_string(),
        "false".to_string(),
    ];
    if is_dir {
        let tsconfig = target.join("tsconfig.json");
        if !tsconfig.is_file() {
            return Err(ToolError::invalid_arguments(format!(
                "No tsconfig.json in {}; pass a file or a project directory",
                target.display()
            )));
        }
        args.push("--project".to_string());
        args.push(tsconfig.to_string_lossy().to_string());
    } else {
        args.push(target.to_string_lossy().to_string());
    }
    Ok(args)
}

/// Nearest `node_modules/.bin` at or above `start` that is still allowed.
fn find_local_bin(start: &Path, ctx: &ToolContext) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join("node_modules").join(".bin"))
        .find(|bin| bin.is_dir())
        .and_then(|bin| ctx.validate(&bin.to_string_lossy()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::security::AllowedDirectories;
    use crate::domains::tools::context::test_support::{is_error, sandbox, text};
    use std::fs;

    #[test]
    fn test_tsc_arguments() {
        let (_temp, root, _ctx) = sandbox();
        fs::write(root.join("index.ts"), "let x: number = 1;").unwrap();

        let file_args = tsc_arguments(&root.join("index.ts"), false).unwrap();
        assert_eq!(file_args[0], "--noEmit");
        assert!(file_args.last().unwrap().ends_with("index.ts"));

        assert!(tsc_arguments(&root, true).is_err());
        fs::write(root.join("tsconfig.json"), "{}").unwrap();
        let project_args = tsc_arguments(&root, true).unwrap();
        assert!(project_args.contains(&"--project".to_string()));
    }

    #[test]
    fn test_local_bin_is_found() {
        let (_temp, root, ctx) = sandbox();
        let bin = root.join("node_modules").join(".bin");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();

        assert_eq!(find_local_bin(&root.join("src"), &ctx), Some(bin));
    }

    #[tokio::test]
    async fn test_missing_checker_binary() {
        let (_temp, root, _ctx) = sandbox();
        fs::write(root.join("a.js"), "var a = 1;").unwrap();

        let mut config = Config::default();
        config.tools.eslint_binary = "eslint-that-does-not-exist-xyz".to_string();
        let ctx = ToolContext::new(
            Arc::new(config),
            AllowedDirectories::new([root.to_string_lossy()]),
        );

        let result = CodeCheckTool::execute(
            CodeCheckParams {
                path: root.join("a.js").to_string_lossy().to_string(),
                checker: Checker::Eslint,
            },
            Arc::new(ctx),
        )
        .await;
        assert!(is_error(&result));
        assert!(text(&result).contains("Command not available"));
    }

    #[tokio::test]
    async fn test_path_outside_allowed() {
        let (_temp, _root, ctx) = sandbox();
        let outside = tempfile::TempDir::new().unwrap();

        let result = CodeCheckTool::execute(
            CodeCheckParams {
                path: outside.path().to_string_lossy().to_string(),
                checker: Checker::Tsc,
            },
            Arc::new(ctx),
        )
        .await;
        assert!(is_error(&result));
    }
}
