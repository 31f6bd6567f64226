//! Read file tool definition.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Content, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::read_text_bounded;
use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, blocking_route};

/// Parameters for the read file tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsReadFileParams {
    /// Path to the file to read.
    pub path: String,

    /// Only return the first N lines.
    #[serde(default)]
    pub head: Option<usize>,

    /// Only return the last N lines.
    #[serde(default)]
    pub tail: Option<usize>,
}

/// Read file tool - returns the UTF-8 contents of a file.
pub struct FsReadFileTool;

impl FsReadFileTool {
    pub const NAME: &'static str = "fs_read_file";

    pub const DESCRIPTION: &'static str = "Read the complete contents of a UTF-8 text file. Use 'head' or 'tail' to return only the first or last N lines.";

    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &FsReadFileParams, ctx: &ToolContext) -> CallToolResult {
        match Self::read(params, ctx) {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => e.into_call_result(),
        }
    }

    fn read(params: &FsReadFileParams, ctx: &ToolContext) -> Result<String, ToolError> {
        if params.head.is_some() && params.tail.is_some() {
            return Err(ToolError::invalid_arguments(
                "Cannot specify both head and tail",
            ));
        }

        let path = ctx.validate(&params.path)?;
        let content = read_text_bounded(&path, ctx.config.limits.max_read_bytes)?;
        debug!(bytes = content.len(), "File read");

        Ok(match (params.head, params.tail) {
            (Some(n), _) => first_lines(&content, n),
            (_, Some(n)) => last_lines(&content, n),
            _ => content,
        })
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsReadFileParams>(),
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
        blocking_route(Self::to_tool(), ctx, Self::execute)
    }
}

fn first_lines(content: &str, n: usize) -> String {
    content.lines().take(n).collect::<Vec<_>>().join("\n")
}

fn last_lines(content: &str, n: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::security::AllowedDirectories;
    use crate::domains::tools::context::test_support::{is_error, sandbox, text};
    use std::fs;

    fn params(path: &std::path::Path) -> FsReadFileParams {
        FsReadFileParams {
            path: path.to_string_lossy().to_string(),
            head: None,
            tail: None,
        }
    }

    #[test]
    fn test_read_whole_file() {
        let (_temp, root, ctx) = sandbox();
        let file = root.join("notes.txt");
        fs::write(&file, "one\ntwo\nthree\n").unwrap();

        let result = FsReadFileTool::execute(&params(&file), &ctx);
        assert!(!is_error(&result));
        assert_eq!(text(&result), "one\ntwo\nthree\n");
    }

    #[test]
    fn test_head_and_tail() {
        let (_temp, root, ctx) = sandbox();
        let file = root.join("notes.txt");
        fs::write(&file, "one\ntwo\nthree\nfour").unwrap();

        let head = FsReadFileTool::execute(
            &FsReadFileParams {
                head: Some(2),
                ..params(&file)
            },
            &ctx,
        );
        assert_eq!(text(&head), "one\ntwo");

        let tail = FsReadFileTool::execute(
            &FsReadFileParams {
                tail: Some(10),
                ..params(&file)
            },
            &ctx,
        );
        assert_eq!(text(&tail), "one\ntwo\nthree\nfour");

        let both = FsReadFileTool::execute(
            &FsReadFileParams {
                head: Some(1),
                tail: Some(1),
                ..params(&file)
            },
            &ctx,
        );
        assert!(is_error(&both));
    }

    #[test]
    fn test_read_respects_size_limit() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let root = dunce::canonicalize(temp_dir.path()).unwrap();
        let file = root.join("big.txt");
        fs::write(&file, "x".repeat(64)).unwrap();

        let mut config = Config::default();
        config.limits.max_read_bytes = 16;
        let ctx = ToolContext::new(
            Arc::new(config),
            AllowedDirectories::new([root.to_string_lossy()]),
        );

        let result = FsReadFileTool::execute(&params(&file), &ctx);
        assert!(is_error(&result));
        assert!(text(&result).contains("too large"));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_through_escaping_symlink() {
        let (_temp, root, ctx) = sandbox();
        let outside = tempfile::TempDir::new().unwrap();
        let secret = outside.path().join("secret.txt");
        fs::write(&secret, "secret").unwrap();
        std::os::unix::fs::symlink(&secret, root.join("link.txt")).unwrap();

        let result = FsReadFileTool::execute(&params(&root.join("link.txt")), &ctx);
        assert!(is_error(&result));
        assert!(!text(&result).contains("secret\n"));
        assert!(text(&result).contains("symlink target outside"));
    }
}
