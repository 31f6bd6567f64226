//! Write file tool definition.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, blocking_route, structured_result};

/// Parameters for the write file tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsWriteFileParams {
    /// Path of the file to create or overwrite.
    pub path: String,

    /// Text content to write.
    pub content: String,
}

#[derive(Debug, Serialize, JsonSchema)]
struct WriteResult {
    path: String,
    bytes_written: usize,
    created: bool,
}

/// Write file tool - creates or overwrites a text file.
pub struct FsWriteFileTool;

impl FsWriteFileTool {
    pub const NAME: &'static str = "fs_write_file";

    pub const DESCRIPTION: &'static str = "Create a new file or completely overwrite an existing file with the given text content. The parent directory must already exist.";

    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &FsWriteFileParams, ctx: &ToolContext) -> CallToolResult {
        match Self::write(params, ctx) {
            Ok(result) => {
                info!(bytes = result.bytes_written, "File written");
                let verb = if result.created { "Created" } else { "Overwrote" };
                let summary = format!("{} {} ({} bytes)", verb, params.path, result.bytes_written);
                structured_result(summary, &result)
            }
            Err(e) => e.into_call_result(),
        }
    }

    fn write(params: &FsWriteFileParams, ctx: &ToolContext) -> Result<WriteResult, ToolError> {
        let path = ctx.validate(&params.path)?;

        let created = match fs::metadata(&path) {
            Ok(metadata) if metadata.is_dir() => {
                return Err(ToolError::invalid_arguments(format!(
                    "Path is a directory: {}",
                    params.path
                )));
            }
            Ok(_) => false,
            Err(_) => true,
        };

        fs::write(&path, params.content.as_bytes())?;

        Ok(WriteResult {
            path: path.to_string_lossy().to_string(),
            bytes_written: params.content.len(),
            created,
        })
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsWriteFileParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<WriteResult>()),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::context::test_support::{is_error, sandbox, text};

    fn params(path: &std::path::Path, content: &str) -> FsWriteFileParams {
        FsWriteFileParams {
            path: path.to_string_lossy().to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_create_then_overwrite() {
        let (_temp, root, ctx) = sandbox();
        let file = root.join("out.txt");

        let created = FsWriteFileTool::execute(&params(&file, "first"), &ctx);
        assert!(!is_error(&created));
        assert!(text(&created).starts_with("Created"));

        let overwritten = FsWriteFileTool::execute(&params(&file, "second"), &ctx);
        assert!(text(&overwritten).starts_with("Overwrote"));
        assert_eq!(fs::read_to_string(&file).unwrap(), "second");
    }

    #[test]
    fn test_missing_parent_is_rejected() {
        let (_temp, root, ctx) = sandbox();
        let file = root.join("no").join("such").join("dir.txt");

        let result = FsWriteFileTool::execute(&params(&file, "x"), &ctx);
        assert!(is_error(&result));
        assert!(text(&result).contains("Parent directory does not exist"));
    }

    #[test]
    fn test_write_onto_directory() {
        let (_temp, root, ctx) = sandbox();
        let result = FsWriteFileTool::execute(&params(&root, "x"), &ctx);
        assert!(is_error(&result));
    }

    #[test]
    fn test_write_outside_allowed() {
        let (_temp, _root, ctx) = sandbox();
        let outside = tempfile::TempDir::new().unwrap();
        let file = outside.path().join("escape.txt");

        let result = FsWriteFileTool::execute(&params(&file, "x"), &ctx);
        assert!(is_error(&result));
        assert!(!file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_dangling_symlink_outside() {
        let (_temp, root, ctx) = sandbox();
        let outside = tempfile::TempDir::new().unwrap();
        let target = outside.path().join("planted.txt");
        std::os::unix::fs::symlink(&target, root.join("link.txt")).unwrap();

        let result = FsWriteFileTool::execute(&params(&root.join("link.txt"), "x"), &ctx);
        assert!(is_error(&result));
        assert!(!target.exists());
    }
}
