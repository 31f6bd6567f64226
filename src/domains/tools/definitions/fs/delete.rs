//! Delete tool definition.
//!
//! A tool that deletes files and directories.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, blocking_route, structured_result};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the delete tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsDeleteParams {
    /// Path to the file or directory to delete.
    pub path: String,

    /// Recursively delete directories and their contents.
    /// Required to delete non-empty directories.
    #[serde(default)]
    pub recursive: bool,
}

// ============================================================================
// Output Structure (JSON format for AI agents)
// ============================================================================

/// Result of a delete operation
#[derive(Debug, Serialize, JsonSchema)]
struct DeleteResult {
    /// Path that was deleted
    path: String,
    /// Type of item deleted ("file", "directory", or "item")
    item_type: String,
    /// Whether recursive deletion was used
    #[serde(skip_serializing_if = "Option::is_none")]
    recursive: Option<bool>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Delete tool - deletes files and directories.
pub struct FsDeleteTool;

impl FsDeleteTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "fs_delete";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Delete a file or directory. Use recursive=true to delete non-empty directories and their contents.";

    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &FsDeleteParams, ctx: &ToolContext) -> CallToolResult {
        info!("Delete tool called: '{}'", params.path);

        match Self::delete(params, ctx) {
            Ok(result) => {
                let summary = if result.recursive.is_some() {
                    format!(
                        "Successfully deleted {} '{}' and all its contents",
                        result.item_type, params.path
                    )
                } else {
                    format!("Successfully deleted {} '{}'", result.item_type, params.path)
                };
                structured_result(summary, &result)
            }
            Err(e) => e.into_call_result(),
        }
    }

    fn delete(params: &FsDeleteParams, ctx: &ToolContext) -> Result<DeleteResult, ToolError> {
        let target_path = ctx.validate(&params.path)?;

        let metadata = fs::metadata(&target_path)
            .map_err(|_| ToolError::not_found(format!("Path does not exist: {}", params.path)))?;

        let is_directory = metadata.is_dir();
        let item_type = if is_directory {
            "directory"
        } else if metadata.is_file() {
            "file"
        } else {
            "item"
        };

        let allowed = ctx.allowed.snapshot();
        if allowed.iter().any(|dir| target_path.as_path() == Path::new(dir)) {
            return Err(ToolError::invalid_arguments(format!(
                "Refusing to delete an allowed root directory: {}",
                params.path
            )));
        }

        if is_directory && !params.recursive && fs::read_dir(&target_path)?.next().is_some() {
            return Err(ToolError::invalid_arguments(format!(
                "Directory is not empty: {}. Use recursive=true to delete it and its contents.",
                params.path
            )));
        }

        let outcome = match (is_directory, params.recursive) {
            (true, true) => fs::remove_dir_all(&target_path),
            (true, false) => fs::remove_dir(&target_path),
            (false, _) => fs::remove_file(&target_path),
        };
        outcome.map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                ToolError::execution_failed(format!(
                    "Permission denied: Cannot delete '{}'",
                    params.path
                ))
            } else {
                ToolError::execution_failed(format!("Failed to delete '{}': {}", params.path, e))
            }
        })?;

        Ok(DeleteResult {
            path: target_path.to_string_lossy().to_string(),
            item_type: item_type.to_string(),
            recursive: (is_directory && params.recursive).then_some(true),
        })
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsDeleteParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<DeleteResult>()),
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO/TCP transport.
    pub fn create_route<S>(ctx: Arc<ToolContext>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        blocking_route(Self::to_tool(), ctx, Self::execute)
    }
}

// ============================================================================
// Tests
// ============================================================================
