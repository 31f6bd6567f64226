//! Rename/move tool definition.
//!
//! A tool that renames or moves files and directories.

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

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the rename/move tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsRenameParams {
    /// Source path (file or directory to rename/move).
    pub from: String,

    /// Destination path (new name or location).
    pub to: String,

    /// Overwrite destination if it already exists.
    #[serde(default)]
    pub overwrite: bool,
}

// ============================================================================
// Output Structure (JSON format for AI agents)
// ============================================================================

/// Result of a rename/move operation
#[derive(Debug, Serialize, JsonSchema)]
struct RenameResult {
    /// Source path (original location)
    from: String,
    /// Destination path (new location)
    to: String,
    /// Type of item renamed ("file", "directory", or "item")
    item_type: String,
    /// Type of operation performed ("renamed" or "moved")
    operation: String,
    /// Whether an existing entry was overwritten
    #[serde(skip_serializing_if = "Option::is_none")]
    overwritten: Option<bool>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Rename/move tool - renames or moves files and directories.
pub struct FsRenameTool;

impl FsRenameTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "fs_rename";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Rename or move a file or directory from one path to another. Both paths must be inside the allowed directories.";

    #[instrument(skip_all, fields(from = %params.from, to = %params.to))]
    pub fn execute(params: &FsRenameParams, ctx: &ToolContext) -> CallToolResult {
        info!("Rename tool called: '{}' -> '{}'", params.from, params.to);

        match Self::rename(params, ctx) {
            Ok(result) => {
                let summary = format!(
                    "Successfully {} {} from '{}' to '{}'",
                    result.operation, result.item_type, params.from, params.to
                );
                structured_result(summary, &result)
            }
            Err(e) => e.into_call_result(),
        }
    }

    fn rename(params: &FsRenameParams, ctx: &ToolContext) -> Result<RenameResult, ToolError> {
        let from_path = ctx.validate(&params.from)?;
        // A missing destination is validated through its parent
        let to_path = ctx.validate(&params.to)?;

        let source = fs::metadata(&from_path)
            .map_err(|_| ToolError::not_found(format!("Source does not exist: {}", params.from)))?;

        let destination_exists = fs::symlink_metadata(&to_path).is_ok();
        if destination_exists && !params.overwrite {
            return Err(ToolError::invalid_arguments(format!(
                "Destination already exists: {}. Use overwrite=true to replace it.",
                params.to
            )));
        }

        let item_type = if source.is_dir() {
            "directory"
        } else if source.is_file() {
            "file"
        } else {
            "item"
        };

        let operation = if from_path.parent() != to_path.parent() {
            "moved"
        } else {
            "renamed"
        };

        fs::rename(&from_path, &to_path).map_err(|e| {
            ToolError::execution_failed(format!(
                "Failed to {} '{}' to '{}': {}",
                operation, params.from, params.to, e
            ))
        })?;

        Ok(RenameResult {
            from: from_path.to_string_lossy().to_string(),
            to: to_path.to_string_lossy().to_string(),
            item_type: item_type.to_string(),
            operation: operation.to_string(),
            overwritten: destination_exists.then_some(true),
        })
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsRenameParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<RenameResult>()),
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
