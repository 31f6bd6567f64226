//! List directory tool definition.
//!
//! A tool that lists files and directories in a given path.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{entry_kind, format_size};
use crate::domains::tools::context::{ToolContext, blocking_route, structured_result};
use crate::domains::tools::ToolError;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the list directory tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsListDirParams {
    /// Path to the directory to list.
    pub path: String,

    /// Include hidden files (starting with '.')
    #[serde(default)]
    pub include_hidden: bool,

    /// Show additional details (size and type)
    #[serde(default)]
    pub detailed: bool,
}

// ============================================================================
// Output Structure
// ============================================================================

#[derive(Debug, Serialize, JsonSchema)]
struct DirEntryInfo {
    name: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct ListDirResult {
    path: String,
    entries: Vec<DirEntryInfo>,
    directories: usize,
    files: usize,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// List directory tool - lists files and directories in a given path.
pub struct FsListDirTool;

impl FsListDirTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "fs_list_dir";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "List files and directories in a given path. Returns names, types, and optionally sizes.";

    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &FsListDirParams, ctx: &ToolContext) -> CallToolResult {
        match Self::list(params, ctx) {
            Ok(result) => {
                info!("Listed {} entries in {}", result.entries.len(), params.path);
                structured_result(Self::render(&result, params.detailed), &result)
            }
            Err(e) => e.into_call_result(),
        }
    }

    fn list(params: &FsListDirParams, ctx: &ToolContext) -> Result<ListDirResult, ToolError> {
        let path = ctx.validate(&params.path)?;

        if !path.is_dir() {
            return Err(ToolError::invalid_arguments(format!(
                "Path is not a directory: {}",
                params.path
            )));
        }

        let mut entries = Vec::new();
        let (mut directories, mut files) = (0, 0);

        for entry in fs::read_dir(&path)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error reading entry: {}", e);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().to_string();
            if !params.include_hidden && name.starts_with('.') {
                continue;
            }

            // DirEntry::metadata does not follow symlinks
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!("Failed to get metadata for {}: {}", name, e);
                    continue;
                }
            };

            if metadata.is_dir() {
                directories += 1;
            } else if metadata.is_file() {
                files += 1;
            }

            entries.push(DirEntryInfo {
                name,
                kind: entry_kind(&metadata),
                size: metadata.is_file().then(|| metadata.len()),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(ListDirResult {
            path: path.to_string_lossy().to_string(),
            entries,
            directories,
            files,
        })
    }

    fn render(result: &ListDirResult, detailed: bool) -> String {
        let mut response = format!("Directory: {}\n", result.path);
        if detailed {
            response.push_str("\nType  Size        Name\n");
            response.push_str("----  ----------  ----\n");
        }

        let lines: Vec<String> = result
            .entries
            .iter()
            .map(|entry| {
                if detailed {
                    let tag = match entry.kind {
                        "directory" => "DIR ",
                        "symlink" => "LINK",
                        "file" => "FILE",
                        _ => "----",
                    };
                    let size = entry.size.map(format_size).unwrap_or_else(|| "-".to_string());
                    format!("{:4}  {:>10}  {}", tag, size, entry.name)
                } else if entry.kind == "directory" {
                    format!("{}/", entry.name)
                } else {
                    entry.name.clone()
                }
            })
            .collect();

        response.push_str(&lines.join("\n"));
        response.push_str(&format!(
            "\n\nTotal: {} directories, {} files",
            result.directories, result.files
        ));
        response
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsListDirParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<ListDirResult>()),
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
