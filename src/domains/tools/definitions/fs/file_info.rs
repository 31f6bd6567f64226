//! File info tool definition.

use chrono::{DateTime, Utc};
use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::instrument;

use super::{entry_kind, format_size};
use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, blocking_route, structured_result};

/// Parameters for the file info tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsFileInfoParams {
    /// Path to inspect.
    pub path: String,
}

#[derive(Debug, Serialize, JsonSchema)]
struct FileInfo {
    path: String,
    kind: &'static str,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accessed: Option<String>,
    readonly: bool,
    /// Unix permission bits in octal, e.g. "644".
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<String>,
}

/// File info tool - size, type, timestamps and permissions of a path.
pub struct FsFileInfoTool;

impl FsFileInfoTool {
    pub const NAME: &'static str = "fs_file_info";

    pub const DESCRIPTION: &'static str = "Retrieve metadata about a file or directory: type, size, creation/modification/access times and permissions.";

    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &FsFileInfoParams, ctx: &ToolContext) -> CallToolResult {
        match Self::inspect(params, ctx) {
            Ok(info) => structured_result(Self::render(&info), &info),
            Err(e) => e.into_call_result(),
        }
    }

    fn inspect(params: &FsFileInfoParams, ctx: &ToolContext) -> Result<FileInfo, ToolError> {
        let path = ctx.validate(&params.path)?;
        let metadata = fs::metadata(&path)
            .map_err(|_| ToolError::not_found(format!("Path does not exist: {}", params.path)))?;

        Ok(FileInfo {
            path: path.to_string_lossy().to_string(),
            kind: entry_kind(&metadata),
            size: metadata.len(),
            created: metadata.created().ok().map(rfc3339),
            modified: metadata.modified().ok().map(rfc3339),
            accessed: metadata.accessed().ok().map(rfc3339),
            readonly: metadata.permissions().readonly(),
            permissions: unix_mode(&metadata),
        })
    }

    fn render(info: &FileInfo) -> String {
        let mut lines = vec![
            format!("path: {}", info.path),
            format!("type: {}", info.kind),
            format!("size: {} ({} bytes)", format_size(info.size), info.size),
        ];
        for (label, value) in [
            ("created", &info.created),
            ("modified", &info.modified),
            ("accessed", &info.accessed),
            ("permissions", &info.permissions),
        ] {
            if let Some(value) = value {
                lines.push(format!("{}: {}", label, value));
            }
        }
        lines.push(format!("readonly: {}", info.readonly));
        lines.join("\n")
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsFileInfoParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<FileInfo>()),
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

fn rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}

#[cfg(unix)]
fn unix_mode(metadata: &fs::Metadata) -> Option<String> {
    use std::os::unix::fs::PermissionsExt;
    Some(format!("{:o}", metadata.permissions().mode() & 0o777))
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &fs::Metadata) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::context::test_support::{is_error, sandbox, text};

    #[test]
    fn test_file_info() {
        let (_temp, root, ctx) = sandbox();
        let file = root.join("data.bin");
        fs::write(&file, vec![0u8; 2048]).unwrap();

        let result = FsFileInfoTool::execute(
            &FsFileInfoParams {
                path: file.to_string_lossy().to_string(),
            },
            &ctx,
        );
        assert!(!is_error(&result));
        assert!(text(&result).contains("size: 2.0 KB (2048 bytes)"));

        let info = result.structured_content.unwrap();
        assert_eq!(info["kind"], "file");
        assert_eq!(info["size"], 2048);
        let modified = info["modified"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(modified).is_ok());
    }

    #[test]
    fn test_directory_info() {
        let (_temp, root, ctx) = sandbox();
        let result = FsFileInfoTool::execute(
            &FsFileInfoParams {
                path: root.to_string_lossy().to_string(),
            },
            &ctx,
        );
        assert_eq!(result.structured_content.unwrap()["kind"], "directory");
    }

    #[test]
    fn test_missing_path() {
        let (_temp, root, ctx) = sandbox();
        let result = FsFileInfoTool::execute(
            &FsFileInfoParams {
                path: root.join("nope").to_string_lossy().to_string(),
            },
            &ctx,
        );
        assert!(is_error(&result));
    }
}
