//! Create directory tool definition.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Content, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::core::security::PathSecurityError;
use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, blocking_route};

/// Parameters for the create directory tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsCreateDirParams {
    /// Directory to create. Missing parent directories are created too.
    pub path: String,
}

/// Create directory tool - `mkdir -p` inside the allowed directories.
pub struct FsCreateDirTool;

impl FsCreateDirTool {
    pub const NAME: &'static str = "fs_create_dir";

    pub const DESCRIPTION: &'static str = "Create a directory, including any missing parent directories. Succeeds silently if the directory already exists.";

    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &FsCreateDirParams, ctx: &ToolContext) -> CallToolResult {
        match Self::create(params, ctx) {
            Ok(path) => {
                info!("Directory ready: {}", path.display());
                CallToolResult::success(vec![Content::text(format!(
                    "Successfully created directory {}",
                    path.display()
                ))])
            }
            Err(e) => e.into_call_result(),
        }
    }

    fn create(params: &FsCreateDirParams, ctx: &ToolContext) -> Result<PathBuf, ToolError> {
        let target = match ctx.validate(&params.path) {
            Ok(path) => path,
            // Deeper than one missing level: anchor on the nearest existing ancestor
            Err(PathSecurityError::ParentNotFound { path, .. }) => {
                Self::resolve_through_ancestor(Path::new(&path), ctx)?
            }
            Err(e) => return Err(e.into()),
        };

        if fs::metadata(&target).is_ok_and(|metadata| !metadata.is_dir()) {
            return Err(ToolError::invalid_arguments(format!(
                "Path exists and is not a directory: {}",
                params.path
            )));
        }

        fs::create_dir_all(&target)?;
        Ok(target)
    }

    /// Validate the nearest existing ancestor and re-attach the missing tail.
    ///
    /// `requested` has already passed the literal containment check, and the
    /// missing components cannot be symlinks.
    fn resolve_through_ancestor(requested: &Path, ctx: &ToolContext) -> Result<PathBuf, ToolError> {
        for ancestor in requested.ancestors().skip(1) {
            if fs::symlink_metadata(ancestor).is_err() {
                continue;
            }
            let real = ctx.validate(&ancestor.to_string_lossy())?;
            let tail = requested
                .strip_prefix(ancestor)
                .map_err(|e| ToolError::internal(e.to_string()))?;
            debug!(ancestor = %real.display(), tail = %tail.display(), "Creating missing ancestors");
            return Ok(real.join(tail));
        }

        Err(ToolError::not_found(format!(
            "No existing ancestor for {}",
            requested.display()
        )))
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsCreateDirParams>(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::context::test_support::{is_error, sandbox, text};

    fn params(path: &Path) -> FsCreateDirParams {
        FsCreateDirParams {
            path: path.to_string_lossy().to_string(),
        }
    }

    #[test]
    fn test_create_nested() {
        let (_temp, root, ctx) = sandbox();
        let nested = root.join("a").join("b").join("c");

        let result = FsCreateDirTool::execute(&params(&nested), &ctx);
        assert!(!is_error(&result));
        assert!(nested.is_dir());
    }

    #[test]
    fn test_create_existing_is_ok() {
        let (_temp, root, ctx) = sandbox();
        let result = FsCreateDirTool::execute(&params(&root), &ctx);
        assert!(!is_error(&result));
    }

    #[test]
    fn test_create_over_file() {
        let (_temp, root, ctx) = sandbox();
        let file = root.join("file");
        fs::write(&file, "x").unwrap();

        let result = FsCreateDirTool::execute(&params(&file), &ctx);
        assert!(is_error(&result));
        assert!(text(&result).contains("not a directory"));
    }

    #[test]
    fn test_create_outside_allowed() {
        let (_temp, _root, ctx) = sandbox();
        let outside = tempfile::TempDir::new().unwrap();
        let nested = outside.path().join("x").join("y");

        let result = FsCreateDirTool::execute(&params(&nested), &ctx);
        assert!(is_error(&result));
        assert!(!outside.path().join("x").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_create_below_escaping_symlink() {
        let (_temp, root, ctx) = sandbox();
        let outside = tempfile::TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("escape")).unwrap();

        let nested = root.join("escape").join("x").join("y");
        let result = FsCreateDirTool::execute(&params(&nested), &ctx);
        assert!(is_error(&result));
        assert!(!outside.path().join("x").exists());
    }
}
