//! List allowed directories tool definition.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domains::tools::context::{ToolContext, blocking_route, structured_result};

/// This tool takes no parameters.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListAllowedDirectoriesParams {}

#[derive(Debug, Serialize, JsonSchema)]
struct AllowedDirectoriesResult {
    directories: Vec<String>,
}

/// Reports the current session allow-list.
pub struct ListAllowedDirectoriesTool;

impl ListAllowedDirectoriesTool {
    pub const NAME: &'static str = "list_allowed_directories";

    pub const DESCRIPTION: &'static str = "List the directories this server is allowed to access. Paths outside these directories are rejected by every tool.";

    pub fn execute(_params: &ListAllowedDirectoriesParams, ctx: &ToolContext) -> CallToolResult {
        let directories = ctx.allowed.snapshot();
        let summary = if directories.is_empty() {
            "No allowed directories are configured".to_string()
        } else {
            format!("Allowed directories:\n{}", directories.join("\n"))
        };
        structured_result(summary, &AllowedDirectoriesResult { directories })
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<ListAllowedDirectoriesParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<AllowedDirectoriesResult>()),
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
