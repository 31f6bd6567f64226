//! Tool Router - builds the rmcp ToolRouter for one session.
//!
//! Each tool knows how to create its own route; all routes share the
//! session's [`ToolContext`].

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use super::context::ToolContext;
use super::definitions::{
    CodeCheckTool, FsCompareTool, FsCompressTool, FsCreateDirTool, FsDeleteTool, FsFileInfoTool,
    FsHashTool, FsListDirTool, FsMergeTool, FsReadFileTool, FsRenameTool, FsSearchTool,
    FsWriteFileTool, GitTool, ListAllowedDirectoriesTool,
};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(ctx: Arc<ToolContext>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(FsReadFileTool::create_route(ctx.clone()))
        .with_route(FsWriteFileTool::create_route(ctx.clone()))
        .with_route(FsCreateDirTool::create_route(ctx.clone()))
        .with_route(FsListDirTool::create_route(ctx.clone()))
        .with_route(FsFileInfoTool::create_route(ctx.clone()))
        .with_route(FsSearchTool::create_route(ctx.clone()))
        .with_route(FsRenameTool::create_route(ctx.clone()))
        .with_route(FsDeleteTool::create_route(ctx.clone()))
        .with_route(FsCompareTool::create_route(ctx.clone()))
        .with_route(FsCompressTool::create_route(ctx.clone()))
        .with_route(FsHashTool::create_route(ctx.clone()))
        .with_route(FsMergeTool::create_route(ctx.clone()))
        .with_route(ListAllowedDirectoriesTool::create_route(ctx.clone()))
        .with_route(GitTool::create_route(ctx.clone()))
        .with_route(CodeCheckTool::create_route(ctx))
}

#[cfg(test)]
mod tests {
    use super::super::registry::ToolRegistry;
    use super::*;
    use crate::core::config::Config;
    use crate::core::security::AllowedDirectories;

    struct TestServer {}

    fn test_context() -> Arc<ToolContext> {
        Arc::new(ToolContext::new(
            Arc::new(Config::default()),
            AllowedDirectories::default(),
        ))
    }

    #[test]
    fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(test_context());
        let tools = router.list_all();
        assert_eq!(tools.len(), 15);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"fs_read_file"));
        assert!(names.contains(&"fs_search"));
        assert!(names.contains(&"list_allowed_directories"));
        assert!(names.contains(&"git"));
        assert!(names.contains(&"code_check"));
    }

    #[test]
    fn test_registry_matches_router() {
        let registry_names = ToolRegistry::tool_names();

        let router: ToolRouter<TestServer> = build_tool_router(test_context());
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(registry_names.len(), router_names.len());
        for name in registry_names {
            assert!(router_names.contains(&name));
        }
    }
}
