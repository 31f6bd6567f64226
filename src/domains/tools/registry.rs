//! Tool Registry - central list of tool metadata.

use rmcp::model::Tool;

use super::definitions::{
    CodeCheckTool, FsCompareTool, FsCompressTool, FsCreateDirTool, FsDeleteTool, FsFileInfoTool,
    FsHashTool, FsListDirTool, FsMergeTool, FsReadFileTool, FsRenameTool, FsSearchTool,
    FsWriteFileTool, GitTool, ListAllowedDirectoriesTool,
};

/// Tool registry - names and metadata of every tool, without a session.
pub struct ToolRegistry;

impl ToolRegistry {
    /// Get all tool names.
    pub fn tool_names() -> Vec<&'static str> {
        vec![
            FsReadFileTool::NAME,
            FsWriteFileTool::NAME,
            FsCreateDirTool::NAME,
            FsListDirTool::NAME,
            FsFileInfoTool::NAME,
            FsSearchTool::NAME,
            FsRenameTool::NAME,
            FsDeleteTool::NAME,
            FsCompareTool::NAME,
            FsCompressTool::NAME,
            FsHashTool::NAME,
            FsMergeTool::NAME,
            ListAllowedDirectoriesTool::NAME,
            GitTool::NAME,
            CodeCheckTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            FsReadFileTool::to_tool(),
            FsWriteFileTool::to_tool(),
            FsCreateDirTool::to_tool(),
            FsListDirTool::to_tool(),
            FsFileInfoTool::to_tool(),
            FsSearchTool::to_tool(),
            FsRenameTool::to_tool(),
            FsDeleteTool::to_tool(),
            FsCompareTool::to_tool(),
            FsCompressTool::to_tool(),
            FsHashTool::to_tool(),
            FsMergeTool::to_tool(),
            ListAllowedDirectoriesTool::to_tool(),
            GitTool::to_tool(),
            CodeCheckTool::to_tool(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_tool_names() {
        let names = ToolRegistry::tool_names();
        assert_eq!(names.len(), 15);
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_tools_have_object_schemas() {
        for tool in ToolRegistry::get_all_tools() {
            assert!(tool.description.is_some(), "{} lacks a description", tool.name);
            assert_eq!(
                tool.input_schema.get("type").and_then(|t| t.as_str()),
                Some("object"),
                "{} input schema",
                tool.name
            );
        }
    }
}
