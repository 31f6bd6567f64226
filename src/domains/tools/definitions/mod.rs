//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod code;
pub mod fs;
pub mod git;

pub use code::CodeCheckTool;
pub use fs::{
    FsCompareTool, FsCompressTool, FsCreateDirTool, FsDeleteTool, FsFileInfoTool, FsHashTool,
    FsListDirTool, FsMergeTool, FsReadFileTool, FsRenameTool, FsSearchTool, FsWriteFileTool,
    ListAllowedDirectoriesTool,
};
pub use git::GitTool;
