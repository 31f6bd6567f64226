//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients to perform
//! specific actions or computations.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `context.rs` - Per-session state, rate limiting, audit, route builders
//! - `process.rs` - Child-process runner for git and code checks
//! - `router.rs` - Dynamic ToolRouter builder
//! - `registry.rs` - Central list of tool metadata
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `my_tool.rs`)
//! 2. Define params, `execute()`, `to_tool()` and `create_route()`
//! 3. Export in `definitions/mod.rs`
//! 4. Add the route in `router.rs` and the metadata in `registry.rs`

pub mod context;
pub mod definitions;
mod error;
pub mod process;
mod registry;
pub mod router;

pub use context::ToolContext;
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use router::build_tool_router;
