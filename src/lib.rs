//! Workspace MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing filesystem, git and
//! code-check tools that only ever touch paths inside an allow-list of
//! directories.
//!
//! # Architecture
//!
//! - **core**: configuration, errors, the server handler, transports, and
//!   `core::security`, the path normalization / allow-list / validation
//!   layer every tool goes through
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: MCP tools that can be executed by clients
//!
//! # Example
//!
//! ```rust,no_run
//! use workspace_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env().with_allowed_directories(["/srv/project".into()]);
//!     let transport = TransportService::new(config.transport.clone());
//!     let server = McpServer::new(config)?;
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
