//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **STDIO**: Standard input/output (default for MCP) - feature: `stdio`
//! - **TCP**: Raw TCP socket with JSON-RPC messages - feature: `tcp`
//!
//! Both transports run the rmcp service and then hand the peer to
//! [`McpServer::on_session_start`](crate::core::McpServer::on_session_start),
//! which pulls the client's roots. HTTP is not offered: a stateless
//! request/response exchange cannot carry the server-initiated
//! `roots/list` request.

mod config;
mod error;
mod service;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "tcp")]
pub use config::TcpConfig;
