//! Tool-specific error types.

use rmcp::model::{CallToolResult, Content};
use thiserror::Error;
use tracing::warn;

use crate::core::security::PathSecurityError;

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A path was rejected by validation.
    #[error("Path security validation failed: {0}")]
    Path(#[from] PathSecurityError),

    /// The requested file or directory does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An external program could not be located.
    #[error("Command not available: {0}")]
    CommandUnavailable(String),

    /// The tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The tool timed out during execution.
    #[error("Tool execution timed out after {0} seconds")]
    Timeout(u64),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Render as a tool-level error the client can relay to the model.
    pub fn into_call_result(self) -> CallToolResult {
        warn!("{}", self);
        CallToolResult::error(vec![Content::text(self.to_string())])
    }
}
