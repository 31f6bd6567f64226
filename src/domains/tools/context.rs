//! Per-session state shared by every tool route, and route construction.
//!
//! Every call goes through the same sequence: rate-limit admission,
//! argument parsing, execution, and one audit event on the `audit` target.

use std::future::Future;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute},
    model::{CallToolResult, Content, JsonObject, Tool},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::core::config::Config;
use crate::core::security::{AllowedDirectories, PathSecurityError, validate_path};

/// State handed to every tool call of one session.
pub struct ToolContext {
    /// Server configuration.
    pub config: Arc<Config>,

    /// The session allow-list.
    pub allowed: AllowedDirectories,

    limiter: Option<DefaultDirectRateLimiter>,
}

impl ToolContext {
    /// Create the context for a session.
    pub fn new(config: Arc<Config>, allowed: AllowedDirectories) -> Self {
        let limiter = NonZeroU32::new(config.limits.rate_limit_per_minute)
            .map(|per_minute| RateLimiter::direct(Quota::per_minute(per_minute)));
        Self {
            config,
            allowed,
            limiter,
        }
    }

    /// Validate a user-supplied path against the session allow-list.
    pub fn validate(&self, path: &str) -> Result<PathBuf, PathSecurityError> {
        validate_path(path, &self.allowed)
    }

    /// Admit one call, or refuse it when the session is over its rate.
    pub fn admit(&self, tool: &str) -> Result<(), McpError> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };
        if limiter.check().is_err() {
            warn!(target: "audit", tool, outcome = "rate_limited", "Tool call refused");
            return Err(McpError::invalid_request(
                format!(
                    "Rate limit exceeded ({} calls per minute); retry later",
                    self.config.limits.rate_limit_per_minute
                ),
                None,
            ));
        }
        Ok(())
    }

    /// Emit the audit event for a finished call.
    pub fn audit(&self, tool: &str, result: &CallToolResult) {
        let outcome = if result.is_error.unwrap_or(false) {
            "error"
        } else {
            "ok"
        };
        info!(target: "audit", tool, outcome, "Tool call finished");
    }
}

/// Deserialize tool arguments, mapping failures to `invalid_params`.
pub fn parse_params<P: DeserializeOwned>(args: JsonObject) -> Result<P, McpError> {
    serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|e| McpError::invalid_params(e.to_string(), None))
}

/// A failed call with a plain-text explanation.
pub fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

/// A successful call with a text summary plus structured content.
pub fn structured_result<T: Serialize>(summary: impl Into<String>, data: &T) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(summary.into())],
        structured_content: serde_json::to_value(data).ok(),
        is_error: Some(false),
        meta: None,
    }
}

/// Route for a tool whose logic is blocking filesystem work.
///
/// The work runs on tokio's blocking pool.
pub fn blocking_route<S, P, F>(tool: Tool, context: Arc<ToolContext>, execute: F) -> ToolRoute<S>
where
    S: Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    F: Fn(&P, &ToolContext) -> CallToolResult + Copy + Send + Sync + 'static,
{
    let name = tool.name.clone();
    ToolRoute::new_dyn(tool, move |call: ToolCallContext<'_, S>| {
        let args = call.arguments.clone().unwrap_or_default();
        let context = context.clone();
        let name = name.clone();
        async move {
            context.admit(&name)?;
            let params: P = parse_params(args)?;
            let worker = context.clone();
            let result = tokio::task::spawn_blocking(move || execute(&params, &worker))
                .await
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            context.audit(&name, &result);
            Ok(result)
        }
        .boxed()
    })
}

/// Route for a tool whose logic is async (child processes).
pub fn async_route<S, P, F, Fut>(tool: Tool, context: Arc<ToolContext>, execute: F) -> ToolRoute<S>
where
    S: Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    F: Fn(P, Arc<ToolContext>) -> Fut + Copy + Send + Sync + 'static,
    Fut: Future<Output = CallToolResult> + Send + 'static,
{
    let name = tool.name.clone();
    ToolRoute::new_dyn(tool, move |call: ToolCallContext<'_, S>| {
        let args = call.arguments.clone().unwrap_or_default();
        let context = context.clone();
        let name = name.clone();
        async move {
            context.admit(&name)?;
            let params: P = parse_params(args)?;
            let result = execute(params, context.clone()).await;
            context.audit(&name, &result);
            Ok(result)
        }
        .boxed()
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use rmcp::model::RawContent;
    use tempfile::TempDir;

    /// A context whose allow-list holds the real path of a fresh temp dir.
    pub fn sandbox() -> (TempDir, PathBuf, ToolContext) {
        let temp_dir = TempDir::new().unwrap();
        let root = dunce::canonicalize(temp_dir.path()).unwrap();
        let context = ToolContext::new(
            Arc::new(Config::default()),
            AllowedDirectories::new([root.to_string_lossy()]),
        );
        (temp_dir, root, context)
    }

    /// First text block of a result.
    pub fn text(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            RawContent::Text(text) => &text.text,
            _ => panic!("Expected text content"),
        }
    }

    pub fn is_error(result: &CallToolResult) -> bool {
        result.is_error.unwrap_or(false)
    }
}
