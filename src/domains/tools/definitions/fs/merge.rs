//! File merge tool definition.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use tracing::{info, instrument};

use super::read_text_bounded;
use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, blocking_route, structured_result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Concatenate text files in order.
    #[default]
    Concat,
    /// Deep-merge JSON objects; later files win on conflicts.
    Json,
}

/// Parameters for the merge tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsMergeParams {
    /// Files to merge, in order.
    pub sources: Vec<String>,

    /// File to write the merged result to.
    pub destination: String,

    /// "concat" (default) or "json".
    #[serde(default)]
    pub mode: MergeMode,

    /// Text inserted between files in concat mode.
    #[serde(default)]
    pub separator: Option<String>,

    /// Replace the destination if it exists.
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
struct MergeResult {
    destination: String,
    mode: MergeMode,
    sources: usize,
    bytes_written: usize,
}

/// Merge tool - combines several files into one.
pub struct FsMergeTool;

impl FsMergeTool {
    pub const NAME: &'static str = "fs_merge";

    pub const DESCRIPTION: &'static str = "Merge several files into a destination file: concatenate text files (with an optional separator) or deep-merge JSON objects, later files overriding earlier ones.";

    #[instrument(skip_all, fields(destination = %params.destination, mode = ?params.mode))]
    pub fn execute(params: &FsMergeParams, ctx: &ToolContext) -> CallToolResult {
        match Self::merge(params, ctx) {
            Ok(result) => {
                info!(sources = result.sources, "Files merged");
                let summary = format!(
                    "Merged {} files into {} ({} bytes)",
                    result.sources, params.destination, result.bytes_written
                );
                structured_result(summary, &result)
            }
            Err(e) => e.into_call_result(),
        }
    }

    fn merge(params: &FsMergeParams, ctx: &ToolContext) -> Result<MergeResult, ToolError> {
        if params.sources.is_empty() {
            return Err(ToolError::invalid_arguments("At least one source file is required"));
        }

        let destination = ctx.validate(&params.destination)?;
        if destination.exists() && !params.overwrite {
            return Err(ToolError::invalid_arguments(format!(
                "Destination already exists: {}. Use overwrite=true to replace it.",
                params.destination
            )));
        }

        let max_bytes = ctx.config.limits.max_read_bytes;
        let mut contents = Vec::with_capacity(params.sources.len());
        for source in &params.sources {
            let path = ctx.validate(source)?;
            contents.push(read_text_bounded(&path, max_bytes)?);
        }

        let merged = match params.mode {
            MergeMode::Concat => contents.join(params.separator.as_deref().unwrap_or("")),
            MergeMode::Json => {
                let mut merged = Value::Object(Default::default());
                for (source, text) in params.sources.iter().zip(&contents) {
                    let value: Value = serde_json::from_str(text).map_err(|e| {
                        ToolError::invalid_arguments(format!("{} is not valid JSON: {}", source, e))
                    })?;
                    if !value.is_object() {
                        return Err(ToolError::invalid_arguments(format!(
                            "{} does not contain a JSON object",
                            source
                        )));
                    }
                    deep_merge(&mut merged, value);
                }
                let mut pretty = serde_json::to_string_pretty(&merged)
                    .map_err(|e| ToolError::internal(e.to_string()))?;
                pretty.push('\n');
                pretty
            }
        };

        fs::write(&destination, merged.as_bytes())?;

        Ok(MergeResult {
            destination: destination.to_string_lossy().to_string(),
            mode: params.mode,
            sources: params.sources.len(),
            bytes_written: merged.len(),
        })
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsMergeParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<MergeResult>()),
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

/// Merge `overlay` into `base`. Objects merge key by key; anything else replaces.
fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::context::test_support::{is_error, sandbox, text};
    use serde_json::json;
    use std::path::Path;

    fn params(sources: &[&Path], destination: &Path, mode: MergeMode) -> FsMergeParams {
        FsMergeParams {
            sources: sources
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect(),
            destination: destination.to_string_lossy().to_string(),
            mode,
            separator: None,
            overwrite: false,
        }
    }

    #[test]
    fn test_concat_with_separator() {
        let (_temp, root, ctx) = sandbox();
        fs::write(root.join("a.txt"), "alpha").unwrap();
        fs::write(root.join("b.txt"), "beta").unwrap();

        let mut request = params(
            &[&root.join("a.txt"), &root.join("b.txt")],
            &root.join("out.txt"),
            MergeMode::Concat,
        );
        request.separator = Some("\n---\n".to_string());

        let result = FsMergeTool::execute(&request, &ctx);
        assert!(!is_error(&result));
        assert_eq!(
            fs::read_to_string(root.join("out.txt")).unwrap(),
            "alpha\n---\nbeta"
        );
    }

    #[test]
    fn test_json_deep_merge() {
        let (_temp, root, ctx) = sandbox();
        fs::write(
            root.join("base.json"),
            r#"{"server":{"port":80,"host":"a"},"tags":[1]}"#,
        )
        .unwrap();
        fs::write(
            root.join("override.json"),
            r#"{"server":{"port":8080},"tags":[2],"debug":true}"#,
        )
        .unwrap();

        let result = FsMergeTool::execute(
            &params(
                &[&root.join("base.json"), &root.join("override.json")],
                &root.join("merged.json"),
                MergeMode::Json,
            ),
            &ctx,
        );
        assert!(!is_error(&result));

        let merged: Value =
            serde_json::from_str(&fs::read_to_string(root.join("merged.json")).unwrap()).unwrap();
        assert_eq!(
            merged,
            json!({"server": {"port": 8080, "host": "a"}, "tags": [2], "debug": true})
        );
    }

    #[test]
    fn test_json_mode_rejects_non_objects() {
        let (_temp, root, ctx) = sandbox();
        fs::write(root.join("list.json"), "[1, 2]").unwrap();

        let result = FsMergeTool::execute(
            &params(&[&root.join("list.json")], &root.join("out.json"), MergeMode::Json),
            &ctx,
        );
        assert!(is_error(&result));
        assert!(text(&result).contains("JSON object"));
        assert!(!root.join("out.json").exists());
    }

    #[test]
    fn test_source_outside_allowed() {
        let (_temp, root, ctx) = sandbox();
        let outside = tempfile::TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();

        let result = FsMergeTool::execute(
            &params(
                &[&outside.path().join("secret.txt")],
                &root.join("out.txt"),
                MergeMode::Concat,
            ),
            &ctx,
        );
        assert!(is_error(&result));
        assert!(!root.join("out.txt").exists());
    }

    #[test]
    fn test_requires_sources() {
        let (_temp, root, ctx) = sandbox();
        let result = FsMergeTool::execute(&params(&[], &root.join("out"), MergeMode::Concat), &ctx);
        assert!(is_error(&result));
    }
}
