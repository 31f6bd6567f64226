//! File comparison tool definition.
//!
//! JSON documents are compared structurally and report the JSON pointers
//! that differ; text reports the first differing line; anything else the
//! first differing byte.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use super::read_bounded;
use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, blocking_route, structured_result};

const MAX_REPORTED_DIFFERENCES: usize = 100;

/// Parameters for the compare tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsCompareParams {
    /// First file.
    pub left: String,

    /// Second file.
    pub right: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum Difference {
    /// JSON pointers whose values differ (at most 100 are listed).
    Json { pointers: Vec<String> },
    /// First differing line, 1-based; a missing side means the file ended.
    Text {
        line: usize,
        left: Option<String>,
        right: Option<String>,
    },
    /// First differing byte offset.
    Binary { offset: u64 },
}

#[derive(Debug, Serialize, JsonSchema)]
struct CompareResult {
    left: String,
    right: String,
    identical: bool,
    left_size: u64,
    right_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    difference: Option<Difference>,
}

/// Compare tool - reports whether and where two files differ.
pub struct FsCompareTool;

impl FsCompareTool {
    pub const NAME: &'static str = "fs_compare";

    pub const DESCRIPTION: &'static str = "Compare two files. JSON files are compared structurally (reports differing JSON pointers), text files report the first differing line, binary files the first differing byte.";

    #[instrument(skip_all, fields(left = %params.left, right = %params.right))]
    pub fn execute(params: &FsCompareParams, ctx: &ToolContext) -> CallToolResult {
        match Self::compare(params, ctx) {
            Ok(result) => structured_result(Self::render(&result), &result),
            Err(e) => e.into_call_result(),
        }
    }

    fn compare(params: &FsCompareParams, ctx: &ToolContext) -> Result<CompareResult, ToolError> {
        let max_bytes = ctx.config.limits.max_read_bytes;
        let left_path = ctx.validate(&params.left)?;
        let right_path = ctx.validate(&params.right)?;
        let left = read_bounded(&left_path, max_bytes)?;
        let right = read_bounded(&right_path, max_bytes)?;

        let difference = if left == right {
            None
        } else {
            Some(describe_difference(&left, &right))
        };

        // Reformatted but equal JSON is still reported as identical
        let identical = match &difference {
            None => true,
            Some(Difference::Json { pointers }) => pointers.is_empty(),
            Some(_) => false,
        };

        Ok(CompareResult {
            left: left_path.to_string_lossy().to_string(),
            right: right_path.to_string_lossy().to_string(),
            identical,
            left_size: left.len() as u64,
            right_size: right.len() as u64,
            difference: difference.filter(|_| !identical),
        })
    }

    fn render(result: &CompareResult) -> String {
        if result.identical {
            return format!(
                "Files are identical ({} / {} bytes)",
                result.left_size, result.right_size
            );
        }
        let detail = match &result.difference {
            Some(Difference::Json { pointers }) => {
                format!("JSON values differ at:\n{}", pointers.join("\n"))
            }
            Some(Difference::Text { line, left, right }) => format!(
                "First difference at line {}:\n< {}\n> {}",
                line,
                left.as_deref().unwrap_or("<end of file>"),
                right.as_deref().unwrap_or("<end of file>")
            ),
            Some(Difference::Binary { offset }) => format!("First difference at byte {}", offset),
            None => String::new(),
        };
        format!(
            "Files differ ({} / {} bytes). {}",
            result.left_size, result.right_size, detail
        )
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsCompareParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<CompareResult>()),
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

fn describe_difference(left: &[u8], right: &[u8]) -> Difference {
    if let (Ok(a), Ok(b)) = (
        serde_json::from_slice::<Value>(left),
        serde_json::from_slice::<Value>(right),
    ) {
        let mut pointers = Vec::new();
        json_differences(&a, &b, String::new(), &mut pointers);
        return Difference::Json { pointers };
    }

    if let (Ok(a), Ok(b)) = (std::str::from_utf8(left), std::str::from_utf8(right)) {
        let (mut a_lines, mut b_lines) = (a.lines(), b.lines());
        let mut line = 1;
        loop {
            match (a_lines.next(), b_lines.next()) {
                (Some(x), Some(y)) if x == y => line += 1,
                (None, None) => {
                    // Only line endings differ
                    break;
                }
                (x, y) => {
                    return Difference::Text {
                        line,
                        left: x.map(str::to_string),
                        right: y.map(str::to_string),
                    };
                }
            }
        }
    }

    let offset = left
        .iter()
        .zip(right)
        .position(|(a, b)| a != b)
        .unwrap_or(left.len().min(right.len()));
    Difference::Binary {
        offset: offset as u64,
    }
}

/// Collect RFC 6901 pointers where `a` and `b` differ.
fn json_differences(a: &Value, b: &Value, pointer: String, out: &mut Vec<String>) {
    if out.len() >= MAX_REPORTED_DIFFERENCES {
        return;
    }
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            let mut keys: Vec<&String> = x.keys().chain(y.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let child = format!("{}/{}", pointer, escape_pointer_token(key));
                match (x.get(key), y.get(key)) {
                    (Some(l), Some(r)) => json_differences(l, r, child, out),
                    _ => out.push(child),
                }
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            for i in 0..x.len().max(y.len()) {
                let child = format!("{}/{}", pointer, i);
                match (x.get(i), y.get(i)) {
                    (Some(l), Some(r)) => json_differences(l, r, child, out),
                    _ => out.push(child),
                }
            }
        }
        _ if a != b => out.push(pointer),
        _ => {}
    }
    out.truncate(MAX_REPORTED_DIFFERENCES);
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
