//! File hashing tool definition.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, blocking_route, structured_result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

/// Parameters for the hash tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsHashParams {
    /// File to hash.
    pub path: String,

    /// "sha256" (default) or "sha512".
    #[serde(default)]
    pub algorithm: HashAlgorithm,
}

#[derive(Debug, Serialize, JsonSchema)]
struct HashResult {
    path: String,
    algorithm: HashAlgorithm,
    digest: String,
    size: u64,
}

/// Hash tool - hex digest of a file's contents.
pub struct FsHashTool;

impl FsHashTool {
    pub const NAME: &'static str = "fs_hash";

    pub const DESCRIPTION: &'static str = "Compute the SHA-256 or SHA-512 digest of a file, returned as lowercase hex.";

    #[instrument(skip_all, fields(path = %params.path, algorithm = ?params.algorithm))]
    pub fn execute(params: &FsHashParams, ctx: &ToolContext) -> CallToolResult {
        match Self::hash(params, ctx) {
            Ok(result) => {
                let summary = format!("{}  {}", result.digest, result.path);
                structured_result(summary, &result)
            }
            Err(e) => e.into_call_result(),
        }
    }

    fn hash(params: &FsHashParams, ctx: &ToolContext) -> Result<HashResult, ToolError> {
        let path = ctx.validate(&params.path)?;
        if !path.is_file() {
            return Err(ToolError::invalid_arguments(format!(
                "Not a regular file: {}",
                params.path
            )));
        }

        let (digest, size) = match params.algorithm {
            HashAlgorithm::Sha256 => digest_file::<Sha256>(&path)?,
            HashAlgorithm::Sha512 => digest_file::<Sha512>(&path)?,
        };

        Ok(HashResult {
            path: path.to_string_lossy().to_string(),
            algorithm: params.algorithm,
            digest,
            size,
        })
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsHashParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<HashResult>()),
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

/// Stream a file through `D`, returning the hex digest and byte count.
fn digest_file<D: Digest + io::Write>(path: &Path) -> io::Result<(String, u64)> {
    let mut hasher = D::new();
    let size = io::copy(&mut BufReader::new(File::open(path)?), &mut hasher)?;
    Ok((hex::encode(hasher.finalize()), size))
}
