//! zlib compression tool definition.

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domains::tools::ToolError;
use crate::domains::tools::context::{ToolContext, blocking_route, structured_result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    Compress,
    Decompress,
}

/// Parameters for the compress tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FsCompressParams {
    /// File to read.
    pub source: String,

    /// File to write.
    pub destination: String,

    /// "compress" (default) or "decompress".
    #[serde(default = "default_mode")]
    pub mode: CompressionMode,

    /// Compression level 0-9 (default 6). Ignored when decompressing.
    #[serde(default)]
    pub level: Option<u32>,

    /// Replace the destination if it exists.
    #[serde(default)]
    pub overwrite: bool,
}

fn default_mode() -> CompressionMode {
    CompressionMode::Compress
}

#[derive(Debug, Serialize, JsonSchema)]
struct CompressResult {
    source: String,
    destination: String,
    mode: CompressionMode,
    input_bytes: u64,
    output_bytes: u64,
}

/// Compress tool - zlib-compresses or decompresses a file into another file.
pub struct FsCompressTool;

impl FsCompressTool {
    pub const NAME: &'static str = "fs_compress";

    pub const DESCRIPTION: &'static str = "Compress a file with zlib, or decompress a zlib file, writing the result to a destination file.";

    #[instrument(skip_all, fields(source = %params.source, mode = ?params.mode))]
    pub fn execute(params: &FsCompressParams, ctx: &ToolContext) -> CallToolResult {
        match Self::run(params, ctx) {
            Ok(result) => {
                info!(
                    input = result.input_bytes,
                    output = result.output_bytes,
                    "Compression finished"
                );
                let verb = match result.mode {
                    CompressionMode::Compress => "Compressed",
                    CompressionMode::Decompress => "Decompressed",
                };
                let summary = format!(
                    "{} {} ({} bytes) into {} ({} bytes)",
                    verb, params.source, result.input_bytes, params.destination, result.output_bytes
                );
                structured_result(summary, &result)
            }
            Err(e) => e.into_call_result(),
        }
    }

    fn run(params: &FsCompressParams, ctx: &ToolContext) -> Result<CompressResult, ToolError> {
        let source = ctx.validate(&params.source)?;
        let destination = ctx.validate(&params.destination)?;

        if !source.is_file() {
            return Err(ToolError::invalid_arguments(format!(
                "Source is not a file: {}",
                params.source
            )));
        }
        if source == destination {
            return Err(ToolError::invalid_arguments(
                "Source and destination must be different files",
            ));
        }
        if destination.exists() && !params.overwrite {
            return Err(ToolError::invalid_arguments(format!(
                "Destination already exists: {}. Use overwrite=true to replace it.",
                params.destination
            )));
        }

        let input_bytes = fs::metadata(&source)?.len();
        let output_bytes = match params.mode {
            CompressionMode::Compress => {
                let level = params.level.unwrap_or(6);
                if level > 9 {
                    return Err(ToolError::invalid_arguments(format!(
                        "Compression level must be between 0 and 9, got {}",
                        level
                    )));
                }
                compress(&source, &destination, Compression::new(level))?
            }
            CompressionMode::Decompress => {
                decompress(&source, &destination, ctx.config.limits.max_read_bytes)?
            }
        };

        Ok(CompressResult {
            source: source.to_string_lossy().to_string(),
            destination: destination.to_string_lossy().to_string(),
            mode: params.mode,
            input_bytes,
            output_bytes,
        })
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FsCompressParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<CompressResult>()),
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

fn compress(source: &Path, destination: &Path, level: Compression) -> Result<u64, ToolError> {
    let mut input = BufReader::new(File::open(source)?);
    let mut encoder = ZlibEncoder::new(BufWriter::new(File::create(destination)?), level);
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.flush()?;
    Ok(fs::metadata(destination)?.len())
}

/// Inflate `source` into `destination`, stopping at `max_output` bytes.
fn decompress(source: &Path, destination: &Path, max_output: u64) -> Result<u64, ToolError> {
    let decoder = ZlibDecoder::new(BufReader::new(File::open(source)?));
    let mut limited = decoder.take(max_output.saturating_add(1));
    let mut output = BufWriter::new(File::create(destination)?);

    let written = io::copy(&mut limited, &mut output).map_err(|e| {
        ToolError::execution_failed(format!("Not valid zlib data: {}", e))
    });
    let written = match written {
        Ok(n) if n <= max_output => n,
        Ok(_) => {
            drop(output);
            let _ = fs::remove_file(destination);
            return Err(ToolError::invalid_arguments(format!(
                "Decompressed output exceeds the {} byte limit",
                max_output
            )));
        }
        Err(e) => {
            drop(output);
            let _ = fs::remove_file(destination);
            return Err(e);
        }
    };
    output.flush()?;
    Ok(written)
}
