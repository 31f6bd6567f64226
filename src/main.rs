//! MCP Server Entry Point
//!
//! Parses the command line, initializes logging, loads configuration, and
//! starts the server with the configured transport.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use workspace_mcp_server::core::{Config, McpServer, TransportService};
use workspace_mcp_server::domains::tools::ToolRegistry;

/// Sandboxed filesystem, git and code-check tools over MCP.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directories the tools may access. Clients supporting MCP roots
    /// replace them per session.
    #[arg(value_name = "DIR")]
    allowed_dirs: Vec<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "MCP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print the available tools and exit.
    #[arg(long)]
    list_tools: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_tools {
        for tool in ToolRegistry::get_all_tools() {
            println!("{:<26} {}", tool.name, tool.description.unwrap_or_default());
        }
        return Ok(());
    }

    let mut config = Config::from_env().with_allowed_directories(cli.allowed_dirs);
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);
    config.log_warnings();

    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::new(config).context("Invalid allowed directories")?;

    info!("Server initialized");

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout belongs to the STDIO transport.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
