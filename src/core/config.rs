//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, command-line arguments, or defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Security and path validation configuration.
    pub security: SecurityConfig,

    /// Resource limits applied to tool calls.
    pub limits: LimitsConfig,

    /// External binaries used by the passthrough tools.
    pub tools: ToolsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Configuration for security and path validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Directories every session starts with.
    /// Clients supporting the roots protocol replace them per session.
    pub allowed_directories: Vec<PathBuf>,
}

/// Limits applied to tool calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Tool calls admitted per minute, per session.
    pub rate_limit_per_minute: u32,

    /// Largest file the read and content tools will load.
    pub max_read_bytes: u64,

    /// Timeout for git and code-check child processes.
    pub command_timeout_secs: u64,

    /// Captured stdout/stderr is truncated beyond this many bytes.
    pub max_output_bytes: usize,

    /// Deepest directory level `fs_search` descends to.
    pub max_search_depth: usize,

    /// Matches returned by `fs_search` before it stops.
    pub max_search_results: usize,
}

/// Binaries used by the passthrough tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub git_binary: String,
    pub eslint_binary: String,
    pub tsc_binary: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 120,
            max_read_bytes: 10 * 1024 * 1024,
            command_timeout_secs: 60,
            max_output_bytes: 256 * 1024,
            max_search_depth: 32,
            max_search_results: 1000,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git_binary: "git".to_string(),
            eslint_binary: "eslint".to_string(),
            tsc_binary: "tsc".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "workspace-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            security: SecurityConfig::default(),
            limits: LimitsConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`, `MCP_ALLOWED_DIRS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        // Uses the platform path-list syntax (':' on Unix, ';' on Windows)
        if let Some(dirs) = std::env::var_os("MCP_ALLOWED_DIRS") {
            config.security.allowed_directories = std::env::split_paths(&dirs)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            info!(
                "Allowed directories loaded from environment: {:?}",
                config.security.allowed_directories
            );
        }

        let limits = &mut config.limits;
        limits.rate_limit_per_minute =
            env_parse("MCP_RATE_LIMIT_PER_MINUTE").unwrap_or(limits.rate_limit_per_minute);
        limits.max_read_bytes = env_parse("MCP_MAX_READ_BYTES").unwrap_or(limits.max_read_bytes);
        limits.command_timeout_secs =
            env_parse("MCP_COMMAND_TIMEOUT_SECS").unwrap_or(limits.command_timeout_secs);

        if let Ok(git) = std::env::var("MCP_GIT_BINARY") {
            config.tools.git_binary = git;
        }

        config
    }

    /// Append directories given on the command line.
    pub fn with_allowed_directories(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.security.allowed_directories.extend(dirs);
        self
    }

    /// Warn about settings that make every tool call fail.
    pub fn log_warnings(&self) {
        if self.security.allowed_directories.is_empty() {
            warn!(
                "No allowed directories configured. The connected client must \
                 support the roots protocol, otherwise the session is refused."
            );
        }
        if self.limits.rate_limit_per_minute == 0 {
            warn!("MCP_RATE_LIMIT_PER_MINUTE is 0; rate limiting disabled");
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_allowed_dirs_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        let joined = std::env::join_paths(["/srv/a", "/srv/b"]).unwrap();
        unsafe {
            std::env::set_var("MCP_ALLOWED_DIRS", &joined);
        }
        let config = Config::from_env();
        assert_eq!(
            config.security.allowed_directories,
            vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")]
        );
        unsafe {
            std::env::remove_var("MCP_ALLOWED_DIRS");
        }
    }

    #[test]
    fn test_limits_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_RATE_LIMIT_PER_MINUTE", "7");
            std::env::set_var("MCP_COMMAND_TIMEOUT_SECS", "not-a-number");
        }
        let config = Config::from_env();
        assert_eq!(config.limits.rate_limit_per_minute, 7);
        assert_eq!(
            config.limits.command_timeout_secs,
            LimitsConfig::default().command_timeout_secs
        );
        unsafe {
            std::env::remove_var("MCP_RATE_LIMIT_PER_MINUTE");
            std::env::remove_var("MCP_COMMAND_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_cli_directories_are_appended() {
        let mut config = Config::default();
        config.security.allowed_directories = vec![PathBuf::from("/env")];
        let config = config.with_allowed_directories([PathBuf::from("/cli")]);
        assert_eq!(
            config.security.allowed_directories,
            vec![PathBuf::from("/env"), PathBuf::from("/cli")]
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.security.allowed_directories.is_empty());
        assert_eq!(config.tools.git_binary, "git");
        assert!(config.limits.rate_limit_per_minute > 0);
    }
}
