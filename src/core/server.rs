//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler. A server value is one
//! session: it owns the session allow-list and the tool router built on it.
//!
//! ## Session lifecycle
//!
//! 1. The transport calls [`McpServer::session`] to fork a fresh server
//!    seeded with the startup directories.
//! 2. After the MCP handshake it calls [`McpServer::on_session_start`], which
//!    pulls the client's roots when the client supports them.
//! 3. `notifications/roots/list_changed` re-runs the roots pull.
//!
//! The ToolRouter is built dynamically in `domains/tools/router.rs`.

use std::sync::Arc;

use rmcp::{
    RoleServer, ServerHandler,
    handler::server::tool::ToolRouter,
    model::*,
    service::{NotificationContext, Peer},
    tool_handler,
};
use tracing::{debug, info, instrument, warn};

use super::config::Config;
use super::error::{Error as CoreError, Result as CoreResult};
use super::security::{
    AllowedDirectories, RootSpecification, RootsReconciliation, reconcile_roots,
    resolve_startup_directories,
};
use crate::domains::tools::{ToolContext, build_tool_router};

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Resolved startup directories every new session is seeded with.
    startup_dirs: Arc<[String]>,

    /// The allow-list of this session.
    allowed: AllowedDirectories,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    ///
    /// # Errors
    ///
    /// Fails when a configured allowed directory exists but is not a directory.
    pub fn new(config: Config) -> CoreResult<Self> {
        let startup_dirs: Arc<[String]> =
            resolve_startup_directories(&config.security.allowed_directories)?.into();
        info!(directories = ?startup_dirs, "Startup directories resolved");

        Ok(Self::with_session(Arc::new(config), startup_dirs))
    }

    fn with_session(config: Arc<Config>, startup_dirs: Arc<[String]>) -> Self {
        let allowed = AllowedDirectories::new(startup_dirs.iter());
        let context = Arc::new(ToolContext::new(config.clone(), allowed.clone()));

        Self {
            tool_router: build_tool_router::<Self>(context),
            config,
            startup_dirs,
            allowed,
        }
    }

    /// Fork a server for a new session with its own allow-list.
    pub fn session(&self) -> Self {
        Self::with_session(self.config.clone(), self.startup_dirs.clone())
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The allow-list of this session.
    pub fn allowed_directories(&self) -> &AllowedDirectories {
        &self.allowed
    }

    /// Run once the client has completed the handshake.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the session ends up with no allowed
    /// directory: nothing given at startup and no roots from the client.
    pub async fn on_session_start(&self, peer: &Peer<RoleServer>) -> CoreResult<()> {
        let supports_roots = peer
            .peer_info()
            .is_some_and(|info| info.capabilities.roots.is_some());

        if supports_roots {
            self.sync_roots(peer).await;
        } else {
            debug!("Client does not support roots; keeping startup directories");
        }

        if self.allowed.is_empty() {
            return Err(CoreError::config(
                "No allowed directories: pass at least one directory on the command line \
                 or connect with a client that supports MCP roots",
            ));
        }

        Ok(())
    }

    /// Ask the client for its roots and reconcile them into the allow-list.
    #[instrument(skip_all)]
    pub async fn sync_roots(&self, peer: &Peer<RoleServer>) -> Option<RootsReconciliation> {
        let result = match peer.list_roots().await {
            Ok(result) => result,
            Err(e) => {
                warn!("Failed to request roots from client: {}", e);
                return None;
            }
        };

        let specs: Vec<RootSpecification> = result
            .roots
            .into_iter()
            .map(|root| RootSpecification {
                uri: root.uri,
                name: root.name,
            })
            .collect();

        Some(reconcile_roots(&specs, &self.allowed))
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Filesystem, git and code-check tools confined to the allowed directories. \
                 Call list_allowed_directories to see where you may operate."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn on_roots_list_changed(&self, context: NotificationContext<RoleServer>) {
        info!("Client roots changed");
        let server = self.clone();
        tokio::spawn(async move {
            server.sync_roots(&context.peer).await;
        });
    }
}
