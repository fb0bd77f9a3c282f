use std::sync::Arc;

use ads_store::{InMemoryBlocklist, InMemoryDirectory, InMemoryRecordStore};
use ads_sync::SyncNode;
use tokio::net::TcpListener;

use crate::auth::{AuthProvider, StaticKeyAuth};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Analyst-data peer server.
pub struct AnalystDataServer {
    config: ServerConfig,
    node: Arc<SyncNode>,
    auth: Arc<dyn AuthProvider>,
}

impl AnalystDataServer {
    /// Server over in-memory collaborators, with the instance organization
    /// registered in the directory.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let directory = InMemoryDirectory::new();
        directory
            .add_org(config.instance.organisation())
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        let node = SyncNode::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(directory),
            Arc::new(InMemoryBlocklist::new()),
            config.sync.clone(),
        );
        Ok(Self::with_node(config, Arc::new(node)))
    }

    pub fn with_node(config: ServerConfig, node: Arc<SyncNode>) -> Self {
        let auth = Arc::new(StaticKeyAuth::from_config(&config));
        Self { config, node, auth }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn node(&self) -> &Arc<SyncNode> {
        &self.node
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState {
            node: self.node.clone(),
            auth: self.auth.clone(),
        })
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "analyst data server listening");
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
