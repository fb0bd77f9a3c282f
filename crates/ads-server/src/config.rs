use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use ads_sync::SyncConfig;
use ads_types::{Identity, Organisation, Peer, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub instance: InstanceConfig,
    pub sync: SyncConfig,
    pub api_keys: Vec<ApiKeyConfig>,
    pub peers: Vec<Peer>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8443)),
            instance: InstanceConfig::default(),
            sync: SyncConfig::default(),
            api_keys: Vec::new(),
            peers: Vec::new(),
        }
    }
}

/// The organization hosting this instance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub org_uuid: Uuid,
    #[serde(default)]
    pub org_name: String,
}

impl InstanceConfig {
    pub fn organisation(&self) -> Organisation {
        Organisation::local(self.org_uuid, self.org_name.clone())
    }
}

/// A bearer token and the identity it authenticates as.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    pub token: String,
    pub user_id: u64,
    #[serde(default)]
    pub email: String,
    pub org_uuid: Uuid,
    #[serde(default)]
    pub site_admin: bool,
    #[serde(default)]
    pub sync: bool,
    /// The peer this key belongs to, for sync users of remote instances.
    #[serde(default)]
    pub peer_id: Option<u64>,
}

impl ApiKeyConfig {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            email: self.email.clone(),
            org_uuid: self.org_uuid,
            role: Role {
                site_admin: self.site_admin,
                sync: self.sync,
            },
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn peer(&self, id: u64) -> Option<&Peer> {
        self.peers.iter().find(|p| p.id == id)
    }

    /// Check cross-references the type system cannot express.
    pub fn validate(&self) -> ServerResult<()> {
        if self.instance.org_uuid.is_nil() {
            return Err(ServerError::Config("instance.org_uuid must be set".into()));
        }
        let mut tokens = HashSet::new();
        for key in &self.api_keys {
            if key.token.trim().is_empty() {
                return Err(ServerError::Config(format!("api key for user {} has an empty token", key.user_id)));
            }
            if !tokens.insert(key.token.as_str()) {
                return Err(ServerError::Config(format!("duplicate api key for user {}", key.user_id)));
            }
            if let Some(peer_id) = key.peer_id {
                if self.peer(peer_id).is_none() {
                    return Err(ServerError::Config(format!(
                        "api key for user {} references unknown peer {peer_id}",
                        key.user_id
                    )));
                }
            }
        }
        let mut ids = HashSet::new();
        for peer in &self.peers {
            if !ids.insert(peer.id) {
                return Err(ServerError::Config(format!("duplicate peer id {}", peer.id)));
            }
        }
        Ok(())
    }
}
