use std::collections::HashMap;

use ads_types::{Identity, Peer};
use async_trait::async_trait;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// An authenticated caller: the local identity and, for sync users of a
/// remote instance, the peer they speak for.
#[derive(Clone, Debug)]
pub struct Caller {
    pub identity: Identity,
    pub peer: Option<Peer>,
}

#[derive(Clone, Debug)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Parse an `Authorization` header value.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.and_then(|v| v.strip_prefix("Bearer ")) {
            Some(token) if !token.trim().is_empty() => Self::Bearer(token.trim().to_string()),
            _ => Self::Anonymous,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    ReadIndex,
    ProposePush,
    Upload,
    Fetch,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadIndex => write!(f, "read-index"),
            Self::ProposePush => write!(f, "propose-push"),
            Self::Upload => write!(f, "upload"),
            Self::Fetch => write!(f, "fetch"),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Caller>;
    async fn authorize(&self, caller: &Caller, action: Action) -> ServerResult<bool>;
}

/// Bearer tokens from the server configuration.
///
/// Every authenticated caller may read the index, answer proposals and
/// fetch records (visibility is applied later). Uploads additionally need
/// sync privilege.
pub struct StaticKeyAuth {
    keys: HashMap<String, Caller>,
}

impl StaticKeyAuth {
    pub fn from_config(config: &ServerConfig) -> Self {
        let keys = config
            .api_keys
            .iter()
            .map(|key| {
                let caller = Caller {
                    identity: key.identity(),
                    peer: key.peer_id.and_then(|id| config.peer(id)).cloned(),
                };
                (key.token.clone(), caller)
            })
            .collect();
        Self { keys }
    }
}

#[async_trait]
impl AuthProvider for StaticKeyAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Caller> {
        match credentials {
            Credentials::Bearer(token) => self
                .keys
                .get(token)
                .cloned()
                .ok_or_else(|| ServerError::AuthFailed("unknown api key".into())),
            Credentials::Anonymous => Err(ServerError::AuthFailed("missing bearer token".into())),
        }
    }

    async fn authorize(&self, caller: &Caller, action: Action) -> ServerResult<bool> {
        Ok(match action {
            Action::Upload => caller.identity.is_sync_privileged(),
            Action::ReadIndex | Action::ProposePush | Action::Fetch => true,
        })
    }
}
