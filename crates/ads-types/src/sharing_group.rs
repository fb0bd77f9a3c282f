use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server id that stands for "this instance" in a sharing group's server list.
pub const LOCAL_SERVER_ID: u64 = 0;

/// A peer server authorized to receive a sharing group's records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingGroupServer {
    pub server_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SharingGroupServer {
    pub fn remote(server_id: u64) -> Self {
        Self {
            server_id,
            url: None,
            name: None,
        }
    }
}

/// Named set of organizations and peer servers a distribution-4 record is scoped to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingGroup {
    #[serde(default)]
    pub id: u64,
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    /// Any peer may receive the group's records regardless of `servers`.
    #[serde(default)]
    pub roaming: bool,
    #[serde(default)]
    pub organisations: Vec<Uuid>,
    #[serde(default)]
    pub servers: Vec<SharingGroupServer>,
}

impl SharingGroup {
    pub fn new(id: u64, uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            uuid,
            name: name.into(),
            roaming: false,
            organisations: Vec::new(),
            servers: Vec::new(),
        }
    }

    pub fn has_org(&self, org_uuid: &Uuid) -> bool {
        self.organisations.contains(org_uuid)
    }

    /// `true` if the peer is listed explicitly in the server list.
    pub fn lists_server(&self, server_id: u64) -> bool {
        self.servers.iter().any(|s| s.server_id == server_id)
    }

    /// `true` if records of this group may be sent to the given peer.
    pub fn reaches_server(&self, server_id: u64) -> bool {
        self.roaming || self.lists_server(server_id)
    }

    /// Make sure the local instance appears in the server list with a
    /// resolvable URL, so the receiving side can attribute it.
    pub fn announce_local(&mut self, base_url: &str) {
        let entry = SharingGroupServer {
            server_id: LOCAL_SERVER_ID,
            url: Some(base_url.to_string()),
            name: Some(base_url.to_string()),
        };
        match self.servers.iter_mut().find(|s| s.server_id == LOCAL_SERVER_ID) {
            Some(existing) => *existing = entry,
            None => self.servers.push(entry),
        }
    }
}
