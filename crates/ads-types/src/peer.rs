use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permissions granted to the credential we use to reach a peer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerCapabilities {
    /// General synchronization permission.
    #[serde(default)]
    pub sync: bool,
    /// Permission to read and write analyst data.
    #[serde(default)]
    pub analyst_data: bool,
}

impl PeerCapabilities {
    pub fn full() -> Self {
        Self {
            sync: true,
            analyst_data: true,
        }
    }
}

/// A remote instance in the federation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub url: String,
    /// Organization the peer declares as its own.
    pub org_uuid: Uuid,
    /// Internal peers are part of the same trust domain: no distribution
    /// narrowing on push and no lock protection against their edits.
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub push_enabled: bool,
    #[serde(default)]
    pub pull_enabled: bool,
    /// Inbound analyst-data push is enabled for this peer.
    #[serde(default)]
    pub push_analyst_data: bool,
    #[serde(default)]
    pub capabilities: PeerCapabilities,
}

impl Peer {
    /// A peer with push and pull enabled and full capabilities.
    pub fn new(id: u64, url: impl Into<String>, org_uuid: Uuid) -> Self {
        let url = url.into();
        Self {
            id,
            name: url.clone(),
            url,
            org_uuid,
            internal: false,
            push_enabled: true,
            pull_enabled: true,
            push_analyst_data: true,
            capabilities: PeerCapabilities::full(),
        }
    }

    pub fn accepts_analyst_data_push(&self) -> bool {
        self.push_enabled && self.push_analyst_data
    }

    pub fn allows_analyst_data_pull(&self) -> bool {
        self.pull_enabled && self.capabilities.analyst_data
    }

    /// Both the general sync and the analyst-data permission are held.
    pub fn can_upload_analyst_data(&self) -> bool {
        self.capabilities.sync && self.capabilities.analyst_data
    }
}
