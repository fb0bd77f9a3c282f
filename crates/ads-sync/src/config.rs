use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Records fetched per pull request.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Upper bound on uuids in a single fetch, on both the pulling and the
/// serving side.
pub const MAX_FETCH_BATCH: usize = 100;

/// Nesting levels followed when expanding child notes and opinions.
pub const DEFAULT_MAX_EXPAND_DEPTH: usize = 16;

/// Configuration for the sync engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum uuids per `fetch_records` call during a pull.
    pub chunk_size: usize,
    /// Check the creator organization against the organization blocklist.
    pub org_blocklisting: bool,
    /// The acknowledged host organization. Records pulled from an internal
    /// peer belonging to this organization keep their distribution.
    pub host_org_uuid: Option<Uuid>,
    /// This instance's base URL, announced in sharing-group server lists.
    pub announce_base_url: String,
    pub max_expand_depth: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            org_blocklisting: true,
            host_org_uuid: None,
            announce_base_url: "http://localhost".into(),
            max_expand_depth: DEFAULT_MAX_EXPAND_DEPTH,
        }
    }
}

impl SyncConfig {
    /// Chunk size clamped to `1..=MAX_FETCH_BATCH`.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.clamp(1, MAX_FETCH_BATCH)
    }

    /// `true` if records pulled from `peer` keep their announced distribution.
    pub fn trusts_as_host(&self, peer: &ads_types::Peer) -> bool {
        peer.internal && self.host_org_uuid == Some(peer.org_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ads_types::Peer;

    #[test]
    fn defaults() {
        let c = SyncConfig::default();
        assert_eq!(c.chunk_size, 100);
        assert!(c.org_blocklisting);
        assert!(c.host_org_uuid.is_none());
        assert_eq!(c.max_expand_depth, 16);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let c: SyncConfig = serde_json::from_str(r#"{"chunk_size": 10}"#).unwrap();
        assert_eq!(c.chunk_size, 10);
        assert!(c.org_blocklisting);
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        let c = SyncConfig { chunk_size: 0, ..Default::default() };
        assert_eq!(c.effective_chunk_size(), 1);
    }

    #[test]
    fn oversized_chunk_size_is_capped() {
        let c = SyncConfig { chunk_size: 5_000, ..Default::default() };
        assert_eq!(c.effective_chunk_size(), MAX_FETCH_BATCH);
        let c = SyncConfig { chunk_size: 40, ..Default::default() };
        assert_eq!(c.effective_chunk_size(), 40);
    }

    #[test]
    fn host_trust_needs_internal_peer_of_host_org() {
        let host = Uuid::new_v4();
        let c = SyncConfig { host_org_uuid: Some(host), ..Default::default() };
        let mut peer = Peer::new(1, "https://h", host);
        assert!(!c.trusts_as_host(&peer));
        peer.internal = true;
        assert!(c.trusts_as_host(&peer));
        peer.org_uuid = Uuid::new_v4();
        assert!(!c.trusts_as_host(&peer));
    }
}
