use async_trait::async_trait;
use ads_types::{AnalystData, Manifest, Peer, RecordKind};
use uuid::Uuid;

use crate::error::SyncResult;
use crate::types::UploadOutcome;

/// Transport interface for a remote analyst-data peer.
///
/// The four operations are kept distinct: the proposal and the index carry
/// only `{uuid: modified}` manifests, while uploads and fetches carry full
/// records. `Err` means a transport-level failure; a peer's refusal is an
/// `Ok(UploadOutcome)`.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// The peer this transport talks to, with the capabilities of our credential.
    fn peer(&self) -> &Peer;

    /// Offer a manifest; the peer answers with the subset it would accept.
    async fn propose_for_push(&self, manifest: &Manifest) -> SyncResult<Manifest>;

    async fn upload_record(&self, record: &AnalystData) -> SyncResult<UploadOutcome>;

    /// `{kind: {uuid: modified}}` of everything the peer discloses to us.
    async fn fetch_index_minimal(&self) -> SyncResult<Manifest>;

    /// Full payloads for at most one chunk of uuids. Payloads are returned
    /// undecoded so that a malformed record only fails itself.
    async fn fetch_records(
        &self,
        kind: RecordKind,
        uuids: &[Uuid],
    ) -> SyncResult<Vec<serde_json::Value>>;
}
