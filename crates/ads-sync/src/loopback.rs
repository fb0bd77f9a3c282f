use std::sync::Arc;

use async_trait::async_trait;
use ads_types::{AnalystData, Identity, Manifest, Peer, RecordKind};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};
use crate::node::SyncNode;
use crate::transport::PeerTransport;
use crate::types::UploadOutcome;

/// In-process transport that calls straight into another [`SyncNode`].
///
/// `peer` is how the local side sees the remote instance. `credential` is
/// the identity the remote side authenticates us as, and `origin` is how
/// the remote side sees us.
pub struct LoopbackTransport {
    remote: Arc<SyncNode>,
    peer: Peer,
    credential: Identity,
    origin: Option<Peer>,
}

impl LoopbackTransport {
    pub fn new(remote: Arc<SyncNode>, peer: Peer, credential: Identity) -> Self {
        Self {
            remote,
            peer,
            credential,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Peer) -> Self {
        self.origin = Some(origin);
        self
    }
}

fn remote_error(e: SyncError) -> SyncError {
    match e {
        SyncError::Remote(_) => e,
        other => SyncError::Remote(other.to_string()),
    }
}

#[async_trait]
impl PeerTransport for LoopbackTransport {
    fn peer(&self) -> &Peer {
        &self.peer
    }

    async fn propose_for_push(&self, manifest: &Manifest) -> SyncResult<Manifest> {
        self.remote.filter_proposal(manifest).map_err(remote_error)
    }

    async fn upload_record(&self, record: &AnalystData) -> SyncResult<UploadOutcome> {
        Ok(self
            .remote
            .receive_upload(&self.credential, record.to_value(), self.origin.as_ref()))
    }

    async fn fetch_index_minimal(&self) -> SyncResult<Manifest> {
        self.remote.index_minimal(&self.credential).map_err(remote_error)
    }

    async fn fetch_records(
        &self,
        kind: RecordKind,
        uuids: &[Uuid],
    ) -> SyncResult<Vec<serde_json::Value>> {
        let records = self
            .remote
            .records_for_transfer(&self.credential, kind, uuids)
            .map_err(remote_error)?;
        Ok(records.iter().map(AnalystData::to_value).collect())
    }
}
