use ads_gate::AccessFilter;
use ads_store::{Blocklist, Directory, RecordStore};
use ads_types::{AnalystData, Identity, Manifest, Peer, RecordKind};
use tracing::{debug, info};
use uuid::Uuid;

use crate::capture::CaptureEngine;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::negotiation::NegotiationEngine;
use crate::types::{CaptureOrigin, UploadOutcome};

/// Peer-side handlers for the four transport operations.
pub struct Responder<'a> {
    store: &'a dyn RecordStore,
    directory: &'a dyn Directory,
    blocklist: &'a dyn Blocklist,
    config: &'a SyncConfig,
}

impl<'a> Responder<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        directory: &'a dyn Directory,
        blocklist: &'a dyn Blocklist,
        config: &'a SyncConfig,
    ) -> Self {
        Self {
            store,
            directory,
            blocklist,
            config,
        }
    }

    /// `{kind: {uuid: modified}}` of every record visible to `identity`.
    pub fn index_minimal(&self, identity: &Identity) -> SyncResult<Manifest> {
        let visibility = AccessFilter::visibility(identity, self.directory)?;
        let mut manifest = Manifest::new();
        for kind in RecordKind::ALL {
            for record in self.store.list(kind)? {
                if visibility.allows(record.envelope()) {
                    manifest.insert(kind, record.uuid(), record.modified());
                }
            }
        }
        debug!(user = identity.user_id, entries = manifest.len(), "served analyst data index");
        Ok(manifest)
    }

    /// Subset of a push proposal this instance would accept.
    pub fn filter_proposal(&self, proposal: &Manifest) -> SyncResult<Manifest> {
        let accepted = NegotiationEngine::answer_proposal(self.store, self.blocklist, proposal)?;
        debug!(proposed = proposal.len(), accepted = accepted.len(), "answered push proposal");
        Ok(accepted)
    }

    /// Full records for the requested uuids, restricted to what `identity`
    /// may see, with creator organization and sharing group embedded.
    /// Unknown uuids are skipped.
    pub fn records_for_transfer(
        &self,
        identity: &Identity,
        kind: RecordKind,
        uuids: &[Uuid],
    ) -> SyncResult<Vec<AnalystData>> {
        let visibility = AccessFilter::visibility(identity, self.directory)?;
        let mut out = Vec::with_capacity(uuids.len());
        for uuid in uuids {
            let Some(mut record) = self.store.find_by_uuid(kind, uuid)? else {
                continue;
            };
            if !visibility.allows(record.envelope()) {
                continue;
            }
            let env = record.envelope_mut();
            if let Some(orgc) = env.orgc_uuid {
                env.orgc = self.directory.resolve_org(&orgc)?;
            }
            if env.distribution.is_sharing_group() {
                if let Some(id) = env.sharing_group_id {
                    env.sharing_group = self.directory.sharing_group(id)?;
                }
            }
            out.push(record);
        }
        Ok(out)
    }

    /// Accept an upload from a pushing peer.
    ///
    /// The uploading identity must hold sync privilege. The record goes
    /// through the capture pipeline like any other inbound record.
    pub fn receive_upload(
        &self,
        identity: &Identity,
        payload: serde_json::Value,
        peer: Option<&Peer>,
    ) -> UploadOutcome {
        if !identity.is_sync_privileged() {
            info!(user = identity.user_id, "analyst data upload refused: not a sync user");
            return UploadOutcome::PermissionDenied;
        }
        let engine = CaptureEngine::new(self.store, self.directory, self.blocklist, self.config);
        let result = engine.capture_value(identity, payload, CaptureOrigin::upload(peer));
        if result.success {
            UploadOutcome::Success
        } else if result.errors.is_empty() {
            UploadOutcome::ConflictRejected("Analyst data rejected".into())
        } else {
            UploadOutcome::ConflictRejected(result.errors.join("; "))
        }
    }
}
