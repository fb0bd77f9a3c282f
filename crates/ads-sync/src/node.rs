use std::sync::Arc;

use ads_gate::AccessFilter;
use ads_store::{
    Blocklist, Directory, FieldError, InMemoryBlocklist, InMemoryDirectory, InMemoryRecordStore,
    RecordStore, StoreError,
};
use ads_types::{AnalystData, Identity, Manifest, Peer, RecordKind, TargetType};
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::capture::CaptureEngine;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::expand::{ExpandedRecord, Expander};
use crate::pull::PullOrchestrator;
use crate::push::PushOrchestrator;
use crate::responder::Responder;
use crate::transport::PeerTransport;
use crate::types::{CaptureOrigin, CaptureResult, PullResult, PushResult, UploadOutcome};

/// One analyst-data instance: its collaborators plus every sync operation.
///
/// Cheap to share behind an `Arc`; all state lives in the collaborators.
pub struct SyncNode {
    store: Arc<dyn RecordStore>,
    directory: Arc<dyn Directory>,
    blocklist: Arc<dyn Blocklist>,
    config: SyncConfig,
}

impl SyncNode {
    pub fn new(
        store: Arc<dyn RecordStore>,
        directory: Arc<dyn Directory>,
        blocklist: Arc<dyn Blocklist>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            directory,
            blocklist,
            config,
        }
    }

    /// Node backed entirely by in-memory collaborators.
    pub fn in_memory(config: SyncConfig) -> Self {
        Self::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryDirectory::new()),
            Arc::new(InMemoryBlocklist::new()),
            config,
        )
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn directory(&self) -> &dyn Directory {
        self.directory.as_ref()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn capture_engine(&self) -> CaptureEngine<'_> {
        CaptureEngine::new(
            self.store.as_ref(),
            self.directory.as_ref(),
            self.blocklist.as_ref(),
            &self.config,
        )
    }

    pub fn push_orchestrator(&self) -> PushOrchestrator<'_> {
        PushOrchestrator::new(self.store.as_ref(), self.directory.as_ref(), &self.config)
    }

    pub fn pull_orchestrator(&self) -> PullOrchestrator<'_> {
        PullOrchestrator::new(self.store.as_ref(), self.capture_engine(), &self.config)
    }

    pub fn responder(&self) -> Responder<'_> {
        Responder::new(
            self.store.as_ref(),
            self.directory.as_ref(),
            self.blocklist.as_ref(),
            &self.config,
        )
    }

    // -----------------------------------------------------------------------
    // Capture
    // -----------------------------------------------------------------------

    pub fn capture(&self, identity: &Identity, record: AnalystData, origin: CaptureOrigin<'_>) -> CaptureResult {
        self.capture_engine().capture(identity, record, origin)
    }

    pub fn capture_value(
        &self,
        identity: &Identity,
        payload: serde_json::Value,
        origin: CaptureOrigin<'_>,
    ) -> CaptureResult {
        self.capture_engine().capture_value(identity, payload, origin)
    }

    /// Capture a batch of payloads; each succeeds or fails on its own.
    pub fn capture_all(
        &self,
        identity: &Identity,
        payloads: impl IntoIterator<Item = serde_json::Value>,
        origin: CaptureOrigin<'_>,
    ) -> CaptureResult {
        let engine = self.capture_engine();
        let mut total = CaptureResult::default();
        for payload in payloads {
            total.absorb(engine.capture_value(identity, payload, origin));
        }
        total
    }

    // -----------------------------------------------------------------------
    // Outbound sync
    // -----------------------------------------------------------------------

    pub async fn push(&self, identity: &Identity, transport: &dyn PeerTransport) -> PushResult {
        self.push_orchestrator().push(identity, transport).await
    }

    pub async fn pull(&self, identity: &Identity, transport: &dyn PeerTransport) -> PullResult {
        self.pull_orchestrator().pull(identity, transport).await
    }

    // -----------------------------------------------------------------------
    // Peer-side operations
    // -----------------------------------------------------------------------

    pub fn index_minimal(&self, identity: &Identity) -> SyncResult<Manifest> {
        self.responder().index_minimal(identity)
    }

    pub fn filter_proposal(&self, proposal: &Manifest) -> SyncResult<Manifest> {
        self.responder().filter_proposal(proposal)
    }

    pub fn records_for_transfer(
        &self,
        identity: &Identity,
        kind: RecordKind,
        uuids: &[Uuid],
    ) -> SyncResult<Vec<AnalystData>> {
        self.responder().records_for_transfer(identity, kind, uuids)
    }

    pub fn receive_upload(
        &self,
        identity: &Identity,
        payload: serde_json::Value,
        peer: Option<&Peer>,
    ) -> UploadOutcome {
        self.responder().receive_upload(identity, payload, peer)
    }

    // -----------------------------------------------------------------------
    // Reads and local authoring
    // -----------------------------------------------------------------------

    pub fn expand(&self, identity: &Identity, record: AnalystData) -> SyncResult<ExpandedRecord> {
        self.expander(identity)?.expand(record)
    }

    pub fn expand_object(
        &self,
        identity: &Identity,
        target: TargetType,
        target_uuid: &Uuid,
    ) -> SyncResult<Vec<ExpandedRecord>> {
        self.expander(identity)?.expand_object(target, target_uuid)
    }

    fn expander<'a>(&'a self, identity: &'a Identity) -> SyncResult<Expander<'a>> {
        Expander::new(
            self.store.as_ref(),
            self.directory.as_ref(),
            identity,
            self.config.max_expand_depth,
        )
    }

    pub fn relationship_types(&self) -> SyncResult<Vec<String>> {
        Ok(self.store.relationship_types()?)
    }

    /// Create or edit a record on behalf of a local user.
    ///
    /// New records get a fresh uuid when none is given, are held and created
    /// by the user's organization (sync users may keep a supplied creator),
    /// and start unlocked. Edits require edit rights and keep ownership,
    /// lock state and creation time. `modified` always advances.
    pub fn author(&self, identity: &Identity, mut record: AnalystData) -> SyncResult<AnalystData> {
        let kind = record.kind();
        let existing = match record.uuid() {
            uuid if uuid.is_nil() => None,
            uuid => self.store.find_by_uuid(kind, &uuid)?,
        };

        let now = Utc::now();
        let env = record.envelope_mut();
        match &existing {
            Some(current) => {
                let current = current.envelope();
                if !AccessFilter::can_edit(identity, current) {
                    return Err(SyncError::Forbidden(format!(
                        "user {} may not edit analyst data {}",
                        identity.user_id, current.uuid
                    )));
                }
                env.id = current.id;
                env.org_uuid = current.org_uuid;
                env.orgc_uuid = current.orgc_uuid;
                env.locked = current.locked;
                env.created = current.created;
                if env.authors.is_empty() {
                    env.authors = current.authors.clone();
                }
                env.modified = now.max(current.modified + Duration::milliseconds(1));
            }
            None => {
                env.id = None;
                if env.uuid.is_nil() {
                    env.uuid = Uuid::new_v4();
                }
                env.org_uuid = identity.org_uuid;
                if env.orgc_uuid.is_none() || !identity.is_sync_privileged() {
                    env.orgc_uuid = Some(identity.org_uuid);
                }
                if env.authors.is_empty() {
                    env.authors = identity.email.clone();
                }
                env.locked = false;
                env.created = None;
                env.modified = now;
            }
        }
        env.orgc = None;

        if env.distribution.is_sharing_group() {
            if let Some(group) = env.sharing_group.take() {
                env.sharing_group_id = self.directory.capture_sharing_group(&group, identity)?;
            }
            let known = match env.sharing_group_id {
                Some(id) => self.directory.sharing_group(id)?.is_some(),
                None => false,
            };
            if !known {
                return Err(StoreError::Validation(vec![FieldError::new(
                    "sharing_group_id",
                    "must reference a known sharing group",
                )])
                .into());
            }
        } else {
            env.sharing_group = None;
            env.sharing_group_id = None;
        }

        let stored = self.store.upsert(&record)?;
        info!(%kind, uuid = %stored.uuid(), user = identity.user_id, "analyst data saved");
        Ok(stored)
    }
}

impl std::fmt::Debug for SyncNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncNode").field("config", &self.config).finish()
    }
}
