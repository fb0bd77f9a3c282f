//! Fixtures shared by the unit tests in this crate.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ads_store::{InMemoryBlocklist, InMemoryDirectory, InMemoryRecordStore};
use ads_types::{
    AnalystData, Envelope, Manifest, Note, Opinion, Peer, RecordKind, Relationship, TargetType,
    Timestamp,
};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::node::SyncNode;
use crate::transport::PeerTransport;
use crate::types::UploadOutcome;

pub(crate) const ORG_A: Uuid = Uuid::from_u128(0xA000_0000_0000);
pub(crate) const ORG_B: Uuid = Uuid::from_u128(0xB000_0000_0000);
pub(crate) const EVENT: Uuid = Uuid::from_u128(0xE000_0000_0000);

pub(crate) fn ts(secs: i64) -> Timestamp {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn envelope(u: u128, secs: i64) -> Envelope {
    let mut env = Envelope::new(TargetType::Event, EVENT, ts(secs));
    env.uuid = Uuid::from_u128(u);
    env.org_uuid = ORG_A;
    env.orgc_uuid = Some(ORG_A);
    env.authors = "analyst@a".into();
    env
}

/// Community-distributed note held and created by `ORG_A`.
pub(crate) fn note(u: u128, secs: i64) -> AnalystData {
    AnalystData::Note(Note {
        envelope: envelope(u, secs),
        note: format!("note {u}"),
        language: Some("en".into()),
    })
}

pub(crate) fn opinion(u: u128, secs: i64, score: u8) -> AnalystData {
    AnalystData::Opinion(Opinion {
        envelope: envelope(u, secs),
        opinion: score,
        comment: String::new(),
    })
}

pub(crate) fn relationship(u: u128, relationship_type: &str) -> AnalystData {
    AnalystData::Relationship(Relationship {
        envelope: envelope(u, 10),
        relationship_type: relationship_type.into(),
        related_object_type: TargetType::Attribute,
        related_object_uuid: Uuid::from_u128(u + 0x1000),
    })
}

/// A node over in-memory collaborators, with handles to each of them.
pub(crate) struct Fixture {
    pub node: Arc<SyncNode>,
    pub store: Arc<InMemoryRecordStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub blocklist: Arc<InMemoryBlocklist>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        let store = Arc::new(InMemoryRecordStore::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let blocklist = Arc::new(InMemoryBlocklist::new());
        let node = SyncNode::new(store.clone(), directory.clone(), blocklist.clone(), config);
        Self {
            node: Arc::new(node),
            store,
            directory,
            blocklist,
        }
    }
}

#[derive(Default)]
struct Calls {
    proposals: Vec<Manifest>,
    uploads: Vec<AnalystData>,
    fetched: Vec<Vec<Uuid>>,
}

/// Scriptable peer that records every call.
pub(crate) struct MockTransport {
    peer: Peer,
    served: BTreeMap<Uuid, AnalystData>,
    accept: Option<HashSet<Uuid>>,
    failing_uploads: HashSet<Uuid>,
    failing_chunk: Option<usize>,
    failing_index: bool,
    corrupt: HashSet<Uuid>,
    calls: Mutex<Calls>,
}

impl MockTransport {
    pub fn new(peer: Peer) -> Self {
        Self {
            peer,
            served: BTreeMap::new(),
            accept: Some(HashSet::new()),
            failing_uploads: HashSet::new(),
            failing_chunk: None,
            failing_index: false,
            corrupt: HashSet::new(),
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn accepting(mut self, uuids: impl IntoIterator<Item = Uuid>) -> Self {
        self.accept = Some(uuids.into_iter().collect());
        self
    }

    pub fn accepting_all(mut self) -> Self {
        self.accept = None;
        self
    }

    pub fn serving(mut self, records: impl IntoIterator<Item = AnalystData>) -> Self {
        self.served.extend(records.into_iter().map(|r| (r.uuid(), r)));
        self
    }

    pub fn failing_upload(mut self, uuid: Uuid) -> Self {
        self.failing_uploads.insert(uuid);
        self
    }

    /// Fail the `index`-th `fetch_records` call (zero-based).
    pub fn failing_chunk(mut self, index: usize) -> Self {
        self.failing_chunk = Some(index);
        self
    }

    pub fn failing_index(mut self) -> Self {
        self.failing_index = true;
        self
    }

    /// Serve an undecodable payload for `uuid`.
    pub fn corrupting(mut self, uuid: Uuid) -> Self {
        self.corrupt.insert(uuid);
        self
    }

    pub fn proposals(&self) -> Vec<Manifest> {
        self.calls.lock().unwrap().proposals.clone()
    }

    pub fn uploads(&self) -> Vec<AnalystData> {
        self.calls.lock().unwrap().uploads.clone()
    }

    pub fn fetched(&self) -> Vec<Vec<Uuid>> {
        self.calls.lock().unwrap().fetched.clone()
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    fn peer(&self) -> &Peer {
        &self.peer
    }

    async fn propose_for_push(&self, manifest: &Manifest) -> SyncResult<Manifest> {
        self.calls.lock().unwrap().proposals.push(manifest.clone());
        let mut accepted = manifest.clone();
        if let Some(accept) = &self.accept {
            accepted.retain(|_, uuid, _| accept.contains(uuid));
        }
        Ok(accepted)
    }

    async fn upload_record(&self, record: &AnalystData) -> SyncResult<UploadOutcome> {
        if self.failing_uploads.contains(&record.uuid()) {
            return Err(SyncError::network(self.peer.id, "uploading analyst data", "connection reset"));
        }
        self.calls.lock().unwrap().uploads.push(record.clone());
        Ok(UploadOutcome::Success)
    }

    async fn fetch_index_minimal(&self) -> SyncResult<Manifest> {
        if self.failing_index {
            return Err(SyncError::network(self.peer.id, "fetching the index", "timed out"));
        }
        Ok(Manifest::from_records(self.served.values()))
    }

    async fn fetch_records(
        &self,
        kind: RecordKind,
        uuids: &[Uuid],
    ) -> SyncResult<Vec<serde_json::Value>> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.fetched.push(uuids.to_vec());
            calls.fetched.len() - 1
        };
        if self.failing_chunk == Some(call) {
            return Err(SyncError::network(self.peer.id, "fetching records", "502 bad gateway"));
        }
        Ok(uuids
            .iter()
            .filter_map(|u| self.served.get(u))
            .filter(|r| r.kind() == kind)
            .map(|r| {
                if self.corrupt.contains(&r.uuid()) {
                    serde_json::json!({ "Note": { "uuid": r.uuid() } })
                } else {
                    r.to_value()
                }
            })
            .collect())
    }
}
