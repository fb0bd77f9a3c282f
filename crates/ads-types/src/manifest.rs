use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::RecordKind;
use crate::record::AnalystData;
use crate::Timestamp;

/// Compact index of records: `{kind: {uuid: modified}}`.
///
/// Used as the push proposal, the peer's acceptance answer, and the minimal
/// index a pull diffs against. Never carries full payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<RecordKind, BTreeMap<Uuid, Timestamp>>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest over the given records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AnalystData>) -> Self {
        let mut manifest = Self::new();
        for record in records {
            manifest.insert(record.kind(), record.uuid(), record.modified());
        }
        manifest
    }

    pub fn insert(&mut self, kind: RecordKind, uuid: Uuid, modified: Timestamp) {
        self.entries.entry(kind).or_default().insert(uuid, modified);
    }

    pub fn get(&self, kind: RecordKind, uuid: &Uuid) -> Option<Timestamp> {
        self.entries.get(&kind).and_then(|m| m.get(uuid)).copied()
    }

    pub fn contains(&self, kind: RecordKind, uuid: &Uuid) -> bool {
        self.get(kind, uuid).is_some()
    }

    /// Entries of one kind, ordered by uuid.
    pub fn entries(&self, kind: RecordKind) -> impl Iterator<Item = (Uuid, Timestamp)> + '_ {
        self.entries
            .get(&kind)
            .into_iter()
            .flat_map(|m| m.iter().map(|(u, t)| (*u, *t)))
    }

    pub fn uuids(&self, kind: RecordKind) -> Vec<Uuid> {
        self.entries(kind).map(|(u, _)| u).collect()
    }

    /// Kinds that have at least one entry.
    pub fn kinds(&self) -> impl Iterator<Item = RecordKind> + '_ {
        self.entries
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(k, _)| *k)
    }

    /// Keep only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(RecordKind, &Uuid, &Timestamp) -> bool) {
        for (kind, map) in self.entries.iter_mut() {
            map.retain(|u, t| keep(*kind, u, t));
        }
        self.entries.retain(|_, m| !m.is_empty());
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
