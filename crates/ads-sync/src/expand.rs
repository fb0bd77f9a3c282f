use std::collections::HashSet;

use ads_gate::{AccessFilter, Visibility};
use ads_store::{Directory, RecordStore};
use ads_types::{AnalystData, Identity, RecordKind, TargetType};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::SyncResult;

/// A record with its visible child notes and opinions, recursively.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExpandedRecord {
    pub record: AnalystData,
    /// The reading identity may edit this record.
    pub can_edit: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<ExpandedRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub opinions: Vec<ExpandedRecord>,
}

impl ExpandedRecord {
    /// Number of records in this tree, including the root.
    pub fn count(&self) -> usize {
        1 + self
            .notes
            .iter()
            .chain(&self.opinions)
            .map(ExpandedRecord::count)
            .sum::<usize>()
    }
}

/// Read-side expansion of nested analyst data.
///
/// Children are filtered by the reader's visibility. A record already on
/// the current tree is never expanded twice, and expansion stops at
/// `max_depth`.
pub struct Expander<'a> {
    store: &'a dyn RecordStore,
    identity: &'a Identity,
    visibility: Visibility,
    max_depth: usize,
}

impl<'a> Expander<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        directory: &dyn Directory,
        identity: &'a Identity,
        max_depth: usize,
    ) -> SyncResult<Self> {
        Ok(Self {
            store,
            identity,
            visibility: AccessFilter::visibility(identity, directory)?,
            max_depth,
        })
    }

    pub fn expand(&self, record: AnalystData) -> SyncResult<ExpandedRecord> {
        let mut visited = HashSet::new();
        self.expand_at(record, 0, &mut visited)
    }

    /// Expanded analyst data attached to any object.
    pub fn expand_object(&self, target: TargetType, target_uuid: &Uuid) -> SyncResult<Vec<ExpandedRecord>> {
        let mut visited = HashSet::new();
        self.store
            .children_of(target, target_uuid)?
            .into_iter()
            .filter(|r| self.visibility.allows(r.envelope()))
            .map(|r| self.expand_at(r, 0, &mut visited))
            .collect()
    }

    fn expand_at(
        &self,
        record: AnalystData,
        depth: usize,
        visited: &mut HashSet<Uuid>,
    ) -> SyncResult<ExpandedRecord> {
        visited.insert(record.uuid());
        let target = record.kind().as_target();
        let uuid = record.uuid();
        let mut node = ExpandedRecord {
            can_edit: AccessFilter::can_edit(self.identity, record.envelope()),
            record,
            notes: Vec::new(),
            opinions: Vec::new(),
        };
        if depth >= self.max_depth {
            debug!(%uuid, depth, "analyst data expansion depth limit reached");
            return Ok(node);
        }

        for child in self.store.children_of(target, &uuid)? {
            let kind = child.kind();
            if !kind.is_nestable()
                || visited.contains(&child.uuid())
                || !self.visibility.allows(child.envelope())
            {
                continue;
            }
            let expanded = self.expand_at(child, depth + 1, visited)?;
            match kind {
                RecordKind::Note => node.notes.push(expanded),
                RecordKind::Opinion => node.opinions.push(expanded),
                RecordKind::Relationship => {}
            }
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{note, opinion, Fixture, ORG_A, ORG_B};
    use ads_types::Distribution;

    fn attach(mut record: AnalystData, parent: &AnalystData) -> AnalystData {
        record.envelope_mut().object_type = parent.kind().as_target();
        record.envelope_mut().object_uuid = parent.uuid();
        record
    }

    #[test]
    fn expands_nested_children() {
        let f = Fixture::new();
        let root = note(1, 10);
        let reply = attach(note(2, 11), &root);
        let score = attach(opinion(3, 12, 80), &root);
        let nested = attach(opinion(4, 13, 20), &reply);
        for r in [&root, &reply, &score, &nested] {
            f.store.upsert(r).unwrap();
        }

        let reader = Identity::user(1, "u@a", ORG_A);
        let tree = f.node.expand(&reader, root).unwrap();
        assert_eq!(tree.notes.len(), 1);
        assert_eq!(tree.opinions.len(), 1);
        assert_eq!(tree.notes[0].opinions.len(), 1);
        assert_eq!(tree.count(), 4);
        assert!(tree.can_edit);
    }

    #[test]
    fn hidden_children_are_dropped() {
        let f = Fixture::new();
        let root = note(1, 10);
        let mut private = attach(note(2, 11), &root);
        private.envelope_mut().distribution = Distribution::OrgOnly;
        f.store.upsert(&root).unwrap();
        f.store.upsert(&private).unwrap();

        let outsider = Identity::user(1, "u@b", ORG_B);
        let tree = f.node.expand(&outsider, root).unwrap();
        assert!(tree.notes.is_empty());
        assert!(!tree.can_edit);
    }

    #[test]
    fn cycles_terminate() {
        let f = Fixture::new();
        let a = note(1, 10);
        let b = attach(note(2, 10), &a);
        let a = attach(a, &b);
        f.store.upsert(&a).unwrap();
        f.store.upsert(&b).unwrap();
        let reader = Identity::user(1, "u@a", ORG_A);
        let tree = f.node.expand(&reader, a).unwrap();
        assert_eq!(tree.count(), 2);
    }

    #[test]
    fn depth_is_bounded() {
        let f = Fixture::with_config(crate::SyncConfig { max_expand_depth: 2, ..Default::default() });
        let mut parent = note(1, 10);
        f.store.upsert(&parent).unwrap();
        let root = parent.clone();
        for u in 2..=6 {
            let child = attach(note(u, 10), &parent);
            f.store.upsert(&child).unwrap();
            parent = child;
        }
        let reader = Identity::user(1, "u@a", ORG_A);
        assert_eq!(f.node.expand(&reader, root).unwrap().count(), 3);
    }

    #[test]
    fn object_expansion_collects_top_level_records() {
        let f = Fixture::new();
        let a = note(1, 10);
        let b = opinion(2, 10, 50);
        let reply = attach(note(3, 10), &a);
        for r in [&a, &b, &reply] {
            f.store.upsert(r).unwrap();
        }
        let reader = Identity::user(1, "u@a", ORG_A);
        let target = a.envelope().object_type;
        let object = a.envelope().object_uuid;
        let trees = f.node.expand_object(&reader, target, &object).unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees.iter().map(ExpandedRecord::count).sum::<usize>(), 3);
    }
}
