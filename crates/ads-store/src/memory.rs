use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use ads_types::{AnalystData, RecordKind, TargetType};
use uuid::Uuid;

use crate::error::{poisoned, FieldError, StoreError, StoreResult};
use crate::traits::RecordStore;
use crate::validation::validate_record;

#[derive(Default)]
struct Rows {
    rows: BTreeMap<u64, AnalystData>,
    by_uuid: HashMap<(RecordKind, Uuid), u64>,
    next_id: u64,
}

/// In-memory record store.
///
/// Intended for tests and embedding. Rows live in a `BTreeMap` keyed by row
/// id behind a `RwLock`, with a `(kind, uuid)` index. Records are cloned on
/// read and write.
pub struct InMemoryRecordStore {
    inner: RwLock<Rows>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Rows {
                next_id: 1,
                ..Rows::default()
            }),
        }
    }

    /// Seed a store, stripping any incoming row ids.
    pub fn from_records(records: impl IntoIterator<Item = AnalystData>) -> StoreResult<Self> {
        let store = Self::new();
        for mut record in records {
            record.envelope_mut().id = None;
            store.upsert(&record)?;
        }
        Ok(store)
    }

    /// Number of stored records across all kinds.
    pub fn len(&self) -> usize {
        self.inner.read().map(|r| r.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn find_by_uuid(&self, kind: RecordKind, uuid: &Uuid) -> StoreResult<Option<AnalystData>> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows
            .by_uuid
            .get(&(kind, *uuid))
            .and_then(|id| rows.rows.get(id))
            .cloned())
    }

    fn upsert(&self, record: &AnalystData) -> StoreResult<AnalystData> {
        let mut errors = validate_record(record);
        let mut rows = self.inner.write().map_err(poisoned)?;
        let key = (record.kind(), record.uuid());

        let id = match record.envelope().id {
            Some(id) => {
                let existing = rows.rows.get(&id).ok_or(StoreError::RowNotFound(id))?;
                if existing.kind() != record.kind() || existing.uuid() != record.uuid() {
                    errors.push(FieldError::new("uuid", "is immutable once created"));
                }
                id
            }
            None => {
                if rows.by_uuid.contains_key(&key) {
                    errors.push(FieldError::new("uuid", "already exists"));
                }
                rows.next_id
            }
        };

        if !errors.is_empty() {
            return Err(StoreError::Validation(errors));
        }

        let mut stored = record.clone();
        let envelope = stored.envelope_mut();
        envelope.id = Some(id);
        envelope.orgc = None;
        envelope.sharing_group = None;
        if envelope.created.is_none() {
            envelope.created = Some(envelope.modified);
        }

        if record.envelope().id.is_none() {
            rows.next_id += 1;
        }
        rows.by_uuid.insert(key, id);
        rows.rows.insert(id, stored.clone());
        tracing::trace!(kind = %record.kind(), uuid = %record.uuid(), id, "record stored");
        Ok(stored)
    }

    fn list(&self, kind: RecordKind) -> StoreResult<Vec<AnalystData>> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows
            .rows
            .values()
            .filter(|r| r.kind() == kind)
            .cloned()
            .collect())
    }

    fn children_of(
        &self,
        target: TargetType,
        target_uuid: &Uuid,
    ) -> StoreResult<Vec<AnalystData>> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows
            .rows
            .values()
            .filter(|r| {
                let env = r.envelope();
                env.object_type == target && env.object_uuid == *target_uuid
            })
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &self.len())
            .finish()
    }
}
