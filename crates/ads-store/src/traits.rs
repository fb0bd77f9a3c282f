use std::collections::{BTreeMap, BTreeSet};

use ads_types::{AnalystData, RecordKind, TargetType, Timestamp};
use uuid::Uuid;

use crate::error::StoreResult;

/// Persistence collaborator for analyst data records.
///
/// All implementations must satisfy these invariants:
/// - `uuid` is unique per record kind.
/// - `upsert` is all-or-nothing: on `Err` the store is unchanged.
/// - A record without `id` is created; a record with `id` replaces that row.
/// - Validation failures are reported as `StoreError::Validation` carrying
///   every failing field, never just the first.
/// - Timestamps are stored as given. The store never rewrites `modified`.
pub trait RecordStore: Send + Sync {
    /// Look up a record by uuid.
    ///
    /// Returns `Ok(None)` if no record of that kind has the uuid.
    fn find_by_uuid(&self, kind: RecordKind, uuid: &Uuid) -> StoreResult<Option<AnalystData>>;

    /// Create or update a record and return the stored version (with `id`).
    fn upsert(&self, record: &AnalystData) -> StoreResult<AnalystData>;

    /// Every record of one kind, in row order.
    fn list(&self, kind: RecordKind) -> StoreResult<Vec<AnalystData>>;

    /// Records attached to the given object (`object_type`, `object_uuid`).
    fn children_of(&self, target: TargetType, target_uuid: &Uuid)
        -> StoreResult<Vec<AnalystData>>;

    /// `{uuid: modified}` for the subset of `uuids` present locally.
    ///
    /// Default implementation calls `find_by_uuid()` for each uuid. Backends
    /// may override with a single query.
    fn modified_map(
        &self,
        kind: RecordKind,
        uuids: &[Uuid],
    ) -> StoreResult<BTreeMap<Uuid, Timestamp>> {
        let mut map = BTreeMap::new();
        for uuid in uuids {
            if let Some(record) = self.find_by_uuid(kind, uuid)? {
                map.insert(*uuid, record.modified());
            }
        }
        Ok(map)
    }

    /// Distinct relationship types currently stored, sorted.
    fn relationship_types(&self) -> StoreResult<Vec<String>> {
        let types: BTreeSet<String> = self
            .list(RecordKind::Relationship)?
            .iter()
            .filter_map(|r| r.relationship_type().map(str::to_string))
            .collect();
        Ok(types.into_iter().collect())
    }
}
