use std::collections::HashSet;
use std::sync::RwLock;

use uuid::Uuid;

use crate::error::{poisoned, StoreResult};

/// Deny-lists of record uuids and organization uuids.
pub trait Blocklist: Send + Sync {
    fn is_blocked(&self, uuid: &Uuid) -> StoreResult<bool>;

    fn is_org_blocked(&self, org_uuid: &Uuid) -> StoreResult<bool>;
}

/// In-memory blocklist.
#[derive(Debug, Default)]
pub struct InMemoryBlocklist {
    records: RwLock<HashSet<Uuid>>,
    orgs: RwLock<HashSet<Uuid>>,
}

impl InMemoryBlocklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, uuid: Uuid) -> StoreResult<()> {
        self.records.write().map_err(poisoned)?.insert(uuid);
        Ok(())
    }

    pub fn block_org(&self, org_uuid: Uuid) -> StoreResult<()> {
        self.orgs.write().map_err(poisoned)?.insert(org_uuid);
        Ok(())
    }

    /// Returns `true` if the uuid was blocked.
    pub fn unblock(&self, uuid: &Uuid) -> StoreResult<bool> {
        Ok(self.records.write().map_err(poisoned)?.remove(uuid))
    }
}

impl Blocklist for InMemoryBlocklist {
    fn is_blocked(&self, uuid: &Uuid) -> StoreResult<bool> {
        Ok(self.records.read().map_err(poisoned)?.contains(uuid))
    }

    fn is_org_blocked(&self, org_uuid: &Uuid) -> StoreResult<bool> {
        Ok(self.orgs.read().map_err(poisoned)?.contains(org_uuid))
    }
}
