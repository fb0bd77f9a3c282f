use std::collections::BTreeMap;
use std::sync::RwLock;

use ads_types::{Identity, Organisation, Peer, SharingGroup};
use uuid::Uuid;

use crate::error::{poisoned, StoreResult};

/// Organization and sharing-group collaborator.
pub trait Directory: Send + Sync {
    /// Look up an organization by uuid.
    fn resolve_org(&self, uuid: &Uuid) -> StoreResult<Option<Organisation>>;

    /// Make sure an organization announced by a peer is known locally and
    /// return its uuid. Known organizations are left untouched.
    fn capture_org(&self, org: &Organisation) -> StoreResult<Uuid>;

    fn sharing_group(&self, id: u64) -> StoreResult<Option<SharingGroup>>;

    fn sharing_groups(&self) -> StoreResult<Vec<SharingGroup>>;

    /// Resolve an embedded sharing group to a local id, creating it when the
    /// identity is allowed to. Returns `Ok(None)` if it cannot be captured.
    fn capture_sharing_group(
        &self,
        group: &SharingGroup,
        identity: &Identity,
    ) -> StoreResult<Option<u64>>;

    /// Ids of the sharing groups whose records the identity may see.
    fn authorized_sharing_group_ids(&self, identity: &Identity) -> StoreResult<Vec<u64>>;

    /// `true` if records of `group` may be sent to `peer`.
    fn is_server_member(&self, group: &SharingGroup, peer: &Peer) -> bool {
        group.reaches_server(peer.id)
    }
}

#[derive(Default)]
struct Entries {
    orgs: BTreeMap<Uuid, Organisation>,
    groups: BTreeMap<u64, SharingGroup>,
}

/// In-memory directory of organizations and sharing groups.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Entries>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_org(&self, org: Organisation) -> StoreResult<()> {
        self.inner.write().map_err(poisoned)?.orgs.insert(org.uuid, org);
        Ok(())
    }

    /// Insert or replace a sharing group under its own id.
    pub fn add_sharing_group(&self, group: SharingGroup) -> StoreResult<()> {
        self.inner
            .write()
            .map_err(poisoned)?
            .groups
            .insert(group.id, group);
        Ok(())
    }
}

impl Directory for InMemoryDirectory {
    fn resolve_org(&self, uuid: &Uuid) -> StoreResult<Option<Organisation>> {
        Ok(self.inner.read().map_err(poisoned)?.orgs.get(uuid).cloned())
    }

    fn capture_org(&self, org: &Organisation) -> StoreResult<Uuid> {
        let mut entries = self.inner.write().map_err(poisoned)?;
        entries.orgs.entry(org.uuid).or_insert_with(|| Organisation {
            local: false,
            ..org.clone()
        });
        Ok(org.uuid)
    }

    fn sharing_group(&self, id: u64) -> StoreResult<Option<SharingGroup>> {
        Ok(self.inner.read().map_err(poisoned)?.groups.get(&id).cloned())
    }

    fn sharing_groups(&self) -> StoreResult<Vec<SharingGroup>> {
        Ok(self
            .inner
            .read()
            .map_err(poisoned)?
            .groups
            .values()
            .cloned()
            .collect())
    }

    fn capture_sharing_group(
        &self,
        group: &SharingGroup,
        identity: &Identity,
    ) -> StoreResult<Option<u64>> {
        let mut entries = self.inner.write().map_err(poisoned)?;
        if let Some(existing) = entries.groups.values().find(|g| g.uuid == group.uuid) {
            return Ok(Some(existing.id));
        }
        if !identity.may_act_for_other_orgs() && !group.has_org(&identity.org_uuid) {
            return Ok(None);
        }
        let id = entries.groups.keys().next_back().map_or(1, |last| last + 1);
        entries.groups.insert(
            id,
            SharingGroup {
                id,
                ..group.clone()
            },
        );
        tracing::debug!(sharing_group = %group.uuid, id, "captured sharing group");
        Ok(Some(id))
    }

    fn authorized_sharing_group_ids(&self, identity: &Identity) -> StoreResult<Vec<u64>> {
        let entries = self.inner.read().map_err(poisoned)?;
        Ok(entries
            .groups
            .values()
            .filter(|g| identity.is_site_admin() || g.has_org(&identity.org_uuid))
            .map(|g| g.id)
            .collect())
    }
}
