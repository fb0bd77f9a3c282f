use std::collections::HashSet;

use ads_store::{Directory, StoreResult};
use ads_types::{Distribution, Envelope, Identity, Peer};
use uuid::Uuid;

/// Visibility predicate for one identity over the record set.
///
/// A record is visible if the identity is a site admin, or the record's
/// holding organization is the identity's, or its distribution is 1..=3, or
/// it is scoped to a sharing group the identity is authorized for.
#[derive(Clone, Debug)]
pub struct Visibility {
    unrestricted: bool,
    org_uuid: Uuid,
    sharing_groups: HashSet<u64>,
}

impl Visibility {
    /// Predicate that admits every record.
    pub fn unrestricted() -> Self {
        Self {
            unrestricted: true,
            org_uuid: Uuid::nil(),
            sharing_groups: HashSet::new(),
        }
    }

    pub fn for_identity(identity: &Identity, authorized_groups: impl IntoIterator<Item = u64>) -> Self {
        Self {
            unrestricted: identity.is_site_admin(),
            org_uuid: identity.org_uuid,
            sharing_groups: authorized_groups.into_iter().collect(),
        }
    }

    pub fn allows(&self, envelope: &Envelope) -> bool {
        if self.unrestricted || envelope.org_uuid == self.org_uuid {
            return true;
        }
        match envelope.distribution {
            d if d.is_community_wide() => true,
            Distribution::SharingGroup => envelope
                .sharing_group_id
                .is_some_and(|id| self.sharing_groups.contains(&id)),
            _ => false,
        }
    }
}

/// Entry point for visibility and edit-right checks.
pub struct AccessFilter;

impl AccessFilter {
    /// Build the visibility predicate for `identity`.
    ///
    /// Site admins see everything and skip the sharing-group lookup.
    pub fn visibility(identity: &Identity, directory: &dyn Directory) -> StoreResult<Visibility> {
        if identity.is_site_admin() {
            return Ok(Visibility::unrestricted());
        }
        let groups = directory.authorized_sharing_group_ids(identity)?;
        Ok(Visibility::for_identity(identity, groups))
    }

    /// Site admins and members of the creating organization may edit.
    pub fn can_edit(identity: &Identity, envelope: &Envelope) -> bool {
        identity.is_site_admin() || envelope.orgc_uuid == Some(identity.org_uuid)
    }
}

/// Which local records may be proposed to a specific peer.
///
/// Org-only records never leave the instance. Distribution-4 records are
/// eligible only when their sharing group lists the peer or is roaming.
#[derive(Clone, Debug)]
pub struct PushEligibility {
    groups: HashSet<u64>,
}

impl PushEligibility {
    pub fn for_peer(peer: &Peer, directory: &dyn Directory) -> StoreResult<Self> {
        let groups = directory
            .sharing_groups()?
            .into_iter()
            .filter(|g| directory.is_server_member(g, peer))
            .map(|g| g.id)
            .collect();
        Ok(Self { groups })
    }

    pub fn allows(&self, envelope: &Envelope) -> bool {
        match envelope.distribution {
            d if d.is_community_wide() => true,
            Distribution::SharingGroup => envelope
                .sharing_group_id
                .is_some_and(|id| self.groups.contains(&id)),
            _ => false,
        }
    }
}
