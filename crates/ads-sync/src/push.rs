use ads_gate::{AccessFilter, PushEligibility};
use ads_store::{Directory, RecordStore};
use ads_types::{AnalystData, Identity, Manifest, Peer, RecordKind};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::transport::PeerTransport;
use crate::types::{PushResult, UploadOutcome};

const UPLOAD_NOT_PERMITTED: &str = "The remote user does not have the permission to manipulate analyst data, the upload of the analyst data has been blocked.";

/// Propose-then-upload push to one peer.
///
/// Only uuids and modification times travel in the proposal; full records
/// are uploaded solely for entries the peer accepted. Per-record failures
/// are recorded and the push continues.
pub struct PushOrchestrator<'a> {
    store: &'a dyn RecordStore,
    directory: &'a dyn Directory,
    config: &'a SyncConfig,
}

impl<'a> PushOrchestrator<'a> {
    pub fn new(store: &'a dyn RecordStore, directory: &'a dyn Directory, config: &'a SyncConfig) -> Self {
        Self {
            store,
            directory,
            config,
        }
    }

    pub async fn push(&self, identity: &Identity, transport: &dyn PeerTransport) -> PushResult {
        let peer = transport.peer();
        if !peer.accepts_analyst_data_push() {
            debug!(peer = peer.id, "analyst data push disabled for peer");
            return PushResult::default();
        }

        let candidates = match self.candidates(identity, peer) {
            Ok(c) => c,
            Err(e) => {
                warn!(peer = peer.id, error = %e, "could not collect analyst data to push");
                return PushResult::default();
            }
        };
        if candidates.is_empty() {
            debug!(peer = peer.id, "no analyst data eligible for push");
            return PushResult::default();
        }

        let proposal = Manifest::from_records(&candidates);
        let mut result = PushResult {
            proposed: proposal.len(),
            ..PushResult::default()
        };
        info!(peer = peer.id, proposed = result.proposed, "proposing analyst data to peer");

        let accepted = match transport.propose_for_push(&proposal).await {
            Ok(m) => m,
            Err(e) => {
                warn!(peer = peer.id, error = %e, "could not get eligible analyst data from peer");
                return result;
            }
        };

        for record in candidates
            .into_iter()
            .filter(|r| accepted.contains(r.kind(), &r.uuid()))
        {
            result.accepted += 1;
            self.upload(transport, record, &mut result).await;
        }

        info!(
            peer = peer.id,
            accepted = result.accepted,
            pushed = result.pushed.len(),
            failed = result.failed.len(),
            withheld = result.withheld.len(),
            "analyst data push finished"
        );
        result
    }

    /// Records visible to `identity` and eligible for `peer`.
    fn candidates(&self, identity: &Identity, peer: &Peer) -> SyncResult<Vec<AnalystData>> {
        let visibility = AccessFilter::visibility(identity, self.directory)?;
        let eligibility = PushEligibility::for_peer(peer, self.directory)?;
        let mut out = Vec::new();
        for kind in RecordKind::ALL {
            out.extend(
                self.store
                    .list(kind)?
                    .into_iter()
                    .filter(|r| visibility.allows(r.envelope()) && eligibility.allows(r.envelope())),
            );
        }
        Ok(out)
    }

    async fn upload(&self, transport: &dyn PeerTransport, record: AnalystData, result: &mut PushResult) {
        let peer = transport.peer();
        let kind = record.kind();
        let uuid = record.uuid();

        let prepared = match self.prepare(record, peer) {
            Ok(Some(r)) => r,
            Ok(None) => {
                debug!(peer = peer.id, %kind, %uuid, "sharing group does not reach peer, withholding");
                result.withheld.push(uuid);
                return;
            }
            Err(e) => {
                warn!(peer = peer.id, %kind, %uuid, error = %e, "could not prepare analyst data for push");
                result.fail(kind, uuid, e.to_string());
                return;
            }
        };

        if !peer.can_upload_analyst_data() {
            warn!(peer = peer.id, %kind, %uuid, "remote user lacks analyst data permission");
            result.fail(kind, uuid, UPLOAD_NOT_PERMITTED);
            return;
        }

        match transport.upload_record(&prepared).await {
            Ok(UploadOutcome::Success) => result.pushed.push(uuid),
            Ok(UploadOutcome::PermissionDenied) => {
                warn!(peer = peer.id, %kind, %uuid, "peer refused analyst data upload");
                result.fail(kind, uuid, "Permission denied by peer");
            }
            Ok(UploadOutcome::ConflictRejected(reason)) => {
                debug!(peer = peer.id, %kind, %uuid, %reason, "peer rejected analyst data");
                result.fail(kind, uuid, reason);
            }
            Err(e) => {
                warn!(peer = peer.id, %kind, %uuid, error = %e, "could not push analyst data");
                result.fail(kind, uuid, e.to_string());
            }
        }
    }

    /// Shape a record for upload to `peer`.
    ///
    /// Strips the local row id, embeds the creator organization and the
    /// sharing group (announcing this instance in its server list), marks
    /// the record locked and narrows connected-communities distribution for
    /// non-internal peers. Returns `Ok(None)` if the record is scoped to a
    /// sharing group that does not reach the peer.
    pub fn prepare(&self, mut record: AnalystData, peer: &Peer) -> SyncResult<Option<AnalystData>> {
        let env = record.envelope_mut();
        if env.distribution.is_sharing_group() {
            let group = match env.sharing_group_id {
                Some(id) => self.directory.sharing_group(id)?,
                None => None,
            };
            let Some(mut group) = group.filter(|g| self.directory.is_server_member(g, peer)) else {
                return Ok(None);
            };
            group.announce_local(&self.config.announce_base_url);
            env.sharing_group = Some(group);
        } else {
            env.sharing_group = None;
        }
        env.id = None;
        if let Some(orgc) = env.orgc_uuid {
            env.orgc = self.directory.resolve_org(&orgc)?;
        }
        env.locked = true;
        if !peer.internal {
            env.distribution = env.distribution.narrowed();
        }
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{note, MockTransport, ORG_A, ORG_B};
    use ads_store::InMemoryDirectory;
    use ads_types::{Distribution, Organisation, SharingGroup, SharingGroupServer, LOCAL_SERVER_ID};
    use uuid::Uuid;

    fn peer() -> Peer {
        Peer::new(7, "https://peer-b", ORG_B)
    }

    #[test]
    fn prepare_shapes_record() {
        let dir = InMemoryDirectory::new();
        dir.add_org(Organisation::local(ORG_A, "A")).unwrap();
        let store = ads_store::InMemoryRecordStore::new();
        let config = SyncConfig::default();
        let push = PushOrchestrator::new(&store, &dir, &config);

        let mut n = note(1, 10);
        n.envelope_mut().id = Some(12);
        n.envelope_mut().distribution = Distribution::ConnectedCommunities;
        let out = push.prepare(n, &peer()).unwrap().unwrap();
        let env = out.envelope();
        assert_eq!(env.id, None);
        assert!(env.locked);
        assert_eq!(env.distribution, Distribution::Community);
        assert_eq!(env.orgc.as_ref().map(|o| o.name.as_str()), Some("A"));
    }

    #[test]
    fn prepare_keeps_distribution_for_internal_peer() {
        let dir = InMemoryDirectory::new();
        let store = ads_store::InMemoryRecordStore::new();
        let config = SyncConfig::default();
        let push = PushOrchestrator::new(&store, &dir, &config);
        let mut internal = peer();
        internal.internal = true;
        let mut n = note(1, 10);
        n.envelope_mut().distribution = Distribution::ConnectedCommunities;
        let out = push.prepare(n, &internal).unwrap().unwrap();
        assert_eq!(out.envelope().distribution, Distribution::ConnectedCommunities);
    }

    #[test]
    fn prepare_embeds_group_and_announces_self() {
        let dir = InMemoryDirectory::new();
        let mut group = SharingGroup::new(3, Uuid::from_u128(0x5), "g");
        group.servers.push(SharingGroupServer::remote(7));
        dir.add_sharing_group(group).unwrap();
        let store = ads_store::InMemoryRecordStore::new();
        let config = SyncConfig { announce_base_url: "https://a.example".into(), ..Default::default() };
        let push = PushOrchestrator::new(&store, &dir, &config);

        let mut n = note(1, 10);
        n.envelope_mut().distribution = Distribution::SharingGroup;
        n.envelope_mut().sharing_group_id = Some(3);
        let out = push.prepare(n, &peer()).unwrap().unwrap();
        let embedded = out.envelope().sharing_group.as_ref().unwrap();
        let me = embedded.servers.iter().find(|s| s.server_id == LOCAL_SERVER_ID).unwrap();
        assert_eq!(me.url.as_deref(), Some("https://a.example"));
    }

    #[test]
    fn prepare_withholds_unreachable_group() {
        let dir = InMemoryDirectory::new();
        dir.add_sharing_group(SharingGroup::new(3, Uuid::from_u128(0x5), "closed")).unwrap();
        let store = ads_store::InMemoryRecordStore::new();
        let config = SyncConfig::default();
        let push = PushOrchestrator::new(&store, &dir, &config);
        let mut n = note(1, 10);
        n.envelope_mut().distribution = Distribution::SharingGroup;
        n.envelope_mut().sharing_group_id = Some(3);
        assert!(push.prepare(n, &peer()).unwrap().is_none());
    }

    #[tokio::test]
    async fn only_accepted_records_are_uploaded() {
        let store = ads_store::InMemoryRecordStore::new();
        for u in 1..=3 {
            store.upsert(&note(u, 10)).unwrap();
        }
        let dir = InMemoryDirectory::new();
        let config = SyncConfig::default();
        let transport = MockTransport::new(peer()).accepting([Uuid::from_u128(1), Uuid::from_u128(3)]);

        let admin = Identity::site_admin(1, "admin@a", ORG_A);
        let result = PushOrchestrator::new(&store, &dir, &config).push(&admin, &transport).await;
        assert_eq!(result.proposed, 3);
        assert_eq!(transport.proposals()[0].len(), 3);
        assert_eq!(result.accepted, 2);
        assert_eq!(result.pushed, vec![Uuid::from_u128(1), Uuid::from_u128(3)]);
        assert!(!result.pushed.contains(&Uuid::from_u128(2)));
        let uploads = transport.uploads();
        assert_eq!(uploads.len(), 2);
        assert!(uploads.iter().all(|r| r.envelope().locked && r.envelope().id.is_none()));
    }

    #[tokio::test]
    async fn org_only_records_are_never_proposed() {
        let store = ads_store::InMemoryRecordStore::new();
        let mut private = note(1, 10);
        private.envelope_mut().distribution = Distribution::OrgOnly;
        store.upsert(&private).unwrap();
        let dir = InMemoryDirectory::new();
        let config = SyncConfig::default();
        let transport = MockTransport::new(peer()).accepting_all();

        let admin = Identity::site_admin(1, "admin@a", ORG_A);
        let result = PushOrchestrator::new(&store, &dir, &config).push(&admin, &transport).await;
        assert_eq!(result.proposed, 0);
        assert!(transport.proposals().is_empty());
    }

    #[tokio::test]
    async fn missing_remote_permission_fails_each_upload() {
        let store = ads_store::InMemoryRecordStore::new();
        store.upsert(&note(1, 10)).unwrap();
        let dir = InMemoryDirectory::new();
        let config = SyncConfig::default();
        let mut p = peer();
        p.capabilities.analyst_data = false;
        let transport = MockTransport::new(p).accepting_all();

        let admin = Identity::site_admin(1, "admin@a", ORG_A);
        let result = PushOrchestrator::new(&store, &dir, &config).push(&admin, &transport).await;
        assert!(result.pushed.is_empty());
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].reason, UPLOAD_NOT_PERMITTED);
        assert!(transport.uploads().is_empty());
    }

    #[tokio::test]
    async fn upload_errors_do_not_stop_the_push() {
        let store = ads_store::InMemoryRecordStore::new();
        for u in 1..=3 {
            store.upsert(&note(u, 10)).unwrap();
        }
        let dir = InMemoryDirectory::new();
        let config = SyncConfig::default();
        let transport = MockTransport::new(peer())
            .accepting_all()
            .failing_upload(Uuid::from_u128(2));

        let admin = Identity::site_admin(1, "admin@a", ORG_A);
        let result = PushOrchestrator::new(&store, &dir, &config).push(&admin, &transport).await;
        assert_eq!(result.pushed, vec![Uuid::from_u128(1), Uuid::from_u128(3)]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].uuid, Uuid::from_u128(2));
    }

    #[tokio::test]
    async fn disabled_peer_is_skipped() {
        let store = ads_store::InMemoryRecordStore::new();
        store.upsert(&note(1, 10)).unwrap();
        let dir = InMemoryDirectory::new();
        let config = SyncConfig::default();
        let mut p = peer();
        p.push_analyst_data = false;
        let transport = MockTransport::new(p).accepting_all();
        let admin = Identity::site_admin(1, "admin@a", ORG_A);
        let result = PushOrchestrator::new(&store, &dir, &config).push(&admin, &transport).await;
        assert_eq!(result, PushResult::default());
    }
}
