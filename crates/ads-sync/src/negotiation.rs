use ads_gate::{BlocklistGuard, ConflictResolver};
use ads_store::{Blocklist, RecordStore, StoreResult};
use ads_types::{Manifest, RecordKind};
use uuid::Uuid;

/// Manifest arithmetic for the push handshake and the pull diff.
pub struct NegotiationEngine;

impl NegotiationEngine {
    /// Entries of `remote` we should fetch: unknown locally, or strictly
    /// newer than our copy.
    pub fn compute_wants(remote: &Manifest, local: &Manifest) -> Manifest {
        let mut wants = remote.clone();
        wants.retain(|kind, uuid, remote_modified| match local.get(kind, uuid) {
            None => true,
            Some(local_modified) => local_modified < *remote_modified,
        });
        wants
    }

    /// Our `{uuid: modified}` for the uuids named in `remote`.
    pub fn local_view(store: &dyn RecordStore, remote: &Manifest) -> StoreResult<Manifest> {
        let mut local = Manifest::new();
        for kind in remote.kinds() {
            for (uuid, modified) in store.modified_map(kind, &remote.uuids(kind))? {
                local.insert(kind, uuid, modified);
            }
        }
        Ok(local)
    }

    /// Answer a push proposal with the subset we would accept.
    ///
    /// Drops blocklisted uuids, uuids whose local copy is unlocked, and
    /// uuids whose local copy is at least as new as the candidate.
    pub fn answer_proposal(
        store: &dyn RecordStore,
        blocklist: &dyn Blocklist,
        proposal: &Manifest,
    ) -> StoreResult<Manifest> {
        // Creator org is unknown at this point; org blocklisting is applied on upload.
        let guard = BlocklistGuard::new(blocklist, false);
        let mut accepted = Manifest::new();
        for kind in proposal.kinds() {
            for (uuid, modified) in proposal.entries(kind) {
                if guard.is_blocked(&uuid)? {
                    continue;
                }
                let local = store.find_by_uuid(kind, &uuid)?;
                if ConflictResolver::accepts_proposal(local.as_ref().map(|r| r.envelope()), modified) {
                    accepted.insert(kind, uuid, modified);
                }
            }
        }
        Ok(accepted)
    }

    /// Split the wanted uuids of one kind into request-sized chunks.
    pub fn chunks(wants: &Manifest, kind: RecordKind, chunk_size: usize) -> Vec<Vec<Uuid>> {
        wants
            .uuids(kind)
            .chunks(chunk_size.max(1))
            .map(<[Uuid]>::to_vec)
            .collect()
    }
}
