use ads_store::RecordStore;
use ads_types::{AnalystData, Identity, Peer, RecordKind};
use tracing::{debug, info, warn};

use crate::capture::CaptureEngine;
use crate::config::SyncConfig;
use crate::negotiation::NegotiationEngine;
use crate::transport::PeerTransport;
use crate::types::{CaptureOrigin, CaptureResult, PullResult};

/// Index-diff-fetch pull from one peer.
///
/// Fetches the peer's minimal index, keeps the entries that are unknown or
/// strictly newer than the local copy, then fetches and captures them in
/// chunks. A chunk that fails to transfer is skipped; the remaining chunks
/// still run.
pub struct PullOrchestrator<'a> {
    store: &'a dyn RecordStore,
    capture: CaptureEngine<'a>,
    config: &'a SyncConfig,
}

impl<'a> PullOrchestrator<'a> {
    pub fn new(store: &'a dyn RecordStore, capture: CaptureEngine<'a>, config: &'a SyncConfig) -> Self {
        Self {
            store,
            capture,
            config,
        }
    }

    pub async fn pull(&self, identity: &Identity, transport: &dyn PeerTransport) -> PullResult {
        let peer = transport.peer();
        let mut result = PullResult::default();
        if !peer.allows_analyst_data_pull() {
            debug!(peer = peer.id, "analyst data pull disabled for peer");
            return result;
        }

        let remote = match transport.fetch_index_minimal().await {
            Ok(m) => m,
            Err(e) => {
                warn!(peer = peer.id, error = %e, "could not fetch analyst data index from peer");
                return result;
            }
        };
        let local = match NegotiationEngine::local_view(self.store, &remote) {
            Ok(m) => m,
            Err(e) => {
                warn!(peer = peer.id, error = %e, "could not read local analyst data index");
                return result;
            }
        };
        let wants = NegotiationEngine::compute_wants(&remote, &local);
        if wants.is_empty() {
            debug!(peer = peer.id, "analyst data already up to date");
            return result;
        }
        info!(peer = peer.id, wanted = wants.len(), "pulling analyst data");

        for kind in RecordKind::ALL {
            for chunk in NegotiationEngine::chunks(&wants, kind, self.config.effective_chunk_size()) {
                result.chunks_requested += 1;
                let payloads = match transport.fetch_records(kind, &chunk).await {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(peer = peer.id, %kind, size = chunk.len(), error = %e, "could not fetch analyst data chunk, skipping");
                        result.chunks_failed += 1;
                        continue;
                    }
                };
                for payload in payloads {
                    let outcome = match AnalystData::from_value(payload) {
                        Ok(record) => self.capture.capture(
                            identity,
                            self.stamp(record, peer),
                            CaptureOrigin::pull(peer),
                        ),
                        Err(e) => {
                            warn!(peer = peer.id, %kind, error = %e, "peer sent undecodable analyst data");
                            CaptureResult::failed(e.to_string())
                        }
                    };
                    result.absorb(outcome);
                }
            }
        }

        info!(
            peer = peer.id,
            imported = result.imported,
            ignored = result.ignored,
            failed = result.failed,
            chunks_failed = result.chunks_failed,
            "analyst data pull finished"
        );
        result
    }

    /// Mark a pulled record as a synchronized copy and downgrade its
    /// distribution, unless the peer is our trusted host organization.
    pub fn stamp(&self, mut record: AnalystData, peer: &Peer) -> AnalystData {
        let env = record.envelope_mut();
        env.locked = true;
        if !self.config.trusts_as_host(peer) {
            env.distribution = env.distribution.downgraded();
        }
        record
    }
}
