use ads_types::{Peer, RecordKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a record entering the capture pipeline came from.
#[derive(Clone, Copy, Debug, Default)]
pub struct CaptureOrigin<'a> {
    /// The record was fetched by our own pull.
    pub from_pull: bool,
    /// Organization of the instance the record came from. On pull the
    /// holding organization is set to it.
    pub pushing_org: Option<Uuid>,
    /// The sending peer, when known.
    pub peer: Option<&'a Peer>,
}

impl<'a> CaptureOrigin<'a> {
    /// Locally submitted record.
    pub fn local() -> Self {
        Self::default()
    }

    /// Record fetched from `peer` during a pull.
    pub fn pull(peer: &'a Peer) -> Self {
        Self {
            from_pull: true,
            pushing_org: Some(peer.org_uuid),
            peer: Some(peer),
        }
    }

    /// Record uploaded to us by a pushing peer.
    pub fn upload(peer: Option<&'a Peer>) -> Self {
        Self {
            from_pull: false,
            pushing_org: peer.map(|p| p.org_uuid),
            peer,
        }
    }

    pub fn peer_internal(&self) -> bool {
        self.peer.is_some_and(|p| p.internal)
    }
}

/// Outcome of capturing one record, or the sum over a batch.
///
/// `success` is `true` when at least one record was written. Ignored
/// records are counted separately and still leave a message in `errors`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub success: bool,
    pub imported: usize,
    pub ignored: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl CaptureResult {
    pub fn imported() -> Self {
        Self {
            success: true,
            imported: 1,
            ..Self::default()
        }
    }

    pub fn ignored(reason: impl Into<String>) -> Self {
        Self {
            ignored: 1,
            errors: vec![reason.into()],
            ..Self::default()
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::failed_with([reason.into()])
    }

    pub fn failed_with(errors: impl IntoIterator<Item = String>) -> Self {
        Self {
            failed: 1,
            errors: errors.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored > 0 && self.imported == 0 && self.failed == 0
    }

    /// Accumulate another outcome into this one.
    pub fn absorb(&mut self, other: CaptureResult) {
        self.imported += other.imported;
        self.ignored += other.ignored;
        self.failed += other.failed;
        self.errors.extend(other.errors);
        self.success = self.imported > 0;
    }
}

/// The peer's answer to an upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum UploadOutcome {
    Success,
    PermissionDenied,
    ConflictRejected(String),
}

/// A record the push could not deliver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushFailure {
    pub kind: RecordKind,
    pub uuid: Uuid,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResult {
    /// Records offered in the proposal.
    pub proposed: usize,
    /// Records the peer accepted in its answer.
    pub accepted: usize,
    /// Uuids the peer reported as successfully stored.
    pub pushed: Vec<Uuid>,
    pub failed: Vec<PushFailure>,
    /// Accepted records held back because their sharing group does not reach the peer.
    pub withheld: Vec<Uuid>,
}

impl PushResult {
    pub(crate) fn fail(&mut self, kind: RecordKind, uuid: Uuid, reason: impl Into<String>) {
        self.failed.push(PushFailure {
            kind,
            uuid,
            reason: reason.into(),
        });
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullResult {
    pub imported: usize,
    pub ignored: usize,
    pub failed: usize,
    pub chunks_requested: usize,
    pub chunks_failed: usize,
    pub errors: Vec<String>,
}

impl PullResult {
    pub(crate) fn absorb(&mut self, capture: CaptureResult) {
        self.imported += capture.imported;
        self.ignored += capture.ignored;
        self.failed += capture.failed;
        self.errors.extend(capture.errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_succeeds_once_anything_is_imported() {
        let mut batch = CaptureResult::default();
        batch.absorb(CaptureResult::ignored("Blocked by blocklist"));
        assert!(!batch.success);
        batch.absorb(CaptureResult::imported());
        assert!(batch.success);
        assert_eq!(batch.imported, 1);
        assert_eq!(batch.ignored, 1);
        assert_eq!(batch.errors, vec!["Blocked by blocklist"]);
    }

    #[test]
    fn ignored_is_distinct_from_failed() {
        let r = CaptureResult::ignored("stale");
        assert!(r.is_ignored());
        assert!(!r.success);
        assert!(!CaptureResult::failed("bad").is_ignored());
    }

    #[test]
    fn upload_outcome_wire_shape() {
        let json = serde_json::to_value(UploadOutcome::ConflictRejected("stale".into())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "conflict_rejected", "reason": "stale"}));
        let ok: UploadOutcome = serde_json::from_value(serde_json::json!({"status": "success"})).unwrap();
        assert_eq!(ok, UploadOutcome::Success);
    }
}
