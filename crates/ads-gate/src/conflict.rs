use ads_types::{Envelope, Timestamp};

/// Outcome of comparing an incoming record against the local copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// No local record with that uuid.
    CreateNew,
    /// Incoming is strictly newer; overwrite the local row.
    ReplaceExisting,
    /// Incoming is not newer than the local copy.
    RejectStale,
    /// Local copy was authored here and has not been synchronized yet.
    RejectLocked,
}

/// Who is attempting the write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriterContext {
    /// The acting identity holds synchronization privilege.
    pub sync_privileged: bool,
    /// The record arrived from a peer marked `internal`.
    pub peer_internal: bool,
}

/// Last-writer-wins merge by wall-clock `modified`.
///
/// Ties go to the local copy. Clock skew between peers is not corrected.
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn accept(local: Option<&Envelope>, incoming: &Envelope, writer: WriterContext) -> Decision {
        let Some(local) = local else {
            return Decision::CreateNew;
        };
        if !local.locked && !writer.sync_privileged && !writer.peer_internal {
            return Decision::RejectLocked;
        }
        if incoming.modified > local.modified {
            Decision::ReplaceExisting
        } else {
            Decision::RejectStale
        }
    }

    /// Peer-side answer to a push proposal: would a record announced with
    /// `candidate_modified` be accepted here?
    ///
    /// Unknown records are wanted. Known records are wanted only when the
    /// local copy is locked and strictly older.
    pub fn accepts_proposal(local: Option<&Envelope>, candidate_modified: Timestamp) -> bool {
        match local {
            None => true,
            Some(local) => local.locked && local.modified < candidate_modified,
        }
    }
}
