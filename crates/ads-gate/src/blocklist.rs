use std::fmt;

use ads_store::{Blocklist, StoreResult};
use uuid::Uuid;

/// Why a record was filtered out by the deny-lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockReason {
    Record(Uuid),
    Organisation(Uuid),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(_) => write!(f, "Blocked by blocklist"),
            Self::Organisation(org) => write!(f, "Organisation blocklisted ({org})"),
        }
    }
}

/// Record and organization deny-list checks.
///
/// A hit is an intentional filter, not a failure: callers report it as
/// ignored.
pub struct BlocklistGuard<'a> {
    list: &'a dyn Blocklist,
    org_blocklisting: bool,
}

impl<'a> BlocklistGuard<'a> {
    pub fn new(list: &'a dyn Blocklist, org_blocklisting: bool) -> Self {
        Self {
            list,
            org_blocklisting,
        }
    }

    pub fn is_blocked(&self, uuid: &Uuid) -> StoreResult<bool> {
        self.list.is_blocked(uuid)
    }

    /// Always `false` when organization blocklisting is disabled.
    pub fn is_org_blocked(&self, org_uuid: &Uuid) -> StoreResult<bool> {
        if !self.org_blocklisting || org_uuid.is_nil() {
            return Ok(false);
        }
        self.list.is_org_blocked(org_uuid)
    }

    /// Record check first, then the creator organization.
    pub fn check(&self, uuid: &Uuid, creator_org: &Uuid) -> StoreResult<Option<BlockReason>> {
        if self.is_blocked(uuid)? {
            tracing::debug!(%uuid, "record blocklisted");
            return Ok(Some(BlockReason::Record(*uuid)));
        }
        if self.is_org_blocked(creator_org)? {
            tracing::debug!(%uuid, org = %creator_org, "creator organisation blocklisted");
            return Ok(Some(BlockReason::Organisation(*creator_org)));
        }
        Ok(None)
    }
}
