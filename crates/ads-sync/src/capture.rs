use ads_gate::{BlocklistGuard, ConflictResolver, Decision, WriterContext};
use ads_store::{validate_record, Blocklist, Directory, FieldError, RecordStore, StoreError};
use ads_types::{AnalystData, Envelope, Identity, Organisation};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::types::{CaptureOrigin, CaptureResult};

/// Turns one inbound record into at most one local write.
///
/// Steps, in order: holding organization, creator organization, record and
/// organization blocklists, local lookup, conflict decision, field
/// validation, sharing-group and creator capture, and finally the upsert.
/// Every failure is reported in the returned [`CaptureResult`]. Ignored and
/// rejected records leave both the store and the directory untouched.
pub struct CaptureEngine<'a> {
    store: &'a dyn RecordStore,
    directory: &'a dyn Directory,
    blocklist: &'a dyn Blocklist,
    config: &'a SyncConfig,
}

impl<'a> CaptureEngine<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        directory: &'a dyn Directory,
        blocklist: &'a dyn Blocklist,
        config: &'a SyncConfig,
    ) -> Self {
        Self {
            store,
            directory,
            blocklist,
            config,
        }
    }

    /// Decode and capture a raw payload.
    pub fn capture_value(
        &self,
        identity: &Identity,
        payload: serde_json::Value,
        origin: CaptureOrigin<'_>,
    ) -> CaptureResult {
        match AnalystData::from_value(payload) {
            Ok(record) => self.capture(identity, record, origin),
            Err(e) => {
                warn!(error = %e, "rejecting undecodable analyst data");
                CaptureResult::failed(e.to_string())
            }
        }
    }

    pub fn capture(
        &self,
        identity: &Identity,
        record: AnalystData,
        origin: CaptureOrigin<'_>,
    ) -> CaptureResult {
        let kind = record.kind();
        let uuid = record.uuid();
        match self.try_capture(identity, record, origin) {
            Ok(result) => {
                debug!(%kind, %uuid, imported = result.imported, ignored = result.ignored, "captured analyst data");
                result
            }
            Err(e) => {
                warn!(%kind, %uuid, error = %e, "could not capture analyst data");
                CaptureResult::failed(e.to_string())
            }
        }
    }

    fn try_capture(
        &self,
        identity: &Identity,
        mut record: AnalystData,
        origin: CaptureOrigin<'_>,
    ) -> SyncResult<CaptureResult> {
        let kind = record.kind();
        let uuid = record.uuid();
        let env = record.envelope_mut();

        env.org_uuid = match origin.pushing_org {
            Some(org) if origin.from_pull => org,
            _ => identity.org_uuid,
        };
        let (creator, embedded_creator) = Self::resolve_creator(identity, env);

        let guard = BlocklistGuard::new(self.blocklist, self.config.org_blocklisting);
        if let Some(reason) = guard.check(&uuid, &creator)? {
            debug!(%kind, %uuid, %reason, "analyst data filtered by blocklist");
            return Ok(CaptureResult::ignored(reason.to_string()));
        }

        if !env.distribution.is_sharing_group() {
            env.sharing_group_id = None;
            env.sharing_group = None;
        }

        let existing = self.store.find_by_uuid(kind, &uuid)?;
        let writer = WriterContext {
            sync_privileged: identity.is_sync_privileged(),
            peer_internal: origin.peer_internal(),
        };
        let decision = ConflictResolver::accept(
            existing.as_ref().map(AnalystData::envelope),
            record.envelope(),
            writer,
        );
        match decision {
            Decision::CreateNew => record.envelope_mut().id = None,
            Decision::ReplaceExisting => {
                record.envelope_mut().id = existing.and_then(|e| e.envelope().id);
            }
            Decision::RejectLocked => {
                return Ok(CaptureResult::failed(format!(
                    "Blocked an edit to analyst data ({uuid}) that was created locally. This can happen if a synchronised analyst data was edited locally."
                )))
            }
            Decision::RejectStale => {
                return Ok(CaptureResult::ignored(format!(
                    "Remote version is not newer than local one for analyst data ({uuid})"
                )))
            }
        }

        // Directory writes below must only happen for records that will be stored.
        let errors = Self::field_errors(&record);
        if !errors.is_empty() {
            return Ok(CaptureResult::failed_with(errors.iter().map(ToString::to_string)));
        }

        let env = record.envelope_mut();
        if env.distribution.is_sharing_group() {
            match self.resolve_sharing_group(identity, env)? {
                Some(id) => env.sharing_group_id = Some(id),
                None => {
                    return Ok(CaptureResult::failed(format!(
                        "Sharing group could not be resolved for analyst data ({uuid})"
                    )))
                }
            }
            env.sharing_group = None;
        }
        if let Some(org) = embedded_creator {
            self.directory.capture_org(&org)?;
        }

        match self.store.upsert(&record) {
            Ok(_) => Ok(CaptureResult::imported()),
            Err(StoreError::Validation(errors)) => Ok(CaptureResult::failed_with(
                errors.iter().map(ToString::to_string),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Settle `orgc_uuid` and return it with the embedded organization, if
    /// that organization is the one kept as creator.
    ///
    /// The embedded `Orgc` wins over `orgc_uuid`, which wins over the holding
    /// org. Identities without sync or admin privilege cannot claim another
    /// organization as creator.
    fn resolve_creator(identity: &Identity, env: &mut Envelope) -> (Uuid, Option<Organisation>) {
        let creator = match env.creator_org() {
            Some(org) if org == identity.org_uuid || identity.may_act_for_other_orgs() => org,
            _ => env.org_uuid,
        };
        env.orgc_uuid = Some(creator);
        let embedded = env.orgc.take().filter(|o| o.uuid == creator);
        (creator, embedded)
    }

    /// Field errors the store would report, with an embedded sharing group
    /// standing in for the local id it will be given.
    fn field_errors(record: &AnalystData) -> Vec<FieldError> {
        let mut candidate = record.clone();
        let env = candidate.envelope_mut();
        if let (None, Some(group)) = (env.sharing_group_id, &env.sharing_group) {
            env.sharing_group_id = Some(group.id);
        }
        validate_record(&candidate)
    }

    fn resolve_sharing_group(&self, identity: &Identity, env: &Envelope) -> SyncResult<Option<u64>> {
        if let Some(group) = &env.sharing_group {
            return Ok(self.directory.capture_sharing_group(group, identity)?);
        }
        match env.sharing_group_id {
            Some(id) => Ok(self.directory.sharing_group(id)?.map(|g| g.id)),
            None => Ok(None),
        }
    }
}
