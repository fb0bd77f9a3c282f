use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Privilege flags attached to a user's role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub site_admin: bool,
    /// Synchronization privilege: may write on behalf of other organizations.
    #[serde(default)]
    pub sync: bool,
}

/// The acting user. Passed explicitly to every operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: u64,
    #[serde(default)]
    pub email: String,
    pub org_uuid: Uuid,
    #[serde(default)]
    pub role: Role,
}

impl Identity {
    pub fn user(user_id: u64, email: impl Into<String>, org_uuid: Uuid) -> Self {
        Self {
            user_id,
            email: email.into(),
            org_uuid,
            role: Role::default(),
        }
    }

    pub fn sync_user(user_id: u64, email: impl Into<String>, org_uuid: Uuid) -> Self {
        Self {
            role: Role {
                site_admin: false,
                sync: true,
            },
            ..Self::user(user_id, email, org_uuid)
        }
    }

    pub fn site_admin(user_id: u64, email: impl Into<String>, org_uuid: Uuid) -> Self {
        Self {
            role: Role {
                site_admin: true,
                sync: false,
            },
            ..Self::user(user_id, email, org_uuid)
        }
    }

    pub fn is_site_admin(&self) -> bool {
        self.role.site_admin
    }

    pub fn is_sync_privileged(&self) -> bool {
        self.role.sync
    }

    /// May claim another organization as creator of a record.
    pub fn may_act_for_other_orgs(&self) -> bool {
        self.role.sync || self.role.site_admin
    }
}
