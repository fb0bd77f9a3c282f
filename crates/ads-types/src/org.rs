use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An organization, as embedded in records (`Orgc`) and held by the directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    /// `true` if the organization is hosted on this instance.
    #[serde(default)]
    pub local: bool,
}

impl Organisation {
    pub fn new(uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            local: false,
        }
    }

    pub fn local(uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            local: true,
            ..Self::new(uuid, name)
        }
    }
}
