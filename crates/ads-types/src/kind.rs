use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The three kinds of analyst data.
///
/// Serialized by name (`"Note"`, `"Opinion"`, `"Relationship"`), which is also
/// the key used in manifests and in the externally-tagged record encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Note,
    Opinion,
    Relationship,
}

impl RecordKind {
    /// Every kind, in sync processing order.
    pub const ALL: [RecordKind; 3] = [Self::Note, Self::Opinion, Self::Relationship];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Opinion => "Opinion",
            Self::Relationship => "Relationship",
        }
    }

    /// Kinds that may be attached as children of another record.
    pub fn is_nestable(&self) -> bool {
        matches!(self, Self::Note | Self::Opinion)
    }

    /// The target type other records use to point at a record of this kind.
    pub fn as_target(&self) -> TargetType {
        match self {
            Self::Note => TargetType::Note,
            Self::Opinion => TargetType::Opinion,
            Self::Relationship => TargetType::Relationship,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "note" => Ok(Self::Note),
            "opinion" => Ok(Self::Opinion),
            "relationship" => Ok(Self::Relationship),
            _ => Err(TypeError::UnknownKind(s.to_string())),
        }
    }
}

/// Object types a record may be attached to (`object_type`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetType {
    Attribute,
    Event,
    EventReport,
    GalaxyCluster,
    Galaxy,
    Object,
    Note,
    Opinion,
    Relationship,
    Organisation,
    SharingGroup,
}

impl TargetType {
    pub const ALL: [TargetType; 11] = [
        Self::Attribute,
        Self::Event,
        Self::EventReport,
        Self::GalaxyCluster,
        Self::Galaxy,
        Self::Object,
        Self::Note,
        Self::Opinion,
        Self::Relationship,
        Self::Organisation,
        Self::SharingGroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attribute => "Attribute",
            Self::Event => "Event",
            Self::EventReport => "EventReport",
            Self::GalaxyCluster => "GalaxyCluster",
            Self::Galaxy => "Galaxy",
            Self::Object => "Object",
            Self::Note => "Note",
            Self::Opinion => "Opinion",
            Self::Relationship => "Relationship",
            Self::Organisation => "Organisation",
            Self::SharingGroup => "SharingGroup",
        }
    }

    /// The record kind this target refers to, if it is itself analyst data.
    pub fn as_record_kind(&self) -> Option<RecordKind> {
        match self {
            Self::Note => Some(RecordKind::Note),
            Self::Opinion => Some(RecordKind::Opinion),
            Self::Relationship => Some(RecordKind::Relationship),
            _ => None,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownTarget(s.to_string()))
    }
}
