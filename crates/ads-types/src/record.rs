use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::distribution::Distribution;
use crate::error::TypeError;
use crate::kind::{RecordKind, TargetType};
use crate::org::Organisation;
use crate::sharing_group::SharingGroup;
use crate::Timestamp;

/// Fields shared by every analyst data record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Storage-local row id. Never meaningful across instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Global identity of the record; the merge key.
    #[serde(default)]
    pub uuid: Uuid,
    /// Type of the object this record is attached to.
    pub object_type: TargetType,
    pub object_uuid: Uuid,
    #[serde(default)]
    pub authors: String,
    /// Organization currently holding the record.
    #[serde(default)]
    pub org_uuid: Uuid,
    /// Creating organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orgc_uuid: Option<Uuid>,
    /// Embedded creator organization, when the sender attached one.
    #[serde(default, rename = "Orgc", skip_serializing_if = "Option::is_none")]
    pub orgc: Option<Organisation>,
    #[serde(default)]
    pub distribution: Distribution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharing_group_id: Option<u64>,
    /// Embedded sharing group, when the sender attached one.
    #[serde(default, rename = "SharingGroup", skip_serializing_if = "Option::is_none")]
    pub sharing_group: Option<SharingGroup>,
    /// Created through synchronization; the authoritative copy lives elsewhere.
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,
    pub modified: Timestamp,
}

impl Envelope {
    pub fn new(object_type: TargetType, object_uuid: Uuid, modified: Timestamp) -> Self {
        Self {
            id: None,
            uuid: Uuid::nil(),
            object_type,
            object_uuid,
            authors: String::new(),
            org_uuid: Uuid::nil(),
            orgc_uuid: None,
            orgc: None,
            distribution: Distribution::default(),
            sharing_group_id: None,
            sharing_group: None,
            locked: false,
            created: None,
            modified,
        }
    }

    /// Creator organization: the embedded `Orgc` wins over `orgc_uuid`.
    pub fn creator_org(&self) -> Option<Uuid> {
        self.orgc.as_ref().map(|o| o.uuid).or(self.orgc_uuid)
    }
}

/// Free-text note.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Scored opinion (0..=100) with an optional comment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub opinion: u8,
    #[serde(default)]
    pub comment: String,
}

/// Typed link from the target object to another addressable object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub relationship_type: String,
    pub related_object_type: TargetType,
    pub related_object_uuid: Uuid,
}

/// An analyst data record.
///
/// Externally tagged on the wire: `{"Note": {...}}`, `{"Opinion": {...}}`,
/// `{"Relationship": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnalystData {
    Note(Note),
    Opinion(Opinion),
    Relationship(Relationship),
}

impl AnalystData {
    /// Decode an inbound payload, failing if it matches none of the kinds.
    pub fn from_value(value: serde_json::Value) -> Result<Self, TypeError> {
        serde_json::from_value(value).map_err(|e| TypeError::InvalidRecord(e.to_string()))
    }

    pub fn to_value(&self) -> serde_json::Value {
        // Serialization of these types cannot fail: all map keys are strings.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Note(_) => RecordKind::Note,
            Self::Opinion(_) => RecordKind::Opinion,
            Self::Relationship(_) => RecordKind::Relationship,
        }
    }

    pub fn envelope(&self) -> &Envelope {
        match self {
            Self::Note(n) => &n.envelope,
            Self::Opinion(o) => &o.envelope,
            Self::Relationship(r) => &r.envelope,
        }
    }

    pub fn envelope_mut(&mut self) -> &mut Envelope {
        match self {
            Self::Note(n) => &mut n.envelope,
            Self::Opinion(o) => &mut o.envelope,
            Self::Relationship(r) => &mut r.envelope,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.envelope().uuid
    }

    pub fn modified(&self) -> Timestamp {
        self.envelope().modified
    }

    pub fn relationship_type(&self) -> Option<&str> {
        match self {
            Self::Relationship(r) => Some(r.relationship_type.as_str()),
            _ => None,
        }
    }
}

impl From<Note> for AnalystData {
    fn from(value: Note) -> Self {
        Self::Note(value)
    }
}

impl From<Opinion> for AnalystData {
    fn from(value: Opinion) -> Self {
        Self::Opinion(value)
    }
}

impl From<Relationship> for AnalystData {
    fn from(value: Relationship) -> Self {
        Self::Relationship(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn note_payload() -> serde_json::Value {
        json!({
            "Note": {
                "uuid": "8d4e3c57-1f1e-4b8a-9a3f-1b2c3d4e5f60",
                "object_type": "Event",
                "object_uuid": "0b7c1d22-5c4e-4d1a-8f5b-aaaaaaaaaaaa",
                "distribution": "2",
                "modified": "2024-01-01T00:00:00Z",
                "note": "seen in the wild"
            }
        })
    }

    #[test]
    fn decodes_externally_tagged_note() {
        let record = AnalystData::from_value(note_payload()).unwrap();
        assert_eq!(record.kind(), RecordKind::Note);
        assert_eq!(record.envelope().distribution, Distribution::ConnectedCommunities);
        assert!(!record.envelope().locked);
        assert_eq!(record.envelope().object_type, TargetType::Event);
    }

    #[test]
    fn unknown_shape_is_invalid() {
        let err = AnalystData::from_value(json!({"Event": {"uuid": "x"}})).unwrap_err();
        assert!(matches!(err, TypeError::InvalidRecord(_)));
    }

    #[test]
    fn creator_org_prefers_embedded() {
        let mut record = AnalystData::from_value(note_payload()).unwrap();
        let claimed = Uuid::new_v4();
        let embedded = Uuid::new_v4();
        record.envelope_mut().orgc_uuid = Some(claimed);
        assert_eq!(record.envelope().creator_org(), Some(claimed));
        record.envelope_mut().orgc = Some(Organisation::new(embedded, "ACME"));
        assert_eq!(record.envelope().creator_org(), Some(embedded));
    }

    #[test]
    fn relationship_exposes_type() {
        let payload = json!({
            "Relationship": {
                "uuid": "8d4e3c57-1f1e-4b8a-9a3f-1b2c3d4e5f61",
                "object_type": "Attribute",
                "object_uuid": "0b7c1d22-5c4e-4d1a-8f5b-aaaaaaaaaaab",
                "modified": "2024-01-01T00:00:00Z",
                "relationship_type": "derived-from",
                "related_object_type": "Event",
                "related_object_uuid": "0b7c1d22-5c4e-4d1a-8f5b-aaaaaaaaaaac"
            }
        });
        let record = AnalystData::from_value(payload).unwrap();
        assert_eq!(record.relationship_type(), Some("derived-from"));
        assert_eq!(record.envelope().distribution, Distribution::Community);
    }

    #[test]
    fn id_is_not_serialized_when_absent() {
        let record = AnalystData::from_value(note_payload()).unwrap();
        let value = record.to_value();
        assert!(value["Note"].get("id").is_none());
        assert_eq!(value["Note"]["distribution"], json!(2));
    }
}
