use ads_types::{AnalystData, Distribution};

use crate::error::FieldError;

/// Highest score an opinion may carry.
pub const MAX_OPINION: u8 = 100;

/// Check every field of a record and return all failures.
pub fn validate_record(record: &AnalystData) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let envelope = record.envelope();

    if envelope.uuid.is_nil() {
        errors.push(FieldError::new("uuid", "must be a non-nil uuid"));
    }
    if envelope.object_uuid.is_nil() {
        errors.push(FieldError::new("object_uuid", "must be a non-nil uuid"));
    }
    if envelope.org_uuid.is_nil() {
        errors.push(FieldError::new("org_uuid", "must reference an organisation"));
    }
    match (envelope.distribution, envelope.sharing_group_id) {
        (Distribution::SharingGroup, None) => errors.push(FieldError::new(
            "sharing_group_id",
            "required when distribution is 4",
        )),
        (d, Some(_)) if !d.is_sharing_group() => errors.push(FieldError::new(
            "sharing_group_id",
            "must be empty unless distribution is 4",
        )),
        _ => {}
    }

    match record {
        AnalystData::Note(note) => {
            if note.note.trim().is_empty() {
                errors.push(FieldError::new("note", "must not be empty"));
            }
        }
        AnalystData::Opinion(opinion) => {
            if opinion.opinion > MAX_OPINION {
                errors.push(FieldError::new(
                    "opinion",
                    format!("must be between 0 and {MAX_OPINION}"),
                ));
            }
        }
        AnalystData::Relationship(rel) => {
            if rel.relationship_type.trim().is_empty() {
                errors.push(FieldError::new("relationship_type", "must not be empty"));
            }
            if rel.related_object_uuid.is_nil() {
                errors.push(FieldError::new("related_object_uuid", "must be a non-nil uuid"));
            }
        }
    }

    errors
}
