//! Clip document model.
//!
//! Clip documents are schemaless: besides the `id`, every field is kept
//! verbatim so a load/save cycle never drops data the audit does not know
//! about. Time reads go through the normalization adapter in core.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use testimony_core::clip_normalize::{
    document_episode, normalize_clip_document, END_FIELD, START_FIELD,
};
use testimony_core::clip_time::ClipTimeRecord;
use testimony_core::types::{ClipId, Seconds};

use super::review::{ClipReview, REVIEW_FIELD};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// One stored clip document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipDocument {
    pub id: ClipId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ClipDocument {
    pub fn new(id: impl Into<ClipId>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Normalized time record for validation.
    pub fn time_record(&self) -> ClipTimeRecord {
        normalize_clip_document(&self.id, &self.fields)
    }

    pub fn episode(&self) -> Option<String> {
        document_episode(&self.fields)
    }

    /// The review stamp, if one is present and well-formed.
    pub fn review(&self) -> Option<ClipReview> {
        self.fields
            .get(REVIEW_FIELD)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Whether the clip carries a stamp that excludes it from audits.
    pub fn is_resolved(&self) -> bool {
        self.review()
            .map(|review| review.status.is_resolved())
            .unwrap_or(false)
    }

    /// Write times into the canonical fields. Legacy aliases are left in
    /// place; the canonical names take precedence on the next read.
    pub fn set_times(&mut self, start: Seconds, end: Seconds) {
        self.fields.insert(START_FIELD.to_string(), Value::from(start));
        self.fields.insert(END_FIELD.to_string(), Value::from(end));
    }

    /// Put back pre-review times. A `None` removes the canonical field so
    /// the document reads as it did before the edit.
    pub fn restore_times(&mut self, start: Option<Seconds>, end: Option<Seconds>) {
        for (field, value) in [(START_FIELD, start), (END_FIELD, end)] {
            match value {
                Some(v) => {
                    self.fields.insert(field.to_string(), Value::from(v));
                }
                None => {
                    self.fields.remove(field);
                }
            }
        }
    }

    pub fn set_review(&mut self, review: &ClipReview) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(review)?;
        self.fields.insert(REVIEW_FIELD.to_string(), value);
        Ok(())
    }

    /// Remove the review stamp, returning it if it was present.
    pub fn clear_review(&mut self) -> Option<ClipReview> {
        let removed = self.review();
        self.fields.remove(REVIEW_FIELD);
        removed
    }
}
