//! Review stamp model and review-action DTOs.
//!
//! A review stamp is written into a clip document's `timeReview` field
//! whenever an admin resolves a time-range finding. It records who acted,
//! when, and the values that were replaced so the action can be undone.

use serde::{Deserialize, Serialize};
use testimony_core::clip_time::FindingKind;
use testimony_core::types::{Seconds, Timestamp};

/// Document field holding the review stamp.
pub const REVIEW_FIELD: &str = "timeReview";

// ---------------------------------------------------------------------------
// Review status
// ---------------------------------------------------------------------------

/// Outcome recorded by a review action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Times were edited by hand and approved.
    Approved,
    /// A repair proposal was applied.
    Repaired,
    /// The finding was dismissed; times are correct as recorded.
    FalsePositive,
    /// The media was re-cut against corrected times.
    Reprocessed,
    /// Looked at but left open for a later pass.
    Deferred,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Repaired => "repaired",
            Self::FalsePositive => "false_positive",
            Self::Reprocessed => "reprocessed",
            Self::Deferred => "deferred",
        }
    }

    /// Whether clips with this status are excluded from future audits.
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Approved | Self::Repaired | Self::FalsePositive | Self::Reprocessed => true,
            Self::Deferred => false,
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Review stamp
// ---------------------------------------------------------------------------

/// Audit metadata stored on a clip after a review action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipReview {
    pub status: ReviewStatus,
    pub reviewed_by: String,
    pub reviewed_at: Timestamp,
    /// Set once any review action has rewritten the clip's times. The
    /// `previous_*` values then hold the pre-review times; `None` means the
    /// field was missing or unreadable before the first edit.
    #[serde(default)]
    pub times_edited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_start_time_seconds: Option<Seconds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_end_time_seconds: Option<Seconds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding_kind: Option<FindingKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Set when the stored media no longer matches the times and must be
    /// re-cut by the extraction pipeline.
    #[serde(default)]
    pub needs_reprocess: bool,
}

// ---------------------------------------------------------------------------
// API request types
// ---------------------------------------------------------------------------

/// Request body for applying the server-computed repair proposal.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyRepairRequest {
    pub approved_by: String,
}

/// Request body for dismissing a finding.
#[derive(Debug, Clone, Deserialize)]
pub struct FalsePositiveRequest {
    pub reviewed_by: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Request body for deferring a finding to a later pass.
#[derive(Debug, Clone, Deserialize)]
pub struct DeferRequest {
    pub reviewed_by: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Request body for confirming the media was re-cut.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkReprocessedRequest {
    pub reprocessed_by: String,
}

/// Request body for editing a clip's times by hand.
#[derive(Debug, Clone, Deserialize)]
pub struct ManualEditRequest {
    pub start_time_seconds: Seconds,
    pub end_time_seconds: Seconds,
    pub edited_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_serializes_camel_case_and_omits_empty_fields() {
        let review = ClipReview {
            status: ReviewStatus::FalsePositive,
            reviewed_by: "ada".to_string(),
            reviewed_at: chrono::Utc::now(),
            times_edited: false,
            previous_start_time_seconds: None,
            previous_end_time_seconds: None,
            finding_kind: Some(FindingKind::TooShort),
            rationale: None,
            note: Some("intentional sound bite".to_string()),
            needs_reprocess: false,
        };
        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["status"], "false_positive");
        assert_eq!(json["reviewedBy"], "ada");
        assert_eq!(json["findingKind"], "TOO_SHORT");
        assert!(json.get("previousStartTimeSeconds").is_none());
        assert_eq!(json["needsReprocess"], false);
        assert_eq!(json["timesEdited"], false);
    }

    #[test]
    fn stamp_without_optional_fields_deserializes() {
        let review: ClipReview = serde_json::from_value(serde_json::json!({
            "status": "approved",
            "reviewedBy": "grace",
            "reviewedAt": "2024-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(review.status, ReviewStatus::Approved);
        assert!(!review.times_edited);
        assert!(!review.needs_reprocess);
        assert_eq!(review.previous_end_time_seconds, None);
    }

    #[test]
    fn deferred_is_not_resolved() {
        assert!(!ReviewStatus::Deferred.is_resolved());
    }

    #[test]
    fn closing_statuses_are_resolved() {
        for status in [
            ReviewStatus::Approved,
            ReviewStatus::Repaired,
            ReviewStatus::FalsePositive,
            ReviewStatus::Reprocessed,
        ] {
            assert!(status.is_resolved(), "{status} should be resolved");
        }
    }
}
