//! Auto-repair heuristics for flagged clip time ranges.
//!
//! Turns a [`ValidationFinding`] into a [`RepairProposal`]: either a
//! corrected start/end pair or an explicit hand-off to manual review. The
//! rules are deterministic and conservative and run offline against
//! historical data. Nothing here writes; applying a proposal is the store's
//! job and always goes through a named approver.

use serde::{Deserialize, Serialize};

use crate::clip_audit::ValidationReport;
use crate::clip_time::{
    validate_clip_time, ClipTimeRecord, ClipTimeThresholds, FindingKind, ValidationFinding,
};
use crate::types::{ClipId, Seconds};

// ---------------------------------------------------------------------------
// Rationale texts
// ---------------------------------------------------------------------------

/// Negative duration repaired by swapping start and end.
pub const RATIONALE_SWAP: &str =
    "negative duration: start and end were recorded in the wrong order, swapped back";

/// Too-long clip whose start offset cannot be trusted either.
pub const RATIONALE_IMPLAUSIBLE_START: &str =
    "start offset implausible, cannot infer a safe end time";

/// Suffix appended when the repair was computed from coerced values.
pub const RATIONALE_COERCED_SUFFIX: &str = "computed from missing or non-numeric times read as 0";

// ---------------------------------------------------------------------------
// Proposal types
// ---------------------------------------------------------------------------

/// How much a proposal can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairConfidence {
    /// Values are a pure rearrangement of recorded data.
    High,
    /// Values are a heuristic guess.
    Low,
    /// No values proposed.
    Manual,
}

impl RepairConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for RepairConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suggested correction for one flagged clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairProposal {
    pub clip_id: ClipId,
    pub kind: FindingKind,
    pub proposed_start_time_seconds: Option<Seconds>,
    pub proposed_end_time_seconds: Option<Seconds>,
    pub needs_manual_review: bool,
    pub confidence: RepairConfidence,
    pub rationale: String,
}

impl RepairProposal {
    fn manual(finding: &ValidationFinding, rationale: String) -> Self {
        Self {
            clip_id: finding.clip_id.clone(),
            kind: finding.kind,
            proposed_start_time_seconds: None,
            proposed_end_time_seconds: None,
            needs_manual_review: true,
            confidence: RepairConfidence::Manual,
            rationale,
        }
    }

    /// The proposed `(start, end)` pair, when both values are present.
    pub fn proposed_range(&self) -> Option<(Seconds, Seconds)> {
        self.proposed_start_time_seconds
            .zip(self.proposed_end_time_seconds)
    }

    /// `true` when the proposal carries a full replacement range.
    pub fn has_values(&self) -> bool {
        self.proposed_range().is_some()
    }

    /// `true` when the proposal may be applied without a reviewer editing it.
    pub fn is_auto_applicable(&self) -> bool {
        self.has_values() && !self.needs_manual_review
    }
}

// ---------------------------------------------------------------------------
// Heuristics
// ---------------------------------------------------------------------------

/// Propose a repair for one finding.
///
/// - `NEGATIVE_DURATION`: swap start and end. If the swapped range would
///   still be flagged, the swap is proposed but routed to manual review.
/// - `TOO_LONG`: with a plausible start, guess `end = start + default
///   repair duration` (low confidence, manual review). With an implausible
///   start, propose nothing.
/// - Every other kind: propose nothing, manual review.
///
/// A finding computed from coerced values always needs manual review.
pub fn propose_repair(
    finding: &ValidationFinding,
    thresholds: &ClipTimeThresholds,
) -> RepairProposal {
    let details = &finding.details;

    let mut proposal = match finding.kind {
        FindingKind::NegativeDuration => {
            let start = details.end_time_seconds;
            let end = details.start_time_seconds;
            let swapped = ClipTimeRecord::new(finding.clip_id.clone(), start, end);
            let residual = validate_clip_time(&swapped, thresholds).map(|f| f.kind);

            RepairProposal {
                clip_id: finding.clip_id.clone(),
                kind: finding.kind,
                proposed_start_time_seconds: Some(start),
                proposed_end_time_seconds: Some(end),
                needs_manual_review: residual.is_some(),
                confidence: RepairConfidence::High,
                rationale: match residual {
                    Some(kind) => format!("{RATIONALE_SWAP}; swapped range is still {kind}"),
                    None => RATIONALE_SWAP.to_string(),
                },
            }
        }
        FindingKind::TooLong => {
            if details.start_time_seconds > thresholds.max_plausible_start_seconds {
                RepairProposal::manual(finding, RATIONALE_IMPLAUSIBLE_START.to_string())
            } else {
                let start = details.start_time_seconds;
                let fallback = thresholds.default_repair_duration_seconds;
                RepairProposal {
                    clip_id: finding.clip_id.clone(),
                    kind: finding.kind,
                    proposed_start_time_seconds: Some(start),
                    proposed_end_time_seconds: Some(start + fallback),
                    needs_manual_review: true,
                    confidence: RepairConfidence::Low,
                    rationale: format!(
                        "duration exceeds the maximum; end guessed as start + {fallback}s, \
                         confirm against the source video"
                    ),
                }
            }
        }
        FindingKind::ZeroDuration
        | FindingKind::TooShort
        | FindingKind::SuspiciouslyLong
        | FindingKind::StartOutOfRange => RepairProposal::manual(
            finding,
            format!("no safe automatic repair for {}", finding.kind),
        ),
    };

    if !details.coerced_fields.is_empty() {
        proposal.needs_manual_review = true;
        if proposal.confidence == RepairConfidence::High {
            proposal.confidence = RepairConfidence::Low;
        }
        proposal.rationale = format!("{}; {RATIONALE_COERCED_SUFFIX}", proposal.rationale);
    }

    proposal
}

/// Propose repairs for every flagged clip of a report, in report order.
pub fn propose_repairs(
    report: &ValidationReport,
    thresholds: &ClipTimeThresholds,
) -> Vec<RepairProposal> {
    report
        .flagged_clips
        .iter()
        .map(|finding| propose_repair(finding, thresholds))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::clip_audit::validate_clips;
    use crate::clip_time::{TimeField, DEFAULT_REPAIR_DURATION_SECONDS};

    /// Defaults with the soft long-duration check switched on.
    fn thresholds() -> ClipTimeThresholds {
        ClipTimeThresholds {
            suspicious_long_duration_seconds: 900.0,
            ..ClipTimeThresholds::default()
        }
    }

    fn finding_for(start: Seconds, end: Seconds) -> ValidationFinding {
        validate_clip_time(&ClipTimeRecord::new("clip-1", start, end), &thresholds())
            .expect("record should be flagged")
    }

    fn repair(start: Seconds, end: Seconds) -> RepairProposal {
        propose_repair(&finding_for(start, end), &thresholds())
    }

    // -- negative duration ----------------------------------------------------

    #[test]
    fn negative_duration_is_swapped() {
        let proposal = repair(120.0, 60.0);
        assert_eq!(proposal.kind, FindingKind::NegativeDuration);
        assert_eq!(proposal.proposed_range(), Some((60.0, 120.0)));
        assert!(!proposal.needs_manual_review);
        assert_eq!(proposal.confidence, RepairConfidence::High);
        assert!(proposal.is_auto_applicable());
        assert_eq!(proposal.rationale, RATIONALE_SWAP);
    }

    #[test]
    fn swap_is_exact_for_fractional_values() {
        let proposal = repair(301.337, 12.125);
        assert_eq!(proposal.proposed_start_time_seconds, Some(12.125));
        assert_eq!(proposal.proposed_end_time_seconds, Some(301.337));
    }

    #[test]
    fn swap_still_flagged_needs_review() {
        // Swapped duration is 4000s, still TOO_LONG.
        let proposal = repair(4000.0, 0.0);
        assert_eq!(proposal.proposed_range(), Some((0.0, 4000.0)));
        assert!(proposal.needs_manual_review);
        assert!(!proposal.is_auto_applicable());
        assert!(proposal.rationale.contains("TOO_LONG"));
    }

    #[test]
    fn swap_of_short_range_needs_review() {
        let proposal = repair(62.0, 60.0);
        assert_eq!(proposal.proposed_range(), Some((60.0, 62.0)));
        assert!(proposal.needs_manual_review);
        assert!(proposal.rationale.contains("TOO_SHORT"));
    }

    // -- too long -------------------------------------------------------------

    #[test]
    fn too_long_with_plausible_start_guesses_end() {
        let proposal = repair(0.0, 4000.0);
        assert_eq!(
            proposal.proposed_range(),
            Some((0.0, DEFAULT_REPAIR_DURATION_SECONDS))
        );
        assert!(proposal.needs_manual_review);
        assert_eq!(proposal.confidence, RepairConfidence::Low);
        assert!(!proposal.is_auto_applicable());
    }

    #[test]
    fn too_long_uses_configured_fallback() {
        let thresholds = ClipTimeThresholds {
            default_repair_duration_seconds: 120.0,
            ..ClipTimeThresholds::default()
        };
        let proposal = propose_repair(&finding_for(100.0, 5000.0), &thresholds);
        assert_eq!(proposal.proposed_range(), Some((100.0, 220.0)));
    }

    #[test]
    fn too_long_with_implausible_start_is_manual() {
        let proposal = repair(20_000.0, 25_000.0);
        assert_eq!(proposal.kind, FindingKind::TooLong);
        assert!(!proposal.has_values());
        assert!(proposal.needs_manual_review);
        assert_eq!(proposal.confidence, RepairConfidence::Manual);
        assert_eq!(proposal.rationale, RATIONALE_IMPLAUSIBLE_START);
    }

    // -- manual-only kinds ----------------------------------------------------

    #[test]
    fn zero_duration_is_manual() {
        let proposal = repair(100.0, 100.0);
        assert_eq!(proposal.kind, FindingKind::ZeroDuration);
        assert!(!proposal.has_values());
        assert!(proposal.needs_manual_review);
    }

    #[test]
    fn other_kinds_are_manual() {
        for (start, end, kind) in [
            (0.0, 3.0, FindingKind::TooShort),
            (0.0, 1000.0, FindingKind::SuspiciouslyLong),
            (15_000.0, 15_090.0, FindingKind::StartOutOfRange),
        ] {
            let proposal = repair(start, end);
            assert_eq!(proposal.kind, kind);
            assert_eq!(proposal.proposed_range(), None);
            assert!(proposal.needs_manual_review);
            assert_eq!(proposal.confidence, RepairConfidence::Manual);
        }
    }

    // -- coerced input --------------------------------------------------------

    #[test]
    fn coerced_swap_is_proposed_but_needs_review() {
        let mut record = ClipTimeRecord::new("c", 120.0, 0.0);
        record.coerced_fields = vec![TimeField::End];
        let finding = validate_clip_time(&record, &ClipTimeThresholds::default()).unwrap();
        let proposal = propose_repair(&finding, &ClipTimeThresholds::default());

        assert_eq!(proposal.proposed_range(), Some((0.0, 120.0)));
        assert!(proposal.needs_manual_review);
        assert_eq!(proposal.confidence, RepairConfidence::Low);
        assert!(proposal.rationale.ends_with(RATIONALE_COERCED_SUFFIX));
    }

    // -- propose_repairs ------------------------------------------------------

    #[test]
    fn proposals_follow_report_order() {
        let records = vec![
            ClipTimeRecord::new("a", 0.0, 60.0),
            ClipTimeRecord::new("b", 0.0, 4000.0),
            ClipTimeRecord::new("c", 90.0, 30.0),
        ];
        let thresholds = ClipTimeThresholds::default();
        let report = validate_clips(&records, &HashSet::new(), &thresholds);
        let proposals = propose_repairs(&report, &thresholds);
        let ids: Vec<&str> = proposals.iter().map(|p| p.clip_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn proposal_serializes_snake_case() {
        let json = serde_json::to_value(repair(120.0, 60.0)).unwrap();
        assert_eq!(json["kind"], "NEGATIVE_DURATION");
        assert_eq!(json["confidence"], "high");
        assert_eq!(RepairConfidence::Low.to_string(), "low");
        assert_eq!(json["proposed_start_time_seconds"], 60.0);
        assert_eq!(json["needs_manual_review"], false);
    }
}
