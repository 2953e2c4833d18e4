//! Batch validation of clip collections.
//!
//! Runs [`validate_clip_time`] over an ordered collection, skipping clips the
//! caller has already resolved, and produces a [`ValidationReport`] with the
//! flagged findings in input order plus summary counts.
//!
//! Collections can also be validated in independent shards
//! ([`validate_shard`]) and recombined with [`merge_shard_reports`]; the
//! merged report is identical to a single pass over the whole input.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::clip_time::{
    validate_clip_time, ClipTimeRecord, ClipTimeThresholds, FindingKind, Severity,
    ValidationFinding,
};
use crate::types::ClipId;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Summary counts for a validation run.
///
/// `total` counts every candidate handed in, including skipped ones; the
/// admin UI reports "N clips considered" from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub skipped: usize,
    pub flagged: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_kind: BTreeMap<FindingKind, usize>,
}

impl Default for ValidationSummary {
    fn default() -> Self {
        Self {
            total: 0,
            skipped: 0,
            flagged: 0,
            by_severity: Severity::ALL.into_iter().map(|s| (s, 0)).collect(),
            by_kind: FindingKind::ALL.into_iter().map(|k| (k, 0)).collect(),
        }
    }
}

impl ValidationSummary {
    fn count_finding(&mut self, finding: &ValidationFinding) {
        self.flagged += 1;
        *self.by_severity.entry(finding.severity).or_insert(0) += 1;
        *self.by_kind.entry(finding.kind).or_insert(0) += 1;
    }

    /// Add another summary's counts into this one.
    pub fn absorb(&mut self, other: &ValidationSummary) {
        self.total += other.total;
        self.skipped += other.skipped;
        self.flagged += other.flagged;
        for (severity, count) in &other.by_severity {
            *self.by_severity.entry(*severity).or_insert(0) += count;
        }
        for (kind, count) in &other.by_kind {
            *self.by_kind.entry(*kind).or_insert(0) += count;
        }
    }

    /// Count for one severity (zero when absent).
    pub fn severity_count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    /// Count for one finding kind (zero when absent).
    pub fn kind_count(&self, kind: FindingKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// Result of validating a clip collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Findings in the relative order of the input collection.
    pub flagged_clips: Vec<ValidationFinding>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    /// `true` when no examined clip was flagged.
    pub fn is_clean(&self) -> bool {
        self.flagged_clips.is_empty()
    }

    /// Findings with the given severity, in report order.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationFinding> {
        self.flagged_clips
            .iter()
            .filter(move |f| f.severity == severity)
    }
}

/// A finding tagged with its position in the original collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFinding {
    pub index: usize,
    pub finding: ValidationFinding,
}

/// Partial result for one shard of a collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShardReport {
    pub findings: Vec<IndexedFinding>,
    pub summary: ValidationSummary,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Validate an ordered collection of clips in a single pass.
///
/// Clips whose id is in `skip_ids` are counted in `summary.total` and
/// `summary.skipped` but never validated. Inputs are not modified.
pub fn validate_clips(
    records: &[ClipTimeRecord],
    skip_ids: &HashSet<ClipId>,
    thresholds: &ClipTimeThresholds,
) -> ValidationReport {
    let shard = validate_shard(records, 0, skip_ids, thresholds);
    ValidationReport {
        flagged_clips: shard.findings.into_iter().map(|entry| entry.finding).collect(),
        summary: shard.summary,
    }
}

/// Validate one shard whose first record sits at `base_index` in the full
/// collection.
pub fn validate_shard(
    records: &[ClipTimeRecord],
    base_index: usize,
    skip_ids: &HashSet<ClipId>,
    thresholds: &ClipTimeThresholds,
) -> ShardReport {
    let mut shard = ShardReport {
        findings: Vec::new(),
        summary: ValidationSummary {
            total: records.len(),
            ..ValidationSummary::default()
        },
    };

    for (offset, record) in records.iter().enumerate() {
        if skip_ids.contains(&record.id) {
            shard.summary.skipped += 1;
            continue;
        }
        if let Some(finding) = validate_clip_time(record, thresholds) {
            shard.summary.count_finding(&finding);
            shard.findings.push(IndexedFinding {
                index: base_index + offset,
                finding,
            });
        }
    }

    shard
}

/// Combine shard results into one report, restoring input order.
pub fn merge_shard_reports<I>(shards: I) -> ValidationReport
where
    I: IntoIterator<Item = ShardReport>,
{
    let mut summary = ValidationSummary::default();
    let mut indexed = Vec::new();
    for shard in shards {
        summary.absorb(&shard.summary);
        indexed.extend(shard.findings);
    }
    indexed.sort_by_key(|entry| entry.index);

    ValidationReport {
        flagged_clips: indexed.into_iter().map(|entry| entry.finding).collect(),
        summary,
    }
}

/// Sort findings most-severe-first, keeping input order within a severity.
///
/// The aggregator never reorders; this is for callers that present findings
/// by triage priority.
pub fn sort_by_severity(findings: &mut [ValidationFinding]) {
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Defaults with the soft long-duration check switched on.
    fn thresholds() -> ClipTimeThresholds {
        ClipTimeThresholds {
            suspicious_long_duration_seconds: 900.0,
            ..ClipTimeThresholds::default()
        }
    }

    fn clean(id: &str) -> ClipTimeRecord {
        ClipTimeRecord::new(id, 10.0, 70.0)
    }

    fn ids(report: &ValidationReport) -> Vec<&str> {
        report
            .flagged_clips
            .iter()
            .map(|f| f.clip_id.as_str())
            .collect()
    }

    fn mixed_batch() -> Vec<ClipTimeRecord> {
        vec![
            clean("c0"),
            ClipTimeRecord::new("c1", 120.0, 60.0),
            clean("c2"),
            ClipTimeRecord::new("c3", 0.0, 3.0),
            ClipTimeRecord::new("c4", 0.0, 1000.0),
            clean("c5"),
            ClipTimeRecord::new("c6", 0.0, 4000.0),
            ClipTimeRecord::new("c7", 15_000.0, 15_090.0),
            ClipTimeRecord::new("c8", 50.0, 50.0),
            clean("c9"),
        ]
    }

    fn assert_consistent(report: &ValidationReport) {
        let n = report.flagged_clips.len();
        assert_eq!(report.summary.flagged, n);
        assert_eq!(report.summary.by_severity.values().sum::<usize>(), n);
        assert_eq!(report.summary.by_kind.values().sum::<usize>(), n);
    }

    // -- validate_clips -------------------------------------------------------

    #[test]
    fn flags_two_of_ten_in_input_order() {
        let mut records: Vec<ClipTimeRecord> =
            (0..10).map(|i| clean(&format!("clip{i}"))).collect();
        records[2] = ClipTimeRecord::new("clip2", 120.0, 60.0);
        records[7] = ClipTimeRecord::new("clip7", 0.0, 3.0);

        let report = validate_clips(&records, &HashSet::new(), &thresholds());

        assert_eq!(ids(&report), vec!["clip2", "clip7"]);
        assert_eq!(report.summary.total, 10);
        assert_eq!(report.summary.flagged, 2);
        assert_eq!(report.summary.skipped, 0);
        assert_consistent(&report);
    }

    #[test]
    fn empty_input_yields_zero_report() {
        let report = validate_clips(&[], &HashSet::new(), &thresholds());
        assert!(report.is_clean());
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.summary.flagged, 0);
        assert!(report.summary.by_severity.values().all(|c| *c == 0));
        assert!(report.summary.by_kind.values().all(|c| *c == 0));
    }

    #[test]
    fn all_skipped_keeps_total() {
        let records = mixed_batch();
        let skip: HashSet<ClipId> = records.iter().map(|r| r.id.clone()).collect();
        let report = validate_clips(&records, &skip, &thresholds());
        assert!(report.is_clean());
        assert_eq!(report.summary.total, 10);
        assert_eq!(report.summary.skipped, 10);
        assert_eq!(report.summary.flagged, 0);
    }

    #[test]
    fn skipped_clip_is_not_reported() {
        let records = mixed_batch();
        let skip: HashSet<ClipId> = ["c1".to_string(), "c6".to_string()].into();
        let report = validate_clips(&records, &skip, &thresholds());
        assert_eq!(ids(&report), vec!["c3", "c4", "c7", "c8"]);
        assert_eq!(report.summary.skipped, 2);
        assert_consistent(&report);
    }

    #[test]
    fn counts_by_kind_and_severity() {
        let report = validate_clips(&mixed_batch(), &HashSet::new(), &thresholds());
        assert_eq!(ids(&report), vec!["c1", "c3", "c4", "c6", "c7", "c8"]);
        assert_eq!(report.summary.severity_count(Severity::High), 3);
        assert_eq!(report.summary.severity_count(Severity::Medium), 2);
        assert_eq!(report.summary.severity_count(Severity::Low), 1);
        assert_eq!(report.summary.kind_count(FindingKind::NegativeDuration), 1);
        assert_eq!(report.summary.kind_count(FindingKind::SuspiciouslyLong), 1);
        assert_eq!(report.with_severity(Severity::Medium).count(), 2);
        assert_consistent(&report);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let records = mixed_batch();
        let before = records.clone();
        let _ = validate_clips(&records, &HashSet::new(), &thresholds());
        assert_eq!(records, before);
    }

    #[test]
    fn summary_serializes_with_string_keys() {
        let report = validate_clips(&mixed_batch(), &HashSet::new(), &thresholds());
        let json = serde_json::to_value(&report.summary).unwrap();
        assert_eq!(json["by_severity"]["high"], 3);
        assert_eq!(json["by_kind"]["TOO_SHORT"], 1);
    }

    // -- sharding -------------------------------------------------------------

    #[test]
    fn merged_shards_equal_single_pass() {
        let records = mixed_batch();
        let skip: HashSet<ClipId> = ["c4".to_string()].into();
        let thresholds = thresholds();
        let single = validate_clips(&records, &skip, &thresholds);

        let shards: Vec<ShardReport> = std::thread::scope(|scope| {
            let handles: Vec<_> = records
                .chunks(3)
                .enumerate()
                .map(|(i, chunk)| {
                    let skip = &skip;
                    let thresholds = &thresholds;
                    scope.spawn(move || validate_shard(chunk, i * 3, skip, thresholds))
                })
                .collect();
            // Join in reverse to prove the merge does not rely on shard order.
            handles
                .into_iter()
                .rev()
                .map(|h| h.join().expect("shard thread panicked"))
                .collect()
        });

        let merged = merge_shard_reports(shards);
        assert_eq!(merged, single);
    }

    #[test]
    fn shard_indices_are_absolute() {
        let records = mixed_batch();
        let shard = validate_shard(
            &records[6..],
            6,
            &HashSet::new(),
            &thresholds(),
        );
        let indices: Vec<usize> = shard.findings.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![6, 7, 8]);
        assert_eq!(shard.summary.total, 4);
    }

    #[test]
    fn shard_handles_duplicate_ids() {
        let records = vec![
            ClipTimeRecord::new("dup", 0.0, 60.0),
            ClipTimeRecord::new("dup", 60.0, 0.0),
        ];
        let shard = validate_shard(&records, 0, &HashSet::new(), &thresholds());
        assert_eq!(shard.findings.len(), 1);
        assert_eq!(shard.findings[0].index, 1);
    }

    #[test]
    fn merging_nothing_is_empty() {
        let merged = merge_shard_reports(Vec::new());
        assert_eq!(merged, ValidationReport::default());
    }

    // -- sort_by_severity -----------------------------------------------------

    #[test]
    fn sort_by_severity_is_stable() {
        let mut findings =
            validate_clips(&mixed_batch(), &HashSet::new(), &thresholds())
                .flagged_clips;
        sort_by_severity(&mut findings);
        let order: Vec<&str> = findings.iter().map(|f| f.clip_id.as_str()).collect();
        assert_eq!(order, vec!["c1", "c6", "c8", "c3", "c7", "c4"]);
    }
}
