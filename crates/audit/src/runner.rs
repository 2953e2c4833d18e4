//! One end-to-end audit run.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use testimony_core::clip_audit::{
    merge_shard_reports, validate_shard, ValidationReport, ValidationSummary,
};
use testimony_core::clip_repair::{propose_repairs, RepairProposal};
use testimony_core::clip_time::{ClipTimeRecord, ClipTimeThresholds, Severity};
use testimony_core::types::ClipId;
use testimony_db::repositories::ClipRepo;
use testimony_db::ClipStore;
use uuid::Uuid;

use crate::config::AuditConfig;
use crate::report::{write_artifact, AuditReportFile, ProposalsFile, PROPOSALS_FILE, REPORT_FILE};

/// What a run did.
#[derive(Debug, Clone, Serialize)]
pub struct AuditOutcome {
    pub run_id: Uuid,
    pub summary: ValidationSummary,
    pub proposals: usize,
    /// Clips whose repair was written back to the store.
    pub applied: Vec<ClipId>,
    pub report_path: PathBuf,
    pub proposals_path: PathBuf,
}

/// Audit the store named in `config`.
///
/// Loads the store, validates every unresolved clip, writes both artifacts
/// and, when enabled, applies the auto-applicable proposals in one batch.
/// A proposal that cannot be applied is logged and skipped; a failed save
/// leaves the store file untouched and fails the run.
pub async fn run(config: &AuditConfig) -> anyhow::Result<AuditOutcome> {
    let run_id = Uuid::now_v7();
    let generated_at = chrono::Utc::now();
    tracing::info!(%run_id, store = %config.store_path.display(), "Starting clip audit");

    let mut store = ClipStore::open(&config.store_path)
        .await
        .with_context(|| format!("opening clip store {}", config.store_path.display()))?;

    let records = ClipRepo::time_records(&store, config.episode.as_deref());
    let skip = ClipRepo::resolved_ids(&store);
    let report = validate_sharded(records, skip, config.thresholds, config.shard_size).await?;
    log_summary(&report.summary);

    let proposals = propose_repairs(&report, &config.thresholds);

    let report_path = write_artifact(
        &config.output_dir,
        REPORT_FILE,
        &AuditReportFile {
            run_id,
            generated_at,
            store_path: config.store_path.clone(),
            episode: config.episode.clone(),
            thresholds: config.thresholds,
            report: report.clone(),
        },
    )
    .await?;
    let proposals_path = write_artifact(
        &config.output_dir,
        PROPOSALS_FILE,
        &ProposalsFile {
            run_id,
            generated_at,
            proposals: proposals.clone(),
        },
    )
    .await?;

    let applied = if config.apply_safe {
        let approved_by = config
            .approved_by
            .as_deref()
            .context("AUDIT_APPROVED_BY is required when applying repairs")?;

        let safe: Vec<RepairProposal> = proposals
            .iter()
            .filter(|p| p.is_auto_applicable())
            .cloned()
            .collect();
        let applied = ClipRepo::apply_repairs(&mut store, &safe, approved_by)
            .await
            .context("applying safe repairs")?;
        tracing::info!(candidates = safe.len(), applied = applied.len(), "Applied safe repairs");
        applied
    } else {
        Vec::new()
    };

    Ok(AuditOutcome {
        run_id,
        summary: report.summary,
        proposals: proposals.len(),
        applied,
        report_path,
        proposals_path,
    })
}

/// Validate `records` in shards of `shard_size` on the blocking pool.
pub async fn validate_sharded(
    records: Vec<ClipTimeRecord>,
    skip_ids: HashSet<ClipId>,
    thresholds: ClipTimeThresholds,
    shard_size: usize,
) -> anyhow::Result<ValidationReport> {
    let shard_size = shard_size.max(1);
    let records = Arc::new(records);
    let skip_ids = Arc::new(skip_ids);

    let handles: Vec<_> = (0..records.len())
        .step_by(shard_size)
        .map(|base| {
            let records = Arc::clone(&records);
            let skip_ids = Arc::clone(&skip_ids);
            tokio::task::spawn_blocking(move || {
                let end = (base + shard_size).min(records.len());
                validate_shard(&records[base..end], base, &skip_ids, &thresholds)
            })
        })
        .collect();

    let mut shards = Vec::with_capacity(handles.len());
    for handle in handles {
        shards.push(handle.await.context("validation shard failed")?);
    }
    Ok(merge_shard_reports(shards))
}

fn log_summary(summary: &ValidationSummary) {
    tracing::info!(
        total = summary.total,
        skipped = summary.skipped,
        flagged = summary.flagged,
        high = summary.severity_count(Severity::High),
        medium = summary.severity_count(Severity::Medium),
        low = summary.severity_count(Severity::Low),
        "Clip audit complete",
    );
    for (kind, count) in summary.by_kind.iter().filter(|(_, count)| **count > 0) {
        tracing::info!(kind = %kind, count, "Findings by kind");
    }
}

#[cfg(test)]
mod tests {
    use testimony_core::clip_audit::validate_clips;

    use super::*;

    fn records() -> Vec<ClipTimeRecord> {
        (0..23)
            .map(|i| {
                let start = i as f64 * 10.0;
                // every third clip is swapped
                if i % 3 == 0 {
                    ClipTimeRecord::new(format!("c{i}"), start + 30.0, start)
                } else {
                    ClipTimeRecord::new(format!("c{i}"), start, start + 30.0)
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn sharded_matches_single_pass() {
        let thresholds = ClipTimeThresholds::default();
        let skip: HashSet<ClipId> = ["c3".to_string(), "c4".to_string()].into();
        let expected = validate_clips(&records(), &skip, &thresholds);

        for shard_size in [1, 4, 23, 100] {
            let report = validate_sharded(records(), skip.clone(), thresholds, shard_size)
                .await
                .unwrap();
            assert_eq!(report, expected, "shard size {shard_size}");
        }
    }

    #[tokio::test]
    async fn empty_input_is_clean() {
        let report = validate_sharded(Vec::new(), HashSet::new(), ClipTimeThresholds::default(), 10)
            .await
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.summary.total, 0);
    }
}
