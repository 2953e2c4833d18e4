//! JSON artifacts written by an audit run.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use testimony_core::clip_audit::ValidationReport;
use testimony_core::clip_repair::RepairProposal;
use testimony_core::clip_time::ClipTimeThresholds;
use testimony_core::types::Timestamp;
use uuid::Uuid;

/// File name of the validation report artifact.
pub const REPORT_FILE: &str = "clip-audit-report.json";

/// File name of the repair proposals artifact.
pub const PROPOSALS_FILE: &str = "clip-repair-proposals.json";

/// Contents of [`REPORT_FILE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReportFile {
    pub run_id: Uuid,
    pub generated_at: Timestamp,
    pub store_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    pub thresholds: ClipTimeThresholds,
    pub report: ValidationReport,
}

/// Contents of [`PROPOSALS_FILE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalsFile {
    pub run_id: Uuid,
    pub generated_at: Timestamp,
    pub proposals: Vec<RepairProposal>,
}

/// Serialize `value` as pretty JSON into `dir/name`, creating `dir` first.
pub async fn write_artifact<T: Serialize>(dir: &Path, name: &str, value: &T) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let path = dir.join(name);
    let data = serde_json::to_vec_pretty(value).with_context(|| format!("serializing {name}"))?;
    tokio::fs::write(&path, data)
        .await
        .with_context(|| format!("writing {}", path.display()))?;

    tracing::info!(path = %path.display(), "Wrote audit artifact");
    Ok(path)
}
