//! Handlers for the `/clip-audit` resource.
//!
//! Reports and proposals are computed from the loaded store under the read
//! lock. Review actions take the write lock, persist the store, and answer
//! with the clip's re-validated state.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use testimony_core::clip_audit::{sort_by_severity, validate_clips, ValidationReport};
use testimony_core::clip_repair::{propose_repair, propose_repairs, RepairProposal};
use testimony_core::clip_time::{
    validate_clip_time, ClipTimeRecord, ClipTimeThresholds, ValidationFinding,
};
use testimony_core::error::CoreError;
use testimony_core::types::ClipId;
use testimony_db::models::clip::ClipDocument;
use testimony_db::models::review::{
    ApplyRepairRequest, ClipReview, DeferRequest, FalsePositiveRequest, ManualEditRequest,
    MarkReprocessedRequest,
};
use testimony_db::repositories::ClipRepo;
use testimony_db::ClipStore;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// The only supported `sort` value.
const SORT_SEVERITY: &str = "severity";

// ── Request / response types ─────────────────────────────────────────

/// Query parameters for the stored-clip report.
#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub episode: Option<String>,
    /// Validate clips that already carry a resolving review stamp too.
    #[serde(default)]
    pub include_resolved: bool,
    pub sort: Option<String>,
}

/// Query parameters restricting a listing to one episode.
#[derive(Debug, Deserialize)]
pub struct EpisodeParams {
    pub episode: Option<String>,
}

/// Request body for the dry-run endpoint.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub clips: Vec<ClipDocument>,
    #[serde(default)]
    pub skip_ids: Vec<ClipId>,
}

/// Audit state of a single clip.
#[derive(Debug, Serialize)]
pub struct ClipAuditView {
    pub clip: ClipTimeRecord,
    pub review: Option<ClipReview>,
    /// Present while the clip's times are still flagged.
    pub finding: Option<ValidationFinding>,
    pub proposal: Option<RepairProposal>,
}

impl ClipAuditView {
    fn build(document: &ClipDocument, thresholds: &ClipTimeThresholds) -> Self {
        let clip = document.time_record();
        let finding = validate_clip_time(&clip, thresholds);
        let proposal = finding.as_ref().map(|f| propose_repair(f, thresholds));
        Self {
            clip,
            review: document.review(),
            finding,
            proposal,
        }
    }
}

type ViewResponse = AppResult<Json<DataResponse<ClipAuditView>>>;

// ── Reports ──────────────────────────────────────────────────────────

/// GET /api/v1/clip-audit/report?episode=X&include_resolved=true&sort=severity
///
/// Validate the stored clips. Resolved clips are skipped unless
/// `include_resolved` is set; findings keep store order unless sorted.
pub async fn get_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> AppResult<Json<DataResponse<ValidationReport>>> {
    let sort = wants_severity_sort(params.sort.as_deref())?;

    let mut report = {
        let store = state.store.read().await;
        stored_report(
            &store,
            params.episode.as_deref(),
            params.include_resolved,
            state.thresholds(),
        )
    };
    if sort {
        sort_by_severity(&mut report.flagged_clips);
    }

    tracing::debug!(
        episode = params.episode.as_deref().unwrap_or("*"),
        total = report.summary.total,
        flagged = report.summary.flagged,
        "Clip audit report generated",
    );
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/clip-audit/validate
///
/// Validate posted clip documents without touching the store.
pub async fn validate(
    State(state): State<AppState>,
    Json(input): Json<ValidateRequest>,
) -> AppResult<Json<DataResponse<ValidationReport>>> {
    let records: Vec<ClipTimeRecord> = input.clips.iter().map(ClipDocument::time_record).collect();
    let skip: HashSet<ClipId> = input.skip_ids.into_iter().collect();
    let report = validate_clips(&records, &skip, state.thresholds());
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/clip-audit/repairs?episode=X
///
/// Repair proposals for every unresolved flagged clip, in store order.
pub async fn list_repairs(
    State(state): State<AppState>,
    Query(params): Query<EpisodeParams>,
) -> AppResult<Json<DataResponse<Vec<RepairProposal>>>> {
    let report = {
        let store = state.store.read().await;
        stored_report(&store, params.episode.as_deref(), false, state.thresholds())
    };
    let proposals = propose_repairs(&report, state.thresholds());
    Ok(Json(DataResponse { data: proposals }))
}

/// GET /api/v1/clip-audit/reprocess-queue
///
/// Ids of clips whose times were rewritten and whose media is stale.
pub async fn reprocess_queue(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ClipId>>>> {
    let store = state.store.read().await;
    Ok(Json(DataResponse {
        data: ClipRepo::pending_reprocess(&store),
    }))
}

/// GET /api/v1/clip-audit/clips/{id}
pub async fn get_clip(State(state): State<AppState>, Path(id): Path<ClipId>) -> ViewResponse {
    let store = state.store.read().await;
    let document = ClipRepo::get(&store, &id)?;
    Ok(view(document, state.thresholds()))
}

// ── Review actions ───────────────────────────────────────────────────

/// POST /api/v1/clip-audit/clips/{id}/apply-repair
///
/// Recompute the finding and proposal server-side and apply it. A clean
/// clip is a conflict; a proposal without values is rejected.
pub async fn apply_repair(
    State(state): State<AppState>,
    Path(id): Path<ClipId>,
    Json(input): Json<ApplyRepairRequest>,
) -> ViewResponse {
    require_field("approved_by", &input.approved_by)?;
    let thresholds = *state.thresholds();

    let mut store = state.store.write().await;
    let record = ClipRepo::get(&store, &id)?.time_record();
    let finding = validate_clip_time(&record, &thresholds).ok_or_else(|| {
        CoreError::Conflict(format!("clip '{id}' has no time-range finding to repair"))
    })?;
    let proposal = propose_repair(&finding, &thresholds);

    let updated = ClipRepo::apply_repair(&mut store, &id, &proposal, &input.approved_by).await?;
    Ok(view(&updated, &thresholds))
}

/// POST /api/v1/clip-audit/clips/{id}/false-positive
pub async fn mark_false_positive(
    State(state): State<AppState>,
    Path(id): Path<ClipId>,
    Json(input): Json<FalsePositiveRequest>,
) -> ViewResponse {
    require_field("reviewed_by", &input.reviewed_by)?;
    let mut store = state.store.write().await;
    let updated =
        ClipRepo::mark_false_positive(&mut store, &id, &input.reviewed_by, input.note.as_deref())
            .await?;
    Ok(view(&updated, state.thresholds()))
}

/// POST /api/v1/clip-audit/clips/{id}/defer
pub async fn defer(
    State(state): State<AppState>,
    Path(id): Path<ClipId>,
    Json(input): Json<DeferRequest>,
) -> ViewResponse {
    require_field("reviewed_by", &input.reviewed_by)?;
    let mut store = state.store.write().await;
    let updated =
        ClipRepo::defer(&mut store, &id, &input.reviewed_by, input.note.as_deref()).await?;
    Ok(view(&updated, state.thresholds()))
}

/// PUT /api/v1/clip-audit/clips/{id}/times
///
/// Returns the new record together with any finding that remains.
pub async fn edit_times(
    State(state): State<AppState>,
    Path(id): Path<ClipId>,
    Json(input): Json<ManualEditRequest>,
) -> ViewResponse {
    require_field("edited_by", &input.edited_by)?;
    let mut store = state.store.write().await;
    let updated = ClipRepo::manual_edit(
        &mut store,
        &id,
        input.start_time_seconds,
        input.end_time_seconds,
        &input.edited_by,
    )
    .await?;
    Ok(view(&updated, state.thresholds()))
}

/// POST /api/v1/clip-audit/clips/{id}/reprocessed
pub async fn mark_reprocessed(
    State(state): State<AppState>,
    Path(id): Path<ClipId>,
    Json(input): Json<MarkReprocessedRequest>,
) -> ViewResponse {
    require_field("reprocessed_by", &input.reprocessed_by)?;
    let mut store = state.store.write().await;
    let updated = ClipRepo::mark_reprocessed(&mut store, &id, &input.reprocessed_by).await?;
    Ok(view(&updated, state.thresholds()))
}

/// POST /api/v1/clip-audit/clips/{id}/undo
pub async fn undo_review(State(state): State<AppState>, Path(id): Path<ClipId>) -> ViewResponse {
    let mut store = state.store.write().await;
    let updated = ClipRepo::undo_review(&mut store, &id).await?;
    Ok(view(&updated, state.thresholds()))
}

// ── Helpers ──────────────────────────────────────────────────────────

fn stored_report(
    store: &ClipStore,
    episode: Option<&str>,
    include_resolved: bool,
    thresholds: &ClipTimeThresholds,
) -> ValidationReport {
    let records = ClipRepo::time_records(store, episode);
    let skip = if include_resolved {
        HashSet::new()
    } else {
        ClipRepo::resolved_ids(store)
    };
    validate_clips(&records, &skip, thresholds)
}

fn view(
    document: &ClipDocument,
    thresholds: &ClipTimeThresholds,
) -> Json<DataResponse<ClipAuditView>> {
    Json(DataResponse {
        data: ClipAuditView::build(document, thresholds),
    })
}

fn wants_severity_sort(sort: Option<&str>) -> AppResult<bool> {
    match sort {
        None => Ok(false),
        Some(SORT_SEVERITY) => Ok(true),
        Some(other) => Err(AppError::BadRequest(format!(
            "unsupported sort '{other}', expected '{SORT_SEVERITY}'"
        ))),
    }
}

fn require_field(name: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{name} must not be blank")));
    }
    Ok(())
}
