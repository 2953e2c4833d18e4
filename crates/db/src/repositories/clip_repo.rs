//! Repository for clip documents and their time-review write-backs.

use std::collections::HashSet;

use testimony_core::clip_repair::RepairProposal;
use testimony_core::clip_time::{ClipTimeRecord, TimeField};
use testimony_core::error::CoreError;
use testimony_core::types::{ClipId, Seconds};

use crate::error::DbError;
use crate::models::clip::ClipDocument;
use crate::models::review::{ClipReview, ReviewStatus};
use crate::store::ClipStore;

/// Entity name used in `NotFound` errors.
const ENTITY: &str = "clip";

/// Provides reads and review actions for clip documents.
pub struct ClipRepo;

impl ClipRepo {
    /// Documents in stored order, optionally restricted to one episode.
    pub fn list<'a>(store: &'a ClipStore, episode: Option<&str>) -> Vec<&'a ClipDocument> {
        store
            .documents()
            .iter()
            .filter(|doc| match episode {
                Some(ep) => doc.episode().as_deref() == Some(ep),
                None => true,
            })
            .collect()
    }

    pub fn find_by_id<'a>(store: &'a ClipStore, id: &str) -> Option<&'a ClipDocument> {
        store.documents().iter().find(|doc| doc.id == id)
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing clip is an error.
    pub fn get<'a>(store: &'a ClipStore, id: &str) -> Result<&'a ClipDocument, DbError> {
        Self::find_by_id(store, id).ok_or_else(|| not_found(id))
    }

    /// Normalized time records in stored order.
    pub fn time_records(store: &ClipStore, episode: Option<&str>) -> Vec<ClipTimeRecord> {
        Self::list(store, episode)
            .into_iter()
            .map(ClipDocument::time_record)
            .collect()
    }

    /// Ids of clips whose review stamp excludes them from audits.
    pub fn resolved_ids(store: &ClipStore) -> HashSet<ClipId> {
        store
            .documents()
            .iter()
            .filter(|doc| doc.is_resolved())
            .map(|doc| doc.id.clone())
            .collect()
    }

    /// Ids of clips whose times were rewritten and whose media is stale.
    pub fn pending_reprocess(store: &ClipStore) -> Vec<ClipId> {
        store
            .documents()
            .iter()
            .filter(|doc| doc.review().is_some_and(|r| r.needs_reprocess))
            .map(|doc| doc.id.clone())
            .collect()
    }

    /// Write a repair proposal's values back to the clip.
    ///
    /// The proposal must target this clip and carry a full range. The clip
    /// is stamped `repaired` and flagged for reprocessing.
    pub async fn apply_repair(
        store: &mut ClipStore,
        id: &str,
        proposal: &RepairProposal,
        actor: &str,
    ) -> Result<ClipDocument, DbError> {
        let actor = require_actor(actor)?;
        if proposal.clip_id != id {
            return Err(CoreError::Validation(format!(
                "repair proposal is for clip '{}', not '{id}'",
                proposal.clip_id
            ))
            .into());
        }
        let (start, end) = repair_range(proposal)?;

        let updated = update_document(store, id, |doc| {
            write_repair(doc, proposal, start, end, &actor)
        })
        .await?;

        tracing::info!(
            clip_id = %id,
            actor = %actor,
            kind = %proposal.kind,
            confidence = %proposal.confidence,
            start,
            end,
            "Applied clip time repair",
        );
        Ok(updated)
    }

    /// Apply a batch of repair proposals and persist the store once.
    ///
    /// Proposals that cannot be applied are logged and skipped. If the save
    /// fails, every change in the batch is rolled back.
    pub async fn apply_repairs(
        store: &mut ClipStore,
        proposals: &[RepairProposal],
        actor: &str,
    ) -> Result<Vec<ClipId>, DbError> {
        let actor = require_actor(actor)?;

        let mut originals: Vec<(usize, ClipDocument)> = Vec::new();
        let mut applied = Vec::new();
        for proposal in proposals {
            match stage_repair(store, proposal, &actor) {
                Ok(original) => {
                    originals.push(original);
                    applied.push(proposal.clip_id.clone());
                }
                Err(err) => {
                    tracing::warn!(clip_id = %proposal.clip_id, error = %err, "Skipped clip repair");
                }
            }
        }
        if applied.is_empty() {
            return Ok(applied);
        }

        if let Err(err) = store.save().await {
            tracing::error!(count = applied.len(), error = %err, "Failed to persist repair batch");
            for (index, original) in originals.into_iter().rev() {
                store.documents[index] = original;
            }
            return Err(err);
        }

        tracing::info!(actor = %actor, applied = applied.len(), "Applied clip time repairs");
        Ok(applied)
    }

    /// Dismiss the finding; the recorded times are correct.
    pub async fn mark_false_positive(
        store: &mut ClipStore,
        id: &str,
        actor: &str,
        note: Option<&str>,
    ) -> Result<ClipDocument, DbError> {
        Self::stamp_without_edit(store, id, ReviewStatus::FalsePositive, actor, note).await
    }

    /// Record that the clip was looked at but leave it in future audits.
    pub async fn defer(
        store: &mut ClipStore,
        id: &str,
        actor: &str,
        note: Option<&str>,
    ) -> Result<ClipDocument, DbError> {
        Self::stamp_without_edit(store, id, ReviewStatus::Deferred, actor, note).await
    }

    /// Overwrite the clip's times with reviewer-supplied values.
    pub async fn manual_edit(
        store: &mut ClipStore,
        id: &str,
        start: Seconds,
        end: Seconds,
        actor: &str,
    ) -> Result<ClipDocument, DbError> {
        let actor = require_actor(actor)?;
        check_times(start, end)?;

        let updated = update_document(store, id, |doc| {
            let review = next_review(doc, ReviewStatus::Approved, actor.clone(), true);
            doc.set_times(start, end);
            doc.set_review(&review)
        })
        .await?;

        tracing::info!(clip_id = %id, actor = %actor, start, end, "Edited clip times");
        Ok(updated)
    }

    /// Confirm that a clip's media was re-cut against its corrected times.
    ///
    /// Only valid for clips stamped with `needsReprocess`.
    pub async fn mark_reprocessed(
        store: &mut ClipStore,
        id: &str,
        actor: &str,
    ) -> Result<ClipDocument, DbError> {
        let actor = require_actor(actor)?;
        let prior = Self::get(store, id)?
            .review()
            .filter(|review| review.needs_reprocess)
            .ok_or_else(|| {
                CoreError::Conflict(format!("clip '{id}' is not awaiting reprocessing"))
            })?;

        let updated = update_document(store, id, |doc| {
            let review = ClipReview {
                status: ReviewStatus::Reprocessed,
                reviewed_by: actor.clone(),
                reviewed_at: chrono::Utc::now(),
                needs_reprocess: false,
                ..prior
            };
            doc.set_review(&review)
        })
        .await?;

        tracing::info!(clip_id = %id, actor = %actor, "Marked clip reprocessed");
        Ok(updated)
    }

    /// Revert every review action on the clip.
    ///
    /// Restores the pre-review times when an action had rewritten them,
    /// then removes the stamp. Once the media has been re-cut against the
    /// edited times the undo is refused; a manual edit back to the old
    /// range queues a fresh re-cut instead.
    pub async fn undo_review(store: &mut ClipStore, id: &str) -> Result<ClipDocument, DbError> {
        let prior = Self::get(store, id)?
            .review()
            .ok_or_else(|| CoreError::Conflict(format!("clip '{id}' has no review to undo")))?;
        if prior.times_edited && !prior.needs_reprocess {
            return Err(CoreError::Conflict(format!(
                "clip '{id}' was already reprocessed against its edited times; \
                 edit the times instead of undoing"
            ))
            .into());
        }

        let updated = update_document(store, id, |doc| {
            if prior.times_edited {
                doc.restore_times(
                    prior.previous_start_time_seconds,
                    prior.previous_end_time_seconds,
                );
            }
            doc.clear_review();
            Ok(())
        })
        .await?;

        tracing::info!(
            clip_id = %id,
            status = %prior.status,
            restored_times = prior.times_edited,
            "Undid clip review",
        );
        Ok(updated)
    }

    async fn stamp_without_edit(
        store: &mut ClipStore,
        id: &str,
        status: ReviewStatus,
        actor: &str,
        note: Option<&str>,
    ) -> Result<ClipDocument, DbError> {
        let actor = require_actor(actor)?;
        let note = note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let updated = update_document(store, id, |doc| {
            let mut review = next_review(doc, status, actor.clone(), false);
            review.note = note;
            doc.set_review(&review)
        })
        .await?;

        tracing::info!(clip_id = %id, actor = %actor, status = %status, "Recorded clip review");
        Ok(updated)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: &str) -> DbError {
    CoreError::NotFound {
        entity: ENTITY,
        id: id.to_string(),
    }
    .into()
}

fn require_actor(actor: &str) -> Result<String, CoreError> {
    let trimmed = actor.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "reviewer name must not be blank".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// The range a proposal would write, checked for use as clip times.
fn repair_range(proposal: &RepairProposal) -> Result<(Seconds, Seconds), CoreError> {
    let (start, end) = proposal.proposed_range().ok_or_else(|| {
        CoreError::Validation(format!(
            "no repair values proposed for clip '{}'; edit the times manually",
            proposal.clip_id
        ))
    })?;
    check_times(start, end)?;
    Ok((start, end))
}

fn write_repair(
    doc: &mut ClipDocument,
    proposal: &RepairProposal,
    start: Seconds,
    end: Seconds,
    actor: &str,
) -> Result<(), serde_json::Error> {
    let mut review = next_review(doc, ReviewStatus::Repaired, actor.to_string(), true);
    review.finding_kind = Some(proposal.kind);
    review.rationale = Some(proposal.rationale.clone());
    doc.set_times(start, end);
    doc.set_review(&review)
}

/// Apply one proposal in memory, returning the replaced document.
fn stage_repair(
    store: &mut ClipStore,
    proposal: &RepairProposal,
    actor: &str,
) -> Result<(usize, ClipDocument), DbError> {
    let (start, end) = repair_range(proposal)?;
    let index = store
        .position(&proposal.clip_id)
        .ok_or_else(|| not_found(&proposal.clip_id))?;

    let mut updated = store.documents[index].clone();
    write_repair(&mut updated, proposal, start, end, actor).map_err(|source| DbError::Json {
        path: store.path().to_path_buf(),
        source,
    })?;
    Ok((index, std::mem::replace(&mut store.documents[index], updated)))
}

fn check_times(start: Seconds, end: Seconds) -> Result<(), CoreError> {
    for (field, value) in [(TimeField::Start, start), (TimeField::End, end)] {
        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::Validation(format!(
                "{field} time must be a non-negative number of seconds, got {value}"
            )));
        }
    }
    Ok(())
}

/// Build the stamp for a new action.
///
/// Pre-review times are captured on the first action that rewrites them and
/// carried forward by every later action, so undo always returns to the
/// unreviewed state.
fn next_review(
    doc: &ClipDocument,
    status: ReviewStatus,
    actor: String,
    edits_times: bool,
) -> ClipReview {
    let mut review = ClipReview {
        status,
        reviewed_by: actor,
        reviewed_at: chrono::Utc::now(),
        times_edited: false,
        previous_start_time_seconds: None,
        previous_end_time_seconds: None,
        finding_kind: None,
        rationale: None,
        note: None,
        needs_reprocess: false,
    };

    match doc.review().filter(|prior| prior.times_edited) {
        Some(prior) => {
            review.times_edited = true;
            review.previous_start_time_seconds = prior.previous_start_time_seconds;
            review.previous_end_time_seconds = prior.previous_end_time_seconds;
            review.needs_reprocess = prior.needs_reprocess;
        }
        None if edits_times => {
            let record = doc.time_record();
            let recorded = |field: TimeField, value: Seconds| {
                (!record.coerced_fields.contains(&field)).then_some(value)
            };
            review.times_edited = true;
            review.previous_start_time_seconds =
                recorded(TimeField::Start, record.start_time_seconds);
            review.previous_end_time_seconds = recorded(TimeField::End, record.end_time_seconds);
        }
        None => {}
    }

    if edits_times {
        review.needs_reprocess = true;
    }
    review
}

/// Mutate one document and persist the store.
///
/// The change is applied to a copy; if saving fails the in-memory store is
/// left exactly as it was.
async fn update_document<F>(
    store: &mut ClipStore,
    id: &str,
    mutate: F,
) -> Result<ClipDocument, DbError>
where
    F: FnOnce(&mut ClipDocument) -> Result<(), serde_json::Error>,
{
    let index = store.position(id).ok_or_else(|| not_found(id))?;

    let mut updated = store.documents[index].clone();
    mutate(&mut updated).map_err(|source| DbError::Json {
        path: store.path().to_path_buf(),
        source,
    })?;

    let original = std::mem::replace(&mut store.documents[index], updated);
    if let Err(err) = store.save().await {
        tracing::error!(clip_id = %id, error = %err, "Failed to persist clip review");
        store.documents[index] = original;
        return Err(err);
    }
    Ok(store.documents[index].clone())
}
