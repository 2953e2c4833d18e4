//! Route definitions for the `/clip-audit` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::clip_audit;
use crate::state::AppState;

/// Routes mounted at `/clip-audit`.
///
/// ```text
/// GET    /report                      -> get_report      (?episode, ?include_resolved, ?sort)
/// POST   /validate                    -> validate        (dry-run)
/// GET    /repairs                     -> list_repairs    (?episode)
/// GET    /reprocess-queue             -> reprocess_queue
/// GET    /clips/{id}                  -> get_clip
/// POST   /clips/{id}/apply-repair     -> apply_repair
/// POST   /clips/{id}/false-positive   -> mark_false_positive
/// POST   /clips/{id}/defer            -> defer
/// PUT    /clips/{id}/times            -> edit_times
/// POST   /clips/{id}/reprocessed      -> mark_reprocessed
/// POST   /clips/{id}/undo             -> undo_review
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/report", get(clip_audit::get_report))
        .route("/validate", post(clip_audit::validate))
        .route("/repairs", get(clip_audit::list_repairs))
        .route("/reprocess-queue", get(clip_audit::reprocess_queue))
        .route("/clips/{id}", get(clip_audit::get_clip))
        .route("/clips/{id}/apply-repair", post(clip_audit::apply_repair))
        .route(
            "/clips/{id}/false-positive",
            post(clip_audit::mark_false_positive),
        )
        .route("/clips/{id}/defer", post(clip_audit::defer))
        .route("/clips/{id}/times", put(clip_audit::edit_times))
        .route("/clips/{id}/reprocessed", post(clip_audit::mark_reprocessed))
        .route("/clips/{id}/undo", post(clip_audit::undo_review))
}
