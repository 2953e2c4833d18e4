pub mod clip_audit;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /clip-audit/report                           validate stored clips (GET)
/// /clip-audit/validate                         dry-run over posted documents (POST)
/// /clip-audit/repairs                          repair proposals (GET)
/// /clip-audit/reprocess-queue                  clips awaiting a re-cut (GET)
/// /clip-audit/clips/{id}                       clip detail with finding (GET)
/// /clip-audit/clips/{id}/apply-repair          apply server-side proposal (POST)
/// /clip-audit/clips/{id}/false-positive        dismiss finding (POST)
/// /clip-audit/clips/{id}/defer                 keep open for later (POST)
/// /clip-audit/clips/{id}/times                 manual edit (PUT)
/// /clip-audit/clips/{id}/reprocessed           confirm re-cut (POST)
/// /clip-audit/clips/{id}/undo                  revert review (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/clip-audit", clip_audit::router())
}
