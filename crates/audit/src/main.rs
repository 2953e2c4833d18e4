//! `testimony-audit` -- offline clip time-range audit.
//!
//! Validates the clip store, writes `clip-audit-report.json` and
//! `clip-repair-proposals.json`, and with `AUDIT_APPLY_SAFE=true` writes the
//! safe repairs back. See [`testimony_audit::config::AuditConfig`] for the
//! environment variables.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use testimony_audit::config::AuditConfig;
use testimony_audit::runner;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "testimony_audit=info,testimony_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AuditConfig::from_env().unwrap_or_else(|err| {
        tracing::error!(error = %format!("{err:#}"), "Invalid audit configuration");
        std::process::exit(2);
    });

    match runner::run(&config).await {
        Ok(outcome) => {
            tracing::info!(
                run_id = %outcome.run_id,
                flagged = outcome.summary.flagged,
                proposals = outcome.proposals,
                applied = outcome.applied.len(),
                report = %outcome.report_path.display(),
                "Audit finished",
            );
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "Audit failed");
            std::process::exit(1);
        }
    }
}
