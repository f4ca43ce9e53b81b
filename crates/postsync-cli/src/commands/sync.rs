use postsync_core::{DrainSummary, PostSyncEngine, RemoteStore};

use crate::error::CliError;

pub async fn run_sync<R: RemoteStore>(engine: &PostSyncEngine<R>) -> Result<DrainSummary, CliError> {
    if !engine.is_online() {
        return Err(CliError::Offline("sync"));
    }

    let summary = engine.drain_pending().await?;
    for line in format_summary_lines(&summary) {
        println!("{line}");
    }
    Ok(summary)
}

pub fn format_summary_lines(summary: &DrainSummary) -> Vec<String> {
    if summary.attempted() == 0 {
        return vec!["Nothing to sync".to_string()];
    }

    let mut lines = vec![format!(
        "Synced {} post(s), {} failed",
        summary.success, summary.failure
    )];
    lines.extend(summary.errors.iter().map(|error| format!("  {error}")));
    lines
}
