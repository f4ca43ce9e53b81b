use postsync_core::{DashboardStats, PostSyncEngine, RemoteStore};
use serde::Serialize;

use crate::commands::common::{
    format_relative_time, post_preview, post_to_item, short_id, PostListItem,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct DashboardItem {
    total_count: usize,
    local_only_count: usize,
    needs_sync_count: usize,
    recent: Vec<PostListItem>,
}

pub async fn run_dashboard<R: RemoteStore>(
    engine: &PostSyncEngine<R>,
    as_json: bool,
) -> Result<DashboardStats, CliError> {
    let stats = engine.dashboard_stats().await?;

    if as_json {
        let item = DashboardItem {
            total_count: stats.total_count,
            local_only_count: stats.local_only_count,
            needs_sync_count: stats.needs_sync_count,
            recent: stats.recent.iter().map(post_to_item).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        for line in format_dashboard_lines(&stats, chrono::Utc::now().timestamp_millis()) {
            println!("{line}");
        }
    }
    Ok(stats)
}

pub fn format_dashboard_lines(stats: &DashboardStats, now_ms: i64) -> Vec<String> {
    let mut lines = vec![
        format!("Total:       {}", stats.total_count),
        format!("Local only:  {}", stats.local_only_count),
        format!("Needs sync:  {}", stats.needs_sync_count),
    ];
    if !stats.recent.is_empty() {
        lines.push(String::new());
        lines.push("Recent:".to_string());
        lines.extend(stats.recent.iter().map(|post| {
            format!(
                "  {:<13}  {:<40}  {}",
                short_id(&post.local_id.to_string()),
                post_preview(&post.title, 40),
                format_relative_time(post.updated_at, now_ms)
            )
        }));
    }
    lines
}
