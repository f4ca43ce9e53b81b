use postsync_core::{MergedView, PostSyncEngine, RemoteStore};

use crate::commands::common::{format_post_lines, merged_entry_to_item, PostListItem};
use crate::error::CliError;

/// Merge local posts with remote page `page`.
///
/// When the page cannot be fetched the local posts are still listed.
pub async fn load_view<R: RemoteStore>(
    engine: &PostSyncEngine<R>,
    page: usize,
    size: usize,
) -> Result<MergedView, CliError> {
    if !engine.is_online() {
        return Ok(engine.refresh_merged_view().await?);
    }

    match engine.get_merged_view(page, size).await {
        Ok(view) => Ok(view),
        Err(postsync_core::Error::Remote(error)) => {
            tracing::warn!("Showing local posts only: {error}");
            eprintln!("Remote page unavailable ({error}); showing local posts only");
            Ok(engine.refresh_merged_view().await?)
        }
        Err(error) => Err(error.into()),
    }
}

pub async fn run_list<R: RemoteStore>(
    engine: &PostSyncEngine<R>,
    page: usize,
    size: Option<usize>,
    as_json: bool,
) -> Result<MergedView, CliError> {
    let size = size.unwrap_or(engine.config().page_size);
    let view = load_view(engine, page, size).await?;

    if as_json {
        let items = view
            .iter()
            .map(merged_entry_to_item)
            .collect::<Vec<PostListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if view.is_empty() {
        println!("No posts.");
    } else {
        for line in format_post_lines(&view) {
            println!("{line}");
        }
    }

    Ok(view)
}
