use postsync_core::{Post, PostSyncEngine, RemoteStore};

use crate::commands::common::{resolve_post_body, resolve_post_title};
use crate::error::CliError;

pub async fn run_add<R: RemoteStore>(
    engine: &PostSyncEngine<R>,
    title_parts: &[String],
    body: Option<String>,
) -> Result<Post, CliError> {
    let title = resolve_post_title(title_parts)?;
    let body = resolve_post_body(body)?;

    let post = engine.create_post(&title, &body).await?;
    println!("{}", post.local_id);
    if let Some(error) = &post.last_sync_error {
        eprintln!("Saved locally; queued for sync ({error})");
    }
    Ok(post)
}
