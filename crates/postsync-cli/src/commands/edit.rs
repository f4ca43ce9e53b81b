use postsync_core::{Post, PostSyncEngine, RemoteStore};

use crate::commands::common::{capture_editor_input_with_initial, resolve_post};
use crate::error::CliError;

pub async fn run_edit<R: RemoteStore>(
    engine: &PostSyncEngine<R>,
    id: &str,
    title: Option<String>,
    body: Option<String>,
) -> Result<Post, CliError> {
    let post = resolve_post(id, engine.store()).await?;

    let (title, body) = if title.is_none() && body.is_none() {
        let Some(edited) = capture_editor_input_with_initial(&post.body)? else {
            return Err(CliError::EmptyEditedBody);
        };
        if edited == post.body {
            println!("{}", post.local_id);
            return Ok(post);
        }
        (None, Some(edited))
    } else {
        (title, body)
    };

    let updated = engine.update_post(&post.local_id, title, body).await?;
    println!("{}", updated.local_id);
    if let Some(error) = &updated.last_sync_error {
        eprintln!("Saved locally; queued for sync ({error})");
    }
    Ok(updated)
}
