use postsync_core::{DeleteOutcome, PostSyncEngine, RemoteStore};

use crate::commands::common::resolve_post;
use crate::error::CliError;

pub async fn run_delete<R: RemoteStore>(
    engine: &PostSyncEngine<R>,
    id: &str,
) -> Result<DeleteOutcome, CliError> {
    let post = resolve_post(id, engine.store()).await?;

    let outcome = engine.delete_post(&post.local_id).await?;
    match outcome {
        DeleteOutcome::Removed => println!("{}", post.local_id),
        DeleteOutcome::Queued => println!("{} (delete queued for sync)", post.local_id),
    }
    Ok(outcome)
}
