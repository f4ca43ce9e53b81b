use postsync_core::{Post, PostSyncEngine, RemoteStore};

use crate::error::CliError;

pub async fn run_track<R: RemoteStore>(
    engine: &PostSyncEngine<R>,
    server_id: i64,
) -> Result<Post, CliError> {
    if !engine.is_online() {
        return Err(CliError::Offline("track"));
    }

    let remote = engine.remote().get(server_id).await?;
    let post = engine.track_remote_post(&remote).await?;
    println!("{}", post.local_id);
    Ok(post)
}
