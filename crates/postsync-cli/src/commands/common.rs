use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use postsync_core::{
    parse_client_config, ClientConfig, ConnectivitySignal, DatabaseService, HttpRemoteStore,
    MergedEntry, MergedView, Post, PostId, PostSyncEngine,
};
use serde::Serialize;

use crate::error::CliError;

const ID_PREFIX_MATCH_LIMIT: usize = 3;

/// Engine wired to the HTTP remote store
pub type HttpEngine = PostSyncEngine<HttpRemoteStore>;

/// Settings resolved from global flags, config file, and environment
#[derive(Debug, Clone)]
pub struct AppContext {
    pub db_path: PathBuf,
    pub config: ClientConfig,
    pub offline: bool,
}

#[derive(Debug, Serialize)]
pub struct PostListItem {
    pub source: &'static str,
    pub local_id: Option<String>,
    pub server_id: Option<i64>,
    pub title: String,
    pub body: String,
    pub status: String,
    pub last_sync_error: Option<String>,
    pub relative_time: Option<String>,
}

pub async fn open_engine(context: &AppContext) -> Result<HttpEngine, CliError> {
    let store = DatabaseService::open_path(&context.db_path).await?;
    let remote = HttpRemoteStore::new(
        context.config.api_base_url.clone(),
        context.config.http_timeout(),
    )?;
    if context.offline {
        tracing::info!("Offline mode: changes will be queued locally");
    }

    Ok(PostSyncEngine::new(
        store,
        Arc::new(remote),
        Arc::new(ConnectivitySignal::new(!context.offline)),
        context.config.engine(),
    ))
}

/// Config file (explicit, else the default location if present), then env overrides.
pub fn load_client_config(path: Option<&Path>) -> Result<ClientConfig, CliError> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| default_config_path().filter(|path| path.exists()));

    let mut config = match path {
        Some(path) => {
            let payload = std::fs::read_to_string(&path).map_err(|error| {
                CliError::Config(format!("failed to read {}: {error}", path.display()))
            })?;
            parse_client_config(&payload)
                .map_err(|error| CliError::Config(format!("{}: {error}", path.display())))?
        }
        None => ClientConfig::default(),
    };

    config
        .apply_env_overrides(|key| env::var(key).ok())
        .map_err(|error| CliError::Config(error.to_string()))?;
    config
        .validate()
        .map_err(|error| CliError::Config(error.to_string()))
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("postsync").join("config.json"))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("POSTSYNC_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("postsync")
        .join("postsync.db")
}

/// Resolve a full local id or a unique prefix of one.
pub async fn resolve_post(query: &str, store: &DatabaseService) -> Result<Post, CliError> {
    let query = normalize_post_identifier(query)?;

    if let Ok(local_id) = query.parse::<PostId>() {
        if let Some(post) = store.fetch_post(&local_id).await? {
            return Ok(post);
        }
    }

    let matching_ids = store
        .list_post_ids_by_prefix(&query, ID_PREFIX_MATCH_LIMIT)
        .await?;
    match matching_ids.as_slice() {
        [] => Err(CliError::PostNotFound(query)),
        [only] => {
            let local_id = only
                .parse::<PostId>()
                .map_err(|_| CliError::PostNotFound(query.clone()))?;
            store
                .fetch_post(&local_id)
                .await?
                .ok_or(CliError::PostNotFound(query))
        }
        many => {
            let options = many
                .iter()
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousPostId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn normalize_post_identifier(id: &str) -> Result<String, CliError> {
    normalize_content(id).ok_or(CliError::EmptyPostId)
}

pub fn format_post_lines(view: &MergedView) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    view.iter()
        .map(|entry| {
            let preview = post_preview(entry.title(), 40);
            match entry {
                MergedEntry::Local(post) => {
                    let id = short_id(&post.local_id.to_string());
                    let status = post.sync_status.as_str();
                    let relative_time = format_relative_time(post.updated_at, now_ms);
                    format!("{id:<13}  {status:<10}  {preview:<40}  {relative_time}")
                }
                MergedEntry::Remote(remote) => {
                    let id = format!("#{}", remote.id);
                    format!("{id:<13}  {:<10}  {preview}", "remote")
                }
            }
        })
        .collect()
}

pub fn merged_entry_to_item(entry: &MergedEntry) -> PostListItem {
    match entry {
        MergedEntry::Local(post) => post_to_item(post),
        MergedEntry::Remote(remote) => PostListItem {
            source: "remote",
            local_id: None,
            server_id: Some(remote.id),
            title: remote.title.clone(),
            body: remote.body.clone(),
            status: "remote".to_string(),
            last_sync_error: None,
            relative_time: None,
        },
    }
}

pub fn post_to_item(post: &Post) -> PostListItem {
    PostListItem {
        source: "local",
        local_id: Some(post.local_id.to_string()),
        server_id: post.server_id,
        title: post.title.clone(),
        body: post.body.clone(),
        status: post.sync_status.as_str().to_string(),
        last_sync_error: post.last_sync_error.clone(),
        relative_time: Some(format_relative_time(
            post.updated_at,
            Utc::now().timestamp_millis(),
        )),
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn post_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut truncated = collapsed
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect::<String>();
    truncated.push_str("...");
    truncated
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    const MINUTE: i64 = 60_000;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const WEEK: i64 = 7 * DAY;
    const MONTH: i64 = 30 * DAY;
    const YEAR: i64 = 365 * DAY;

    let diff = now_ms.saturating_sub(timestamp_ms);
    match diff {
        d if d < MINUTE => "just now".to_string(),
        d if d < HOUR => format!("{}m ago", d / MINUTE),
        d if d < DAY => format!("{}h ago", d / HOUR),
        d if d < WEEK => format!("{}d ago", d / DAY),
        d if d < MONTH => format!("{}w ago", d / WEEK),
        d if d < YEAR => format!("{}mo ago", d / MONTH),
        d => format!("{}y ago", d / YEAR),
    }
}

pub fn resolve_post_title(title_parts: &[String]) -> Result<String, CliError> {
    normalize_content(&title_parts.join(" ")).ok_or(CliError::EmptyTitle)
}

/// Explicit body, else piped stdin, else empty.
pub fn resolve_post_body(body: Option<String>) -> Result<String, CliError> {
    match body {
        Some(body) => Ok(body.trim().to_string()),
        None => Ok(read_piped_stdin()?.unwrap_or_default()),
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(initial: &str) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_post_file_path();
    std::fs::write(&temp_file, initial)?;

    let launched = launch_editor(&editor, &temp_file);
    let edited = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launched?;
    Ok(normalize_content(&edited))
}

/// Run `$EDITOR`, retrying as a whitespace-split command line (e.g. `code --wait`).
pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    let status = match Command::new(editor).arg(file_path).status() {
        Ok(status) => status,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };
            Command::new(program).args(parts).arg(file_path).status()?
        }
        Err(err) => return Err(CliError::Io(err)),
    };
    check_editor_status(editor, status)
}

fn check_editor_status(editor: &str, status: ExitStatus) -> Result<(), CliError> {
    if status.success() {
        Ok(())
    } else {
        Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        )))
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_post_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("postsync-post-{}-{now}.md", std::process::id()))
}
