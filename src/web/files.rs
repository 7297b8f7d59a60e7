//! Reading memes and templates back off disk for `/get-meme`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, IF_MODIFIED_SINCE, LAST_MODIFIED};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use httpdate::{fmt_http_date, parse_http_date};
use tracing::debug;

use crate::constants::MEME_CACHE_CONTROL;
use crate::error::MemeError;

/// Maps a requested path onto `root`. Only plain relative paths are allowed,
/// nothing absolute and no `..`.
pub(crate) fn resolve_requested_path(root: &Path, requested: &str) -> Result<PathBuf, MemeError> {
    let relative = Path::new(requested);
    if requested.is_empty() {
        return Err(MemeError::BadRequest);
    }
    let plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !plain {
        debug!("Rejecting meme path {:?}", requested);
        return Err(MemeError::BadRequest);
    }
    Ok(root.join(relative))
}

/// File mtime truncated to whole seconds, the resolution of HTTP dates.
fn last_modified(modified: SystemTime) -> SystemTime {
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// True when the client's copy is at least as new as the file.
fn client_copy_is_current(headers: &HeaderMap, last_modified: SystemTime) -> bool {
    headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| parse_http_date(value).ok())
        .is_some_and(|since| last_modified <= since)
}

fn not_found(path: &Path) -> MemeError {
    MemeError::NotFound(path.display().to_string())
}

/// Serves a file as `image/jpeg`, answering `If-Modified-Since` with 304.
pub(crate) async fn serve_meme_file(path: &Path, headers: &HeaderMap) -> Result<Response, MemeError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|err| match err.kind() {
        ErrorKind::NotFound => not_found(path),
        _ => MemeError::Io(err),
    })?;
    if !metadata.is_file() {
        return Err(not_found(path));
    }

    let modified = metadata.modified().ok().map(last_modified);
    let mut cache_headers = vec![(CACHE_CONTROL, MEME_CACHE_CONTROL.to_string())];
    if let Some(modified) = modified {
        cache_headers.push((LAST_MODIFIED, fmt_http_date(modified)));
    }
    let cache_headers = AppendHeaders(cache_headers);

    if modified.is_some_and(|modified| client_copy_is_current(headers, modified)) {
        return Ok((StatusCode::NOT_MODIFIED, cache_headers).into_response());
    }

    let bytes = tokio::fs::read(path).await.map_err(|err| match err.kind() {
        ErrorKind::NotFound => not_found(path),
        _ => MemeError::Io(err),
    })?;
    Ok((cache_headers, [(CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}
