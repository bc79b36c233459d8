//! The five operations of spec.md §4.6, wired to HTTP verbs and paths.
use std::collections::HashMap;

use async_stream::stream;
use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use fileway_core::config::PING_TIMEOUT;

use crate::blocklist::{is_cli_downloader, is_user_agent_blocklisted};
use crate::error::ServerError;
use crate::state::AppState;

const SECRET_HEADER: &str = "x-fileway-secret";

fn header_secret(headers: &HeaderMap) -> String {
    headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

/// `GET /setup?filename=&size=&txt=1&forced_id=`
pub async fn setup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, ServerError> {
    let secret = header_secret(&headers);
    if !state.auth.authenticate(&secret) {
        return Err(ServerError::Unauthorized);
    }

    let is_text = params.get("txt").map(|v| v == "1").unwrap_or(false);

    let filename = if is_text {
        format!("fileway_{}.txt", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        params
            .get("filename")
            .filter(|f| !f.is_empty())
            .ok_or_else(|| ServerError::BadRequest("missing parameter 'filename'".into()))?
            .clone()
    };

    let size: u64 = params
        .get("size")
        .ok_or_else(|| ServerError::BadRequest("missing parameter 'size'".into()))?
        .parse()
        .map_err(|_| ServerError::BadRequest("parameter 'size' is not a positive integer".into()))?;

    if size == 0 {
        return Err(ServerError::BadRequest("parameter 'size' must be positive".into()));
    }

    let forced_id = params.get("forced_id").filter(|f| !f.is_empty()).cloned();

    let id = state
        .conduits
        .new_conduit(is_text, filename, size, secret, forced_id)?;

    Ok(id)
}

/// `GET /ping/:id`
pub async fn ping(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<u64>>, ServerError> {
    let conduit = state
        .conduits
        .get_conduit(&id)
        .ok_or_else(|| ServerError::Conduit(fileway_core::ConduitError::NotFound(id.clone())))?;

    let secret = header_secret(&headers);
    if conduit.is_upload_secret_wrong(&secret) {
        return Err(ServerError::Unauthorized);
    }

    if conduit.latch.wait(PING_TIMEOUT).await && conduit.download_started() {
        Ok(Json(conduit.chunk_plan.clone()))
    } else {
        Ok(Json(Vec::new()))
    }
}

/// `POST /ul/:id`
pub async fn ul(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ServerError> {
    let conduit = state
        .conduits
        .get_conduit(&id)
        .ok_or_else(|| ServerError::Conduit(fileway_core::ConduitError::NotFound(id.clone())))?;

    let secret = header_secret(&headers);
    if conduit.is_upload_secret_wrong(&secret) {
        return Err(ServerError::Unauthorized);
    }

    conduit.offer(body).await?;
    Ok(StatusCode::OK)
}

/// `GET /ddl/:id` — streams the payload, then deletes the conduit.
///
/// The conduit (and with it the `sender` half of the chunk channel) must
/// stay alive for the whole drain: dropping it early closes the channel and
/// truncates the body. The `Arc<Conduit>` is moved into the stream itself so
/// it only drops once the loop below has pulled `size` bytes, and the
/// registry entry is removed only after that loop finishes.
pub async fn ddl(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServerError> {
    let conduit = state
        .conduits
        .get_conduit(&id)
        .ok_or_else(|| ServerError::Conduit(fileway_core::ConduitError::NotFound(id.clone())))?;

    conduit.download()?;

    let receiver = conduit
        .take_receiver()
        .await
        .expect("download() succeeded so the receiver has not been taken yet");

    let content_type = if conduit.is_text {
        "text/plain"
    } else {
        "application/octet-stream"
    };
    let content_disposition = format!("attachment; filename=\"{}\"", conduit.filename);
    let target_size = conduit.size;

    let conduits = state.conduits.clone();
    let body = Body::from_stream(stream! {
        let _conduit = conduit;
        let mut receiver = receiver;
        let mut transferred: u64 = 0;
        while transferred < target_size {
            match receiver.recv().await {
                Some(chunk) => {
                    transferred += chunk.len() as u64;
                    yield Ok::<_, std::io::Error>(chunk);
                }
                None => break,
            }
        }
        conduits.del_conduit(&id);
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .header(header::CONTENT_LENGTH, target_size)
        .body(body)
        .expect("a well-formed response");

    Ok(response)
}

/// `GET /cleanup/:id` — authenticated, explicit abandonment.
pub async fn cleanup(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ServerError> {
    let secret = header_secret(&headers);
    if !state.auth.authenticate(&secret) {
        return Err(ServerError::Unauthorized);
    }
    state.conduits.del_conduit(&id);
    Ok(StatusCode::OK)
}

/// `GET /dl/:id` — HTML landing page, or delegates to `ddl` for known CLI
/// downloaders' user agents. Known crawler/bot user agents are turned away
/// with a plain 404 instead of either the landing page or the file, so they
/// neither index nor count as the one admitted download.
pub async fn dl(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if is_user_agent_blocklisted(user_agent) {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    if is_cli_downloader(user_agent) {
        return ddl(State(state), Path(id)).await;
    }

    let conduit = state
        .conduits
        .get_conduit(&id)
        .ok_or_else(|| ServerError::Conduit(fileway_core::ConduitError::NotFound(id.clone())))?;

    let page = crate::assets::render_download_page(&conduit.filename, human_readable_size(conduit.size));
    Ok(Html(page).into_response())
}

/// Mirrors the source's `utils.HumanReadableSize`.
fn human_readable_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        n /= UNIT;
        div *= UNIT;
        exp += 1;
    }
    let units = ['K', 'M', 'G', 'T'];
    format!("{:.1} {}B", bytes as f64 / div as f64, units[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_readable_size_matches_source_formatting() {
        assert_eq!(human_readable_size(500), "500 B");
        assert_eq!(human_readable_size(1536), "1.5 KB");
        assert_eq!(human_readable_size(10_000_000), "9.5 MB");
    }
}
