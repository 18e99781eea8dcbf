//! Request logging tap.
//!
//! Runs ahead of the permission filter and the route chain, emitting
//! one [`Event::Log`] per request without altering the request.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::extract::{ConnectInfo, FromRequestParts, RawPathParams, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::lifecycle::events::{Event, RequestLog};
use crate::routes::AppState;

/// Bodies above this size are passed through without being captured in
/// the log record.
const BODY_LOG_LIMIT: usize = 64 * 1024;

pub async fn request_log(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    // Path params are bound by the router before layered middleware
    // runs; unmatched requests simply have none.
    let params: BTreeMap<String, String> =
        match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Err(_) => BTreeMap::new(),
        };

    let query: BTreeMap<String, String> = parts
        .uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let ip = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string());

    // Buffer small bodies so they can appear in the log record, then
    // hand them onwards untouched. Bodies without a declared length or
    // above the limit are not captured.
    let declared_len = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    let (body, body_text) = match declared_len {
        Some(len) if len > 0 && len <= BODY_LOG_LIMIT => {
            match to_bytes(body, BODY_LOG_LIMIT).await {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    (Body::from(bytes), text)
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to buffer request body for log");
                    (Body::empty(), String::new())
                }
            }
        }
        _ => (body, String::new()),
    };

    let log = RequestLog {
        body: body_text,
        ip,
        method: parts.method.to_string(),
        url: parts.uri.to_string(),
        query,
        params,
    };
    state.events.emit(Event::Log(log));

    next.run(Request::from_parts(parts, body)).await
}
