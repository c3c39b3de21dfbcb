// src/logging_middleware.rs
//! Middleware for logging requests and responses in debug mode
//!
//! Headers are never logged, so bearer tokens stay out of the logs.

use axum::body::to_bytes;
use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, enabled, Level};

/// Logs method, uri, status and elapsed time; JSON bodies are included at debug level
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !enabled!(Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let uri = parts.uri.clone();

    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(body) = render_body(&bytes) {
        debug!(method = %method, uri = %uri, request_body = %body, "📥 Request");
    }

    let response = next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .await;

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    debug!(
        method = %method,
        uri = %uri,
        status = %parts.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        response_body = %render_body(&bytes).unwrap_or_default(),
        "📤 Response"
    );

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

/// Pretty-prints JSON bodies, falls back to the raw text; empty or binary bodies are skipped
fn render_body(bytes: &Bytes) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let text = std::str::from_utf8(bytes).ok()?;
    Some(
        serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
            .unwrap_or_else(|| text.to_string()),
    )
}
