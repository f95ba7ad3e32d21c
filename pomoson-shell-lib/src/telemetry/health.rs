use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;
use hyper::StatusCode;
use serde_json::json;

use crate::error::{Result, ShellError};
use crate::registry::OriginRegistry;

type RespBody = BoxBody<Bytes, hyper::Error>;

fn json_response(status: StatusCode, body: serde_json::Value) -> Result<Response<RespBody>> {
    let body_bytes = serde_json::to_vec(&body)
        .map_err(|e| ShellError::Http(format!("Failed to serialize response: {e}")))?;

    let body = Full::new(Bytes::from(body_bytes))
        .map_err(|never| match never {})
        .boxed();

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(body)
        .map_err(|e| ShellError::Http(format!("Failed to build response: {e}")))
}

/// Health check - always 200 while the process runs, reports whether the
/// rewrite origin has been configured
pub fn health_check_response(registry: &OriginRegistry) -> Result<Response<RespBody>> {
    json_response(
        StatusCode::OK,
        json!({"status": "healthy", "origin_configured": registry.is_configured()}),
    )
}

/// Readiness check - the shell forwards traffic whether or not an origin is
/// configured, so it is ready as soon as it answers
pub fn ready_check_response() -> Result<Response<RespBody>> {
    json_response(StatusCode::OK, json!({"status": "ready"}))
}

/// Liveness check - always returns 200 if process is running
pub fn live_check_response() -> Result<Response<RespBody>> {
    json_response(StatusCode::OK, json!({"status": "alive"}))
}
