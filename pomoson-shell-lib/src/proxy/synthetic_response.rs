use crate::error::{Result, ShellError};
use http::StatusCode;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;

type RespBody = BoxBody<Bytes, hyper::Error>;

/// Build HTTP response with status code of 4xx and 5xx
pub(crate) fn synthetic_error_response(status_code: StatusCode) -> Result<Response<RespBody>> {
    let res = Response::builder()
        .status(status_code)
        .body(empty_body())
        .map_err(|e| ShellError::Http(format!("Failed to build error response: {e}")))?;
    Ok(res)
}

/// Same as [`synthetic_error_response`] but never fails; falls back to a bare
/// response carrying only the status
pub(crate) fn error_response(status_code: StatusCode) -> Response<RespBody> {
    synthetic_error_response(status_code).unwrap_or_else(|_| {
        let mut resp = Response::new(empty_body());
        *resp.status_mut() = status_code;
        resp
    })
}

pub(crate) fn full_body(bytes: Bytes) -> RespBody {
    Full::new(bytes).map_err(|never| match never {}).boxed()
}

fn empty_body() -> RespBody {
    full_body(Bytes::new())
}
