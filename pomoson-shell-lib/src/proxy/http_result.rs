use http::StatusCode;
use thiserror::Error;

use crate::telemetry::metrics::values;

/// HTTP result type, T is typically a hyper::Response
/// HttpError is used to generate a synthetic error response
pub(crate) type HttpResult<T> = std::result::Result<T, HttpError>;

/// Describes things that can go wrong while forwarding a renderer request
#[derive(Debug, Error, Clone)]
pub enum HttpError {
    #[error("CONNECT tunnels are not supported")]
    TunnelNotSupported,

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Failed to read request body: {0}")]
    InvalidRequestBody(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Failed to get response from upstream: {0}")]
    FailedToGetResponseFromBackend(String),

    #[error("Failed to generate downstream response: {0}")]
    FailedToGenerateDownstreamResponse(String),
}

impl HttpError {
    pub fn error_type(&self) -> &'static str {
        match self {
            HttpError::UpstreamTimeout(_) => values::ERROR_TIMEOUT,
            _ => values::ERROR_OTHER,
        }
    }
}

impl From<HttpError> for StatusCode {
    fn from(e: HttpError) -> StatusCode {
        match e {
            HttpError::TunnelNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            HttpError::InvalidUri(_) => StatusCode::BAD_REQUEST,
            HttpError::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            HttpError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            HttpError::FailedToGetResponseFromBackend(_) => StatusCode::BAD_GATEWAY,
            HttpError::FailedToGenerateDownstreamResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
