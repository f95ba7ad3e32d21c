use http::{HeaderMap, Method};

/// A request as the session sees it just before its headers go on the wire
#[derive(Debug, Clone)]
pub struct RequestDetails {
    pub method: Method,
    pub url: String,
    pub request_headers: HeaderMap,
}

/// Headers the session will actually send
#[derive(Debug, Clone)]
pub struct BeforeSendResponse {
    pub request_headers: HeaderMap,
}

/// Synchronous hook invoked once per outbound request with a mutable view of
/// its headers.
///
/// Implementations must not block and must not panic; whatever they leave in
/// `headers` is what gets sent.
pub trait BeforeSendHeaders: Send + Sync {
    fn before_send_headers(&self, url: &str, headers: &mut HeaderMap);
}
