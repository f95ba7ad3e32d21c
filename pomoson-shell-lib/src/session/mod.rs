//! The shell's network session: the one HTTP client every renderer request
//! goes through, plus the single before-send-headers hook slot.

mod hook;

use bytes::Bytes;
use http::{HeaderMap, Method};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::TimeoutConfig;
use crate::error::{Result, ShellError};
use crate::telemetry::metrics::values;
use crate::telemetry::Metrics;

pub use hook::{BeforeSendHeaders, BeforeSendResponse, RequestDetails};

/// Request handed to [`NetworkSession::send`]
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

pub struct NetworkSession {
    client: reqwest::Client,
    hook: OnceLock<Arc<dyn BeforeSendHeaders>>,
    metrics: Option<Arc<Metrics>>,
}

impl NetworkSession {
    pub fn new(timeouts: &TimeoutConfig, metrics: Option<Arc<Metrics>>) -> Result<Self> {
        // Redirects are surfaced to the renderer as-is; following them here
        // would send follow-up requests past the hook.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(timeouts.connect_ms))
            .timeout(Duration::from_millis(timeouts.request_ms))
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self { client, hook: OnceLock::new(), metrics })
    }

    /// Install the before-send-headers hook. A session carries at most one;
    /// a second registration is refused and leaves the first in place.
    pub fn register_before_send_headers(&self, hook: Arc<dyn BeforeSendHeaders>) -> Result<()> {
        self.hook
            .set(hook)
            .map_err(|_| ShellError::HookAlreadyRegistered)
    }

    pub fn has_hook(&self) -> bool {
        self.hook.get().is_some()
    }

    /// Run the hook over `details` and hand the resulting headers to
    /// `callback`. The callback is invoked exactly once, with the headers
    /// unchanged when no hook is installed.
    pub fn dispatch_before_send<F>(&self, details: RequestDetails, callback: F)
    where
        F: FnOnce(BeforeSendResponse),
    {
        let RequestDetails { url, mut request_headers, .. } = details;
        if let Some(hook) = self.hook.get() {
            hook.before_send_headers(&url, &mut request_headers);
        }
        callback(BeforeSendResponse { request_headers });
    }

    /// Send a request upstream after letting the hook adjust its headers.
    /// The hook sees the URL in its parsed form, exactly as it goes on the wire.
    pub async fn send(&self, request: OutboundRequest) -> Result<reqwest::Response> {
        let OutboundRequest { method, url, headers, body } = request;
        let parsed = reqwest::Url::parse(&url).map_err(|e| ShellError::InvalidUrl(format!("{url}: {e}")))?;

        let details = RequestDetails {
            method: method.clone(),
            url: parsed.as_str().to_owned(),
            request_headers: headers,
        };
        let mut final_headers = HeaderMap::new();
        self.dispatch_before_send(details, |resp| final_headers = resp.request_headers);

        let start = Instant::now();
        let result = self
            .client
            .request(method, parsed)
            .headers(final_headers)
            .body(body)
            .send()
            .await;

        match result {
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), url = %resp.url(), "upstream responded");
                if let Some(m) = &self.metrics {
                    m.record_upstream(resp.status().as_u16(), start.elapsed().as_secs_f64());
                }
                Ok(resp)
            }
            Err(e) => {
                let error_type = if e.is_timeout() {
                    values::ERROR_TIMEOUT
                } else if e.is_connect() {
                    values::ERROR_CONNECT
                } else {
                    values::ERROR_OTHER
                };
                warn!(error = %e, error_type, "upstream request failed");
                if let Some(m) = &self.metrics {
                    m.record_upstream_error(error_type);
                }
                Err(ShellError::Upstream(e))
            }
        }
    }
}
