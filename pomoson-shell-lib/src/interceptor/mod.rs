//! Rewrites the headers of outbound requests aimed at the configured origin.
//!
//! The interceptor runs on every request the shell sends, so it only ever does
//! a registry load, a prefix comparison and, on a match, a bounded number of
//! header inserts. It never fails outward: when the rewrite cannot be built the
//! request goes out untouched.

pub mod matcher;
pub mod overrides;

use http::header::{InvalidHeaderValue, ORIGIN};
use http::{HeaderMap, HeaderValue};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::registry::OriginRegistry;
use crate::session::BeforeSendHeaders;
use crate::telemetry::Metrics;

pub use matcher::origin_matches;
pub use overrides::HeaderOverrideSet;

/// What the interceptor did with one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// No origin configured yet
    Unconfigured,
    /// Origin configured but the URL does not start with it
    NoMatch,
    /// Override set and `Origin` written onto the headers
    Rewritten,
    /// URL matched but the rewrite could not be built; headers untouched
    Fault,
}

pub struct RequestInterceptor {
    registry: Arc<OriginRegistry>,
    overrides: HeaderOverrideSet,
    metrics: Option<Arc<Metrics>>,
}

impl RequestInterceptor {
    pub fn new(registry: Arc<OriginRegistry>, metrics: Option<Arc<Metrics>>) -> Self {
        Self::with_overrides(registry, HeaderOverrideSet::chrome_desktop(), metrics)
    }

    pub fn with_overrides(
        registry: Arc<OriginRegistry>,
        overrides: HeaderOverrideSet,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self { registry, overrides, metrics }
    }

    /// Rewrite `headers` in place when `url` targets the configured origin
    pub fn intercept(&self, url: &str, headers: &mut HeaderMap) -> InterceptOutcome {
        let outcome = self.evaluate(url, headers);
        if let Some(m) = &self.metrics {
            m.record_intercepted(outcome == InterceptOutcome::Rewritten);
            if outcome == InterceptOutcome::Fault {
                m.record_interceptor_fault();
            }
        }
        outcome
    }

    fn evaluate(&self, url: &str, headers: &mut HeaderMap) -> InterceptOutcome {
        let Some(origin) = self.registry.get() else {
            trace!(url, "no origin configured, passing through");
            return InterceptOutcome::Unconfigured;
        };

        if !origin_matches(&origin, url) {
            trace!(url, origin = %origin, "url outside origin, passing through");
            return InterceptOutcome::NoMatch;
        }

        match self.rewrite(&origin, headers) {
            Ok(()) => {
                debug!(url, origin = %origin, "rewrote request headers");
                InterceptOutcome::Rewritten
            }
            Err(e) => {
                warn!(url, error = %e, "origin is not a valid header value, passing through");
                InterceptOutcome::Fault
            }
        }
    }

    // Everything fallible happens before the first write so a fault leaves
    // the headers exactly as they came in.
    fn rewrite(&self, origin: &str, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        let origin_value = HeaderValue::from_str(origin)?;
        self.overrides.apply(headers);
        headers.insert(ORIGIN, origin_value);
        Ok(())
    }
}

impl BeforeSendHeaders for RequestInterceptor {
    fn before_send_headers(&self, url: &str, headers: &mut HeaderMap) {
        self.intercept(url, headers);
    }
}
