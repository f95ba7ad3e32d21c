use http::{HeaderMap, HeaderName, HeaderValue};

/// Desktop Chrome issuing a same-origin fetch/XHR call.
///
/// Names are lowercase so they can be turned into `HeaderName`s without
/// parsing.
const CHROME_DESKTOP_FETCH: &[(&str, &str)] = &[
    ("user-agent", "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"),
    ("accept", "application/json, text/plain, */*"),
    ("accept-language", "en-US,en;q=0.9"),
    ("sec-ch-ua", r#""Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24""#),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", r#""macOS""#),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-origin"),
    // Hop-by-hop: reaches HTTP/1.1 upstreams only, hyper drops it on HTTP/2
    ("connection", "keep-alive"),
];

/// Fixed set of headers written over a matching request so it reads as a
/// stand-alone browser session rather than an embedded shell.
#[derive(Debug, Clone)]
pub struct HeaderOverrideSet {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderOverrideSet {
    /// The fingerprint the shell impersonates
    pub fn chrome_desktop() -> Self {
        let headers = CHROME_DESKTOP_FETCH
            .iter()
            .map(|&(name, value)| (HeaderName::from_static(name), HeaderValue::from_static(value)))
            .collect();
        Self { headers }
    }

    /// Overwrite every override key on `headers`, replacing all existing
    /// values for that name. Headers outside the set are left alone.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

impl Default for HeaderOverrideSet {
    fn default() -> Self {
        Self::chrome_desktop()
    }
}
