use crate::error::ShellError;
use crate::proxy::http_result::{HttpError, HttpResult};
use crate::proxy::synthetic_response::full_body;
use crate::session::{NetworkSession, OutboundRequest};
use http::header::{CONNECTION, CONTENT_LENGTH, HOST};
use http::{HeaderMap, HeaderName, Method, Request, Response};
use http_body_util::{combinators::BoxBody, BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use std::sync::Arc;
use tracing::{debug, warn};

type RespBody = BoxBody<bytes::Bytes, hyper::Error>;

/// Headers that describe a single hop and are never forwarded
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Everything a proxy connection needs to forward a request
#[derive(Clone)]
pub struct ProxyContext {
    pub session: Arc<NetworkSession>,
    pub max_body_bytes: usize,
}

/// Remove hop-by-hop headers, including any named in `Connection`
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Absolute URL the renderer asked for. Only absolute-form `http`/`https`
/// requests are proxied.
pub fn target_url<B>(req: &Request<B>) -> HttpResult<String> {
    if req.method() == Method::CONNECT {
        return Err(HttpError::TunnelNotSupported);
    }

    let uri = req.uri();
    match (uri.scheme_str(), uri.authority()) {
        (Some("http" | "https"), Some(_)) => Ok(uri.to_string()),
        (Some(scheme), Some(_)) => Err(HttpError::InvalidUri(format!("unsupported scheme {scheme}"))),
        _ => Err(HttpError::InvalidUri(format!("expected an absolute URL, got {uri}"))),
    }
}

pub async fn forward<B>(req: Request<B>, ctx: &ProxyContext) -> HttpResult<Response<RespBody>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let url = target_url(&req)?;
    let (parts, body) = req.into_parts();

    let body = match Limited::new(body, ctx.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(HttpError::PayloadTooLarge(ctx.max_body_bytes));
        }
        Err(e) => return Err(HttpError::InvalidRequestBody(e.to_string())),
    };

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    // Re-derived by the session from the URL and the buffered body
    headers.remove(HOST);
    headers.remove(CONTENT_LENGTH);

    debug!(method = %parts.method, url = %url, "forwarding renderer request");

    let outbound = OutboundRequest { method: parts.method, url, headers, body };
    let upstream = ctx.session.send(outbound).await.map_err(|e| match e {
        ShellError::Upstream(e) if e.is_timeout() => HttpError::UpstreamTimeout(e.to_string()),
        ShellError::InvalidUrl(msg) => HttpError::InvalidUri(msg),
        other => HttpError::FailedToGetResponseFromBackend(other.to_string()),
    })?;

    let status = upstream.status();
    let mut resp_headers = upstream.headers().clone();
    strip_hop_by_hop(&mut resp_headers);

    let bytes = upstream.bytes().await.map_err(|e| {
        warn!(error = %e, "failed to read upstream response body");
        if e.is_timeout() {
            HttpError::UpstreamTimeout(e.to_string())
        } else {
            HttpError::FailedToGetResponseFromBackend(e.to_string())
        }
    })?;

    let mut resp = Response::builder()
        .status(status)
        .body(full_body(bytes))
        .map_err(|e| HttpError::FailedToGenerateDownstreamResponse(e.to_string()))?;
    *resp.headers_mut() = resp_headers;
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn strips_fixed_and_listed_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive, x-session-hop"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("proxy-authorization", HeaderValue::from_static("Basic abc"));
        headers.insert("x-session-hop", HeaderValue::from_static("1"));
        headers.insert("authorization", HeaderValue::from_static("Bearer t"));
        headers.insert("accept", HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 2);
        assert!(headers.contains_key("authorization"));
        assert!(headers.contains_key("accept"));
    }

    #[test]
    fn absolute_form_is_accepted() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let req = Request::get("http://jira.example.com/rest/api/2/issue?x=1").body(())?;
        assert_eq!(target_url(&req)?, "http://jira.example.com/rest/api/2/issue?x=1");
        Ok(())
    }

    #[test]
    fn origin_form_is_rejected() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let req = Request::get("/rest/api/2/issue").body(())?;
        assert!(matches!(target_url(&req), Err(HttpError::InvalidUri(_))));
        Ok(())
    }

    #[test]
    fn connect_is_rejected() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let req = Request::builder()
            .method(Method::CONNECT)
            .uri("jira.example.com:443")
            .body(())?;
        assert!(matches!(target_url(&req), Err(HttpError::TunnelNotSupported)));
        Ok(())
    }

    #[test]
    fn other_schemes_are_rejected() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let req = Request::get("ftp://files.example.com/a").body(())?;
        assert!(matches!(target_url(&req), Err(HttpError::InvalidUri(_))));
        Ok(())
    }
}
