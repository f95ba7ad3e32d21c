//! Loopback HTTP endpoint for renderers running out of process.
//!
//! `POST /ipc` carries `{"channel": "...", "payload": "..."}`; `GET /ipc/bridge`
//! describes what the renderer is allowed to do. Every request needs the
//! bearer token and must come from a loopback peer.

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body_util::{combinators::BoxBody, BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ControlConfig;
use crate::control::channel::ControlChannel;
use crate::control::message::{IpcEnvelope, CHANNELS};
use crate::error::{Result, ShellError};
use crate::telemetry::metrics::values;
use crate::telemetry::Metrics;

type RespBody = BoxBody<Bytes, hyper::Error>;

/// Upper bound on an IPC request body
pub const MAX_IPC_BODY_BYTES: usize = 64 * 1024;

struct IpcState {
    channel: ControlChannel,
    token: String,
    is_dev: bool,
    metrics: Option<Arc<Metrics>>,
}

fn body(bytes: impl Into<Bytes>) -> RespBody {
    Full::new(bytes.into()).map_err(|never| match never {}).boxed()
}

fn status_response(status: StatusCode) -> Response<RespBody> {
    let mut resp = Response::new(body(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

fn bridge_response(is_dev: bool) -> Result<Response<RespBody>> {
    let payload = serde_json::to_vec(&json!({"is_dev": is_dev, "channels": CHANNELS}))
        .map_err(|e| ShellError::Http(format!("Failed to serialize bridge description: {e}")))?;
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(body(payload))
        .map_err(|e| ShellError::Http(format!("Failed to build response: {e}")))
}

fn token_matches(req: &Request<Incoming>, expected: &str) -> bool {
    let Some(presented) = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return false;
    };
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

impl IpcState {
    fn reject(&self, status: StatusCode, reason: &'static str) -> Response<RespBody> {
        if let Some(m) = &self.metrics {
            m.record_control_rejected(reason);
        }
        status_response(status)
    }

    async fn handle(&self, req: Request<Incoming>, peer: SocketAddr) -> Response<RespBody> {
        if !peer.ip().is_loopback() {
            warn!(%peer, "IPC request from non-loopback peer refused");
            return self.reject(StatusCode::FORBIDDEN, values::REASON_NON_LOOPBACK);
        }
        if !token_matches(&req, &self.token) {
            debug!(%peer, "IPC request without a valid token");
            return self.reject(StatusCode::UNAUTHORIZED, values::REASON_UNAUTHORIZED);
        }

        match (req.method(), req.uri().path()) {
            (&Method::GET, "/ipc/bridge") => bridge_response(self.is_dev).unwrap_or_else(|e| {
                warn!(error = %e, "IPC: failed to build bridge response");
                status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }),
            (&Method::POST, "/ipc") => self.handle_message(req).await,
            (_, "/ipc") | (_, "/ipc/bridge") => status_response(StatusCode::METHOD_NOT_ALLOWED),
            _ => status_response(StatusCode::NOT_FOUND),
        }
    }

    async fn handle_message(&self, req: Request<Incoming>) -> Response<RespBody> {
        let bytes = match Limited::new(req.into_body(), MAX_IPC_BODY_BYTES).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return self.reject(StatusCode::PAYLOAD_TOO_LARGE, values::REASON_MALFORMED);
            }
            Err(e) => {
                debug!(error = %e, "IPC: failed to read request body");
                return self.reject(StatusCode::BAD_REQUEST, values::REASON_MALFORMED);
            }
        };

        let envelope: IpcEnvelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(error = %e, "IPC: malformed message");
                return self.reject(StatusCode::BAD_REQUEST, values::REASON_MALFORMED);
            }
        };

        let channel = envelope.channel.clone();
        match envelope.into_message() {
            Some(msg) => {
                self.channel.receive(msg, values::SOURCE_IPC);
                status_response(StatusCode::NO_CONTENT)
            }
            None => {
                debug!(channel = %channel, "IPC: message on unknown channel dropped");
                self.reject(StatusCode::NOT_FOUND, values::REASON_UNKNOWN_CHANNEL)
            }
        }
    }
}

/// Bind the configured loopback address and serve the IPC endpoint
pub async fn run(
    config: &ControlConfig,
    is_dev: bool,
    channel: ControlChannel,
    metrics: Option<Arc<Metrics>>,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let listener = TcpListener::bind(config.listen).await?;
    serve(listener, config.token.clone(), is_dev, channel, metrics, shutdown).await
}

/// Serve the IPC endpoint on an already bound listener
pub async fn serve(
    listener: TcpListener,
    token: String,
    is_dev: bool,
    channel: ControlChannel,
    metrics: Option<Arc<Metrics>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let addr = listener.local_addr()?;
    if !addr.ip().is_loopback() {
        return Err(ShellError::Config(format!("IPC endpoint must bind a loopback address, got {addr}")));
    }

    let state = Arc::new(IpcState { channel, token, is_dev, metrics });
    let builder = ConnBuilder::new(TokioExecutor::new());

    info!(?addr, "IPC endpoint listening");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("IPC endpoint: shutdown requested");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(error = %e, "IPC endpoint: accept error");
                        continue;
                    }
                };

                let builder = builder.clone();
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, hyper::Error>(state.handle(req, peer).await) }
                    });
                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        debug!(?peer, error = %e, "IPC endpoint: serve_connection error");
                    }
                });
            }
        }
    }

    info!("IPC endpoint stopped");
    Ok(())
}
