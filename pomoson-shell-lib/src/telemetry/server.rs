use crate::error::Result as ShellResult;
use crate::registry::OriginRegistry;
use crate::telemetry::{
    handle_metrics, health_check_response, live_check_response, ready_check_response,
};
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

type RespBody = BoxBody<Bytes, hyper::Error>;

fn plain_response(status: StatusCode, text: &'static str) -> Response<RespBody> {
    let body = Full::new(Bytes::from(text))
        .map_err(|never| match never {})
        .boxed();
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    resp
}

fn or_internal_error(result: ShellResult<Response<RespBody>>) -> Response<RespBody> {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "Observability server: failed to build response");
        plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    })
}

/// Start the observability server that handles metrics and health checks
/// This server runs on a dedicated loopback port and serves:
/// - `/metrics` - Prometheus metrics
/// - `/health` - Health check endpoint (includes whether an origin is configured)
/// - `/ready` - Readiness check endpoint
/// - `/live` - Liveness check endpoint
pub async fn start_observability_server(
    port: u16,
    registry: Registry,
    origins: Arc<OriginRegistry>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = Arc::new(registry);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;

    info!(?addr, "Observability server started (metrics + health checks)");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("Observability server: shutdown requested");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "Observability server: accept error");
                        continue;
                    }
                };

                let registry = registry.clone();
                let origins = origins.clone();
                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let registry = registry.clone();
                        let origins = origins.clone();
                        async move {
                            let resp = match req.uri().path() {
                                "/health" => or_internal_error(health_check_response(&origins)),
                                "/ready" => or_internal_error(ready_check_response()),
                                "/live" => or_internal_error(live_check_response()),
                                "/metrics" => or_internal_error(handle_metrics(&registry)),
                                _ => plain_response(StatusCode::NOT_FOUND, "Not Found"),
                            };
                            Ok::<_, hyper::Error>(resp)
                        }
                    });

                    let builder = ConnBuilder::new(TokioExecutor::new());
                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(?peer, error = %e, "Observability server: serve_connection error");
                    }
                });
            }
        }
    }

    info!("Observability server stopped");
    Ok(())
}
