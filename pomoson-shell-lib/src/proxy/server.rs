use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http::StatusCode;
use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{Result, ShellError};
use crate::proxy::forwarding::{forward, ProxyContext};
use crate::proxy::synthetic_response::error_response;

/// Guard to decrement active connections counter when dropped
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Bind `listen` and run the renderer forward proxy until shutdown
pub async fn run(
    ctx: ProxyContext,
    listen: SocketAddr,
    shutdown_secs: u64,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let listener = TcpListener::bind(listen).await?;
    serve(listener, ctx, shutdown_secs, shutdown).await
}

/// Run the forward proxy on an already bound loopback listener
pub async fn serve(
    listener: TcpListener,
    ctx: ProxyContext,
    shutdown_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let addr = listener.local_addr()?;
    if !addr.ip().is_loopback() {
        return Err(ShellError::Config(format!("proxy must bind a loopback address, got {addr}")));
    }

    let builder = ConnBuilder::new(TokioExecutor::new());
    let active_connections = Arc::new(AtomicUsize::new(0));

    info!(?addr, "renderer proxy listening");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("renderer proxy: shutdown requested, no longer accepting connections");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };

                active_connections.fetch_add(1, Ordering::Relaxed);

                let builder = builder.clone();
                let ctx = ctx.clone();
                let active_connections = active_connections.clone();

                tokio::spawn(async move {
                    let _guard = ConnectionGuard(active_connections);

                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let ctx = ctx.clone();
                        async move {
                            let resp = match forward(req, &ctx).await {
                                Ok(resp) => resp,
                                Err(e) => {
                                    let status: StatusCode = e.clone().into();
                                    if status.is_server_error() {
                                        warn!(error = %e, status = status.as_u16(), "forwarding failed");
                                    } else {
                                        debug!(error = %e, status = status.as_u16(), "request refused");
                                    }
                                    error_response(status)
                                }
                            };
                            Ok::<_, hyper::Error>(resp)
                        }
                    });

                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(?peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }

    info!("Waiting for active connections to finish (timeout: {}s)", shutdown_secs);
    let shutdown_timeout = Duration::from_secs(shutdown_secs);
    let start = Instant::now();

    loop {
        let active = active_connections.load(Ordering::Relaxed);
        if active == 0 {
            info!("All connections closed, shutdown complete");
            break;
        }

        if start.elapsed() >= shutdown_timeout {
            warn!(
                active_connections = active,
                "Shutdown timeout reached, {} connections still active", active
            );
            break;
        }

        debug!(active_connections = active, "Waiting for connections to close");
        sleep(Duration::from_millis(100)).await;
    }

    info!("renderer proxy stopped");
    Ok(())
}
