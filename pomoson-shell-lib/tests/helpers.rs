//! Shared test helpers: free ports, config files and a header-echo upstream
#![allow(dead_code)]

use std::convert::Infallible;
use std::io::Write;
use std::net::{SocketAddr, TcpListener as StdTcpListener};

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use serde_json::{json, Map, Value};
use tempfile::NamedTempFile;
use tokio::net::TcpListener;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const TEST_TOKEN: &str = "test-token-0123456789";

pub fn pick_free_port() -> TestResult<SocketAddr> {
    let listener = StdTcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Write `contents` to a fresh temporary TOML file
pub fn write_config(contents: &str) -> TestResult<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

/// Upstream that answers every request with a JSON description of what it
/// received: method, path and headers (last value wins per name)
pub async fn spawn_header_echo() -> TestResult<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            tokio::spawn(async move {
                let svc = hyper::service::service_fn(|req: Request<Incoming>| async move {
                    let mut headers = Map::new();
                    for (name, value) in req.headers() {
                        let value = value.to_str().unwrap_or_default().to_string();
                        headers.insert(name.as_str().to_string(), Value::String(value));
                    }
                    let body = json!({
                        "method": req.method().as_str(),
                        "path": req.uri().path(),
                        "headers": headers,
                    });
                    let resp = Response::builder()
                        .header("content-type", "application/json")
                        .header("x-upstream", "echo")
                        .body(Full::new(Bytes::from(body.to_string())))
                        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())));
                    Ok::<_, Infallible>(resp)
                });
                let _ = hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), svc)
                    .await;
            });
        }
    });
    Ok(addr)
}

/// Header value the echo upstream reported for `name`
pub fn echoed_header<'a>(echo: &'a Value, name: &str) -> Option<&'a str> {
    echo.get("headers").and_then(|h| h.get(name)).and_then(Value::as_str)
}
