mod helpers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use helpers::{echoed_header, pick_free_port, spawn_header_echo, TestResult};
use pomoson_shell_lib::config::TimeoutConfig;
use pomoson_shell_lib::proxy::{self, ProxyContext};
use pomoson_shell_lib::telemetry::metrics::values::SOURCE_IPC;
use pomoson_shell_lib::{
    ControlChannel, ControlMessage, NetworkSession, OriginRegistry, RequestInterceptor,
};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::watch;

const ELECTRON_UA: &str = "Mozilla/5.0 Pomoson/1.0.0 Electron/28.1.0";

struct ProxyFixture {
    addr: SocketAddr,
    channel: ControlChannel,
    _shutdown: watch::Sender<bool>,
}

async fn start_proxy(timeouts: TimeoutConfig) -> TestResult<ProxyFixture> {
    let registry = Arc::new(OriginRegistry::new());
    let session = Arc::new(NetworkSession::new(&timeouts, None)?);
    session.register_before_send_headers(Arc::new(RequestInterceptor::new(
        Arc::clone(&registry),
        None,
    )))?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (shutdown, shutdown_rx) = watch::channel(false);
    let ctx = ProxyContext { session, max_body_bytes: timeouts.max_body_bytes };
    tokio::spawn(proxy::serve(listener, ctx, 1, shutdown_rx));

    Ok(ProxyFixture { addr, channel: ControlChannel::new(registry, None), _shutdown: shutdown })
}

fn renderer_client(proxy: SocketAddr) -> TestResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .proxy(reqwest::Proxy::http(format!("http://{proxy}"))?)
        .user_agent(ELECTRON_UA)
        .build()?)
}

#[tokio::test]
async fn proxied_request_to_origin_is_rewritten() -> TestResult<()> {
    let upstream = spawn_header_echo().await?;
    let origin = format!("http://{upstream}");
    let fixture = start_proxy(TimeoutConfig::default()).await?;
    fixture.channel.receive(ControlMessage::SetOrigin(origin.clone()), SOURCE_IPC);

    let resp = renderer_client(fixture.addr)?
        .get(format!("{origin}/rest/api/2/search?jql=assignee%3DcurrentUser()"))
        .header("proxy-authorization", "Basic Zm9vOmJhcg==")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-upstream").map(|v| v.as_bytes()), Some(b"echo".as_ref()));

    let echo: Value = resp.json().await?;
    assert_eq!(echo["path"], "/rest/api/2/search");
    assert_eq!(echoed_header(&echo, "origin"), Some(origin.as_str()));
    assert!(echoed_header(&echo, "user-agent").is_some_and(|ua| ua.contains("Chrome/")));
    assert_eq!(echoed_header(&echo, "proxy-authorization"), None);
    Ok(())
}

#[tokio::test]
async fn rewritten_request_keeps_connection_override_on_http1() -> TestResult<()> {
    let upstream = spawn_header_echo().await?;
    let origin = format!("http://{upstream}");
    let fixture = start_proxy(TimeoutConfig::default()).await?;
    fixture.channel.receive(ControlMessage::SetOrigin(origin.clone()), SOURCE_IPC);

    // The renderer's own Connection header is stripped at the proxy hop
    let echo: Value = renderer_client(fixture.addr)?
        .get(format!("{origin}/rest"))
        .header("connection", "close")
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(echoed_header(&echo, "connection"), Some("keep-alive"));
    Ok(())
}

#[tokio::test]
async fn proxied_request_elsewhere_passes_through() -> TestResult<()> {
    let upstream = spawn_header_echo().await?;
    let fixture = start_proxy(TimeoutConfig::default()).await?;
    fixture.channel.receive(
        ControlMessage::SetOrigin("https://jira.example.com".to_string()),
        SOURCE_IPC,
    );

    let echo: Value = renderer_client(fixture.addr)?
        .post(format!("http://{upstream}/upload"))
        .body("payload")
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(echo["method"], "POST");
    assert_eq!(echoed_header(&echo, "user-agent"), Some(ELECTRON_UA));
    assert_eq!(echoed_header(&echo, "origin"), None);
    Ok(())
}

#[tokio::test]
async fn origin_form_requests_are_rejected() -> TestResult<()> {
    let fixture = start_proxy(TimeoutConfig::default()).await?;

    // Talking to the proxy directly sends an origin-form request line
    let status = reqwest::Client::builder()
        .no_proxy()
        .build()?
        .get(format!("http://{}/rest", fixture.addr))
        .send()
        .await?
        .status();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unreachable_upstream_maps_to_bad_gateway() -> TestResult<()> {
    let dead = pick_free_port()?;
    let fixture = start_proxy(TimeoutConfig::default()).await?;

    let status = renderer_client(fixture.addr)?
        .get(format!("http://{dead}/"))
        .send()
        .await?
        .status();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    Ok(())
}

#[tokio::test]
async fn slow_upstream_maps_to_gateway_timeout() -> TestResult<()> {
    // Accepts connections but never answers
    let silent = TcpListener::bind("127.0.0.1:0").await?;
    let silent_addr = silent.local_addr()?;
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = silent.accept().await {
            held.push(stream);
        }
    });

    let timeouts = TimeoutConfig { request_ms: 200, ..TimeoutConfig::default() };
    let fixture = start_proxy(timeouts).await?;

    let status = renderer_client(fixture.addr)?
        .get(format!("http://{silent_addr}/"))
        .timeout(Duration::from_secs(5))
        .send()
        .await?
        .status();
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    Ok(())
}

#[tokio::test]
async fn oversized_body_is_rejected() -> TestResult<()> {
    let upstream = spawn_header_echo().await?;
    let timeouts = TimeoutConfig { max_body_bytes: 16, ..TimeoutConfig::default() };
    let fixture = start_proxy(timeouts).await?;

    let status = renderer_client(fixture.addr)?
        .post(format!("http://{upstream}/upload"))
        .body("this body is longer than sixteen bytes")
        .send()
        .await?
        .status();
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    Ok(())
}
