//! Loopback forward proxy the renderer's traffic is routed through, so every
//! request passes the session hook.

pub mod forwarding;
pub mod http_result;
pub mod server;
pub mod synthetic_response;

pub use forwarding::{forward, strip_hop_by_hop, target_url, ProxyContext};
pub use http_result::HttpError;
pub use server::{run, serve};
