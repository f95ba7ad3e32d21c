use serde::Deserialize;
use std::net::SocketAddr;

/// Renderer-facing forward proxy configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProxyConfig {
    /// Address the renderer's HTTP traffic is pointed at
    /// Must be a loopback address
    /// Default: "127.0.0.1:7878"
    #[serde(default = "default_proxy_listen")]
    pub listen: SocketAddr,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self { listen: default_proxy_listen() }
    }
}

/// Control channel endpoint configuration
///
/// The endpoint is the only way an out-of-process renderer can push a new
/// rewrite origin into the privileged process.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ControlConfig {
    /// Start the loopback IPC endpoint
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Address of the IPC endpoint
    /// Must be a loopback address
    /// Default: "127.0.0.1:7879"
    #[serde(default = "default_control_listen")]
    pub listen: SocketAddr,
    /// Shared secret the renderer presents as `Authorization: Bearer <token>`
    /// Can be supplied on the command line instead
    /// Default: empty (required when `enabled = true`)
    #[serde(default)]
    pub token: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { enabled: true, listen: default_control_listen(), token: String::new() }
    }
}

/// Values exposed to the rendering context through the bridge
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RendererConfig {
    /// Development mode flag, surfaced to the UI as `is_dev`
    /// Default: false
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_proxy_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7878))
}

fn default_control_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7879))
}

fn default_true() -> bool {
    true
}
