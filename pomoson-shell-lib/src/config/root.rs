use serde::Deserialize;

use super::listeners::{ControlConfig, ProxyConfig, RendererConfig};
use super::telemetry::{LoggingConfig, TelemetryConfig};
use super::timeout::TimeoutConfig;

/// Main configuration structure
///
/// Every section is optional; an empty file yields the defaults except for the
/// control token, which must be supplied either here or on the command line.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Renderer-facing forward proxy
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Control channel IPC endpoint
    #[serde(default)]
    pub control: ControlConfig,
    /// Values exposed to the UI through the bridge
    #[serde(default)]
    pub renderer: RendererConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Timeout configuration
    #[serde(default)]
    pub timeout: TimeoutConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
