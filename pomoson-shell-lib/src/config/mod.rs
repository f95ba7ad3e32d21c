mod listeners;
mod loader;
mod root;
mod telemetry;
mod timeout;

pub use listeners::{ControlConfig, ProxyConfig, RendererConfig};
pub use loader::{load_from_path, parse_from_path, validate_config};
pub use root::Config;
pub use telemetry::{LoggingConfig, TelemetryConfig};
pub use timeout::TimeoutConfig;
