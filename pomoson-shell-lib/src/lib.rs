#![forbid(unsafe_code)]

pub mod config;
pub mod control;
pub mod error;
pub mod interceptor;
pub mod proxy;
pub mod registry;
pub mod session;
pub mod shell;
pub mod telemetry;

pub use config::{load_from_path, Config};
pub use control::{ControlChannel, ControlMessage, RendererBridge};
pub use error::{Result, ShellError};
pub use interceptor::{HeaderOverrideSet, InterceptOutcome, RequestInterceptor};
pub use registry::OriginRegistry;
pub use session::{BeforeSendHeaders, NetworkSession, OutboundRequest};
pub use shell::Shell;
