//! Renderer to privileged-process messaging.
//!
//! Two transports feed the same [`ControlChannel`]: an in-process
//! [`RendererBridge`] and the authenticated loopback [`ipc`] endpoint.

pub mod channel;
pub mod ipc;
pub mod message;

pub use channel::{renderer_bridge, ControlChannel, RendererBridge};
pub use message::{ControlMessage, IpcEnvelope, CHANNELS, SET_JIRA_ORIGIN};
