use serde::Deserialize;

/// Channel name the renderer uses to hand over the Jira origin
pub const SET_JIRA_ORIGIN: &str = "set-jira-origin";

/// Every channel the privileged side listens on
pub const CHANNELS: &[&str] = &[SET_JIRA_ORIGIN];

/// Message accepted from the renderer side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    SetOrigin(String),
}

impl ControlMessage {
    /// Map a channel name and its payload onto a message, `None` for channels
    /// nobody listens on
    pub fn from_channel(channel: &str, payload: String) -> Option<Self> {
        match channel {
            SET_JIRA_ORIGIN => Some(Self::SetOrigin(payload)),
            _ => None,
        }
    }
}

/// JSON envelope posted to the IPC endpoint
#[derive(Debug, Deserialize)]
pub struct IpcEnvelope {
    pub channel: String,
    pub payload: String,
}

impl IpcEnvelope {
    pub fn into_message(self) -> Option<ControlMessage> {
        ControlMessage::from_channel(&self.channel, self.payload)
    }
}
