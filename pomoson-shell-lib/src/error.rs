use thiserror::Error;

/// Errors that can occur in the shell's privileged process
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("A before-send-headers hook is already registered on this session")]
    HookAlreadyRegistered,

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ShellError>;
