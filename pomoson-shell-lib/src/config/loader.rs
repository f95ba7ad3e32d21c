use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{Result, ShellError};

/// Read, parse and validate a configuration file
pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let cfg = parse_from_path(p)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Read and parse a configuration file without validating it
///
/// Used by the binary so command-line overrides can be applied before
/// [`validate_config`] runs.
pub fn parse_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| ShellError::Config(format!("Failed to read config file: {e}")))?;
    toml::from_str(&txt).map_err(|e| ShellError::Config(format!("Failed to parse config: {e}")))
}

pub fn validate_config(cfg: &Config) -> Result<()> {
    if !cfg.proxy.listen.ip().is_loopback() {
        return Err(ShellError::Config(format!(
            "proxy.listen must be a loopback address, got {}",
            cfg.proxy.listen
        )));
    }

    if cfg.control.enabled {
        if !cfg.control.listen.ip().is_loopback() {
            return Err(ShellError::Config(format!(
                "control.listen must be a loopback address, got {}",
                cfg.control.listen
            )));
        }
        if cfg.control.token.trim().is_empty() {
            return Err(ShellError::Config(
                "control.token is required when the control endpoint is enabled".to_string(),
            ));
        }
        if cfg.control.listen == cfg.proxy.listen && cfg.proxy.listen.port() != 0 {
            return Err(ShellError::Config(format!(
                "control.listen and proxy.listen must differ, both are {}",
                cfg.proxy.listen
            )));
        }
    }

    if cfg.timeout.connect_ms == 0 {
        return Err(ShellError::Config("timeout.connect_ms must be > 0".to_string()));
    }
    if cfg.timeout.request_ms == 0 {
        return Err(ShellError::Config("timeout.request_ms must be > 0".to_string()));
    }
    if cfg.timeout.max_body_bytes == 0 {
        return Err(ShellError::Config("timeout.max_body_bytes must be > 0".to_string()));
    }

    Ok(())
}
