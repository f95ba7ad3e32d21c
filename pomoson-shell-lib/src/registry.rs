//! Single-slot store holding the origin whose requests get rewritten.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Holds the current rewrite origin, or nothing until the control channel
/// configures one.
///
/// Reads are lock-free pointer loads, so the interceptor can consult the
/// registry on every outbound request. Writes replace the whole value; a
/// reader sees either the old or the new string, never a mix.
///
/// Only the control channel writes. Everything else gets read access.
#[derive(Debug, Default)]
pub struct OriginRegistry {
    current: ArcSwapOption<String>,
}

impl OriginRegistry {
    pub fn new() -> Self {
        Self { current: ArcSwapOption::empty() }
    }

    /// Current origin, `None` while unconfigured
    pub fn get(&self) -> Option<Arc<String>> {
        self.current.load_full()
    }

    /// Whether an origin has been configured yet
    pub fn is_configured(&self) -> bool {
        self.current.load().is_some()
    }

    /// Overwrite the stored origin. No validation: empty and non-URL strings
    /// are stored as given.
    pub(crate) fn set(&self, origin: impl Into<String>) -> Option<Arc<String>> {
        self.current.swap(Some(Arc::new(origin.into())))
    }
}
