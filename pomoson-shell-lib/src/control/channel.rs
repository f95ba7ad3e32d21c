use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::control::message::ControlMessage;
use crate::registry::OriginRegistry;
use crate::telemetry::metrics::values;
use crate::telemetry::Metrics;

/// Privileged-side receiver for renderer messages. The only code path that
/// writes to the [`OriginRegistry`].
#[derive(Clone)]
pub struct ControlChannel {
    registry: Arc<OriginRegistry>,
    metrics: Option<Arc<Metrics>>,
}

impl ControlChannel {
    pub fn new(registry: Arc<OriginRegistry>, metrics: Option<Arc<Metrics>>) -> Self {
        Self { registry, metrics }
    }

    pub fn registry(&self) -> &Arc<OriginRegistry> {
        &self.registry
    }

    /// Apply one message. Last write wins; the payload is stored verbatim.
    pub fn receive(&self, msg: ControlMessage, source: &'static str) {
        match msg {
            ControlMessage::SetOrigin(origin) => {
                if origin.is_empty() {
                    warn!(source, "empty origin received, every request will be rewritten");
                }
                let previous = self.registry.set(origin.as_str());
                info!(
                    source,
                    origin = %origin,
                    previous = previous.as_deref().map(String::as_str).unwrap_or("<none>"),
                    "rewrite origin updated"
                );
                if let Some(m) = &self.metrics {
                    m.record_origin_update(source);
                }
            }
        }
    }

    /// Drain messages sent through a [`RendererBridge`] until every bridge is
    /// dropped or shutdown is signalled.
    pub async fn listen(
        &self,
        mut rx: mpsc::UnboundedReceiver<ControlMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!("control channel: shutdown requested");
                    break;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(msg) => self.receive(msg, values::SOURCE_BRIDGE),
                        None => {
                            debug!("control channel: all bridges dropped");
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Create a bridge for in-process renderer code plus the receiving end the
/// [`ControlChannel`] listens on.
pub fn renderer_bridge(is_dev: bool) -> (RendererBridge, mpsc::UnboundedReceiver<ControlMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RendererBridge { tx, is_dev }, rx)
}

/// The narrow surface handed to renderer-side code: it can send the origin
/// and ask whether this is a development build, nothing else.
#[derive(Debug, Clone)]
pub struct RendererBridge {
    tx: mpsc::UnboundedSender<ControlMessage>,
    is_dev: bool,
}

impl RendererBridge {
    /// Fire-and-forget; the renderer gets no acknowledgement
    pub fn send_origin(&self, origin: impl Into<String>) {
        if self.tx.send(ControlMessage::SetOrigin(origin.into())).is_err() {
            debug!("control channel closed, origin update dropped");
        }
    }

    pub fn is_dev(&self) -> bool {
        self.is_dev
    }
}
