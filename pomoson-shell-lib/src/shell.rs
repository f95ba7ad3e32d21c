use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::config::Config;
use crate::control::{ipc, renderer_bridge, ControlChannel, ControlMessage, RendererBridge};
use crate::error::{Result, ShellError};
use crate::interceptor::RequestInterceptor;
use crate::proxy::{self, ProxyContext};
use crate::registry::OriginRegistry;
use crate::session::NetworkSession;
use crate::telemetry::Metrics;

/// The privileged process: one network session with the interceptor
/// installed, the origin registry, and the control surfaces feeding it.
pub struct Shell {
    config: Config,
    registry: Arc<OriginRegistry>,
    session: Arc<NetworkSession>,
    channel: ControlChannel,
    bridge: RendererBridge,
    bridge_rx: mpsc::UnboundedReceiver<ControlMessage>,
    metrics: Option<Arc<Metrics>>,
}

impl Shell {
    /// Wire everything up. The interceptor is registered here, before any
    /// request can be sent.
    pub fn build(config: Config, metrics: Option<Arc<Metrics>>) -> Result<Self> {
        let registry = Arc::new(OriginRegistry::new());
        let session = Arc::new(NetworkSession::new(&config.timeout, metrics.clone())?);
        session.register_before_send_headers(Arc::new(RequestInterceptor::new(
            Arc::clone(&registry),
            metrics.clone(),
        )))?;

        let channel = ControlChannel::new(Arc::clone(&registry), metrics.clone());
        let (bridge, bridge_rx) = renderer_bridge(config.renderer.dev_mode);

        Ok(Self { config, registry, session, channel, bridge, bridge_rx, metrics })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read-only view of the rewrite origin
    pub fn registry(&self) -> Arc<OriginRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn session(&self) -> Arc<NetworkSession> {
        Arc::clone(&self.session)
    }

    /// Handle for embedders that host renderer code in this process. Take it
    /// before [`Shell::run`]; the `pomoson-shell` binary never does and
    /// receives origin updates over the IPC endpoint only.
    pub fn bridge(&self) -> RendererBridge {
        self.bridge.clone()
    }

    /// Serve the renderer proxy, the IPC endpoint (when enabled) and the
    /// bridge until `shutdown` flips. Returns the first error any of them hits.
    ///
    /// The bridge listener only lives as long as some [`RendererBridge`]
    /// obtained from [`Shell::bridge`] does. Without one it returns at once
    /// and the proxy and IPC endpoint keep serving.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let Self { config, session, channel, bridge, bridge_rx, metrics, .. } = self;
        drop(bridge);

        let ctx = ProxyContext {
            session,
            max_body_bytes: config.timeout.max_body_bytes,
        };

        info!(
            proxy = %config.proxy.listen,
            control = config.control.enabled,
            dev_mode = config.renderer.dev_mode,
            "shell starting"
        );

        let proxy = proxy::run(ctx, config.proxy.listen, config.timeout.shutdown_secs, shutdown.clone());
        let control = async {
            if config.control.enabled {
                ipc::run(
                    &config.control,
                    config.renderer.dev_mode,
                    channel.clone(),
                    metrics.clone(),
                    shutdown.clone(),
                )
                .await
            } else {
                Ok(())
            }
        };
        let bridge_listener = async {
            channel.listen(bridge_rx, shutdown.clone()).await;
            Ok::<(), ShellError>(())
        };

        tokio::try_join!(proxy, control, bridge_listener)?;
        info!("shell stopped");
        Ok(())
    }
}
