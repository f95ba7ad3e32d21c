#![forbid(unsafe_code)]

use clap::Parser;
use pomoson_shell_lib::config::{parse_from_path, validate_config, Config};
use pomoson_shell_lib::telemetry::{init_metrics, init_tracing, start_observability_server};
use pomoson_shell_lib::Shell;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Pomoson desktop shell (privileged process)")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", default_value = "config/pomoson.toml")]
    config: PathBuf,

    /// Bearer token the IPC endpoint requires, overrides `control.token`
    #[arg(long, env = "POMOSON_CONTROL_TOKEN", hide_env_values = true)]
    control_token: Option<String>,

    /// Run as a development build
    #[arg(long)]
    dev: bool,
}

fn load_config(cli: &Cli) -> pomoson_shell_lib::Result<Config> {
    let mut cfg = parse_from_path(&cli.config)?;
    if let Some(token) = &cli.control_token {
        cfg.control.token = token.clone();
    }
    if cli.dev {
        cfg.renderer.dev_mode = true;
    }
    validate_config(&cfg)?;
    Ok(cfg)
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "Failed to setup signal handlers, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
        _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received ctrl-c, initiating graceful shutdown");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(&cfg.logging, &cfg.telemetry) {
        eprintln!("failed to initialize logging: {err}");
        std::process::exit(1);
    }

    info!(
        proxy = %cfg.proxy.listen,
        control = cfg.control.enabled,
        dev_mode = cfg.renderer.dev_mode,
        "configuration loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics_port = cfg.telemetry.metrics_port;
    let (metrics, prometheus_registry) = match metrics_port {
        Some(_) => match init_metrics() {
            Ok((metrics, registry)) => (Some(metrics), Some(registry)),
            Err(err) => {
                error!(%err, "failed to initialize metrics");
                std::process::exit(1);
            }
        },
        None => (None, None),
    };

    let shell = match Shell::build(cfg, metrics) {
        Ok(shell) => shell,
        Err(err) => {
            error!(%err, "failed to build shell");
            std::process::exit(1);
        }
    };

    if let (Some(port), Some(registry)) = (metrics_port, prometheus_registry) {
        let origins = shell.registry();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(err) = start_observability_server(port, registry, origins, shutdown).await {
                error!(%err, "observability server exited with error");
            }
        });
    }

    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    if let Err(err) = shell.run(shutdown_rx).await {
        error!(%err, "shell exited with error");
        std::process::exit(1);
    }
}
