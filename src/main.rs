// MIT License - Copyright (c) 2026 Peter Wright
// EnvisaLink TPI daemon

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::{error, info, warn};

use evl_daemon::{Config, EvlDaemon};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "evl-daemon")]
#[command(about = "Monitor an alarm panel through an EnvisaLink TPI connection")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short, default_value = "config.toml")]
    config: String,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=evl_daemon=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    let mut config =
        Config::load(&cli.config).with_context(|| format!("Failed to load config file {}", cli.config))?;

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        let daemon = EvlDaemon::new(config.clone())
            .await
            .context("Failed to start daemon")?;
        let (stop_tx, stop_rx) = watch::channel(false);

        info!("Daemon running. Send SIGHUP to reload, SIGINT/SIGTERM to stop.");
        let (restart, result) = {
            let run = daemon.run(stop_rx);
            tokio::pin!(run);
            tokio::select! {
                result = &mut run => (false, result),
                _ = tokio::signal::ctrl_c() => {
                    info!("Received SIGINT, shutting down...");
                    let _ = stop_tx.send(true);
                    (false, run.await)
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down...");
                    let _ = stop_tx.send(true);
                    (false, run.await)
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading config and reconnecting...");
                    let _ = stop_tx.send(true);
                    (true, run.await)
                }
            }
        };

        daemon.shutdown().await;

        if let Err(e) = result {
            error!("Stopping on connection fault: {e}");
            return Err(e).context("Connection to panel lost");
        }

        if !restart {
            break;
        }

        // Keep the previous config if the new one does not load
        info!("Reloading config from {}", cli.config);
        match Config::load(&cli.config) {
            Ok(new_config) => {
                config = new_config;
                info!("Config reloaded successfully");
            }
            Err(e) => warn!("Failed to reload config, keeping previous: {e}"),
        }
    }

    info!("Shutdown complete");
    Ok(())
}
