//! Perch
//!
//! A minimal reparenting X11 window manager. Every client gets a bordered
//! frame, frames are tiled by a fixed rule, and button 1 drags them around.

mod config;
mod shared;
mod wm;

use anyhow::{Context, Result};
use tokio::sync::oneshot::error::RecvError;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::wm::WindowManager;
use crate::wm::display::X11Display;
use crate::wm::error::WmError;

/// Connect and run the manager until it fails. Runs on its own thread and
/// owns every piece of window state.
fn run_window_manager(display: Option<String>) -> Result<(), WmError> {
    let gateway = X11Display::open(display.as_deref())?;
    let mut wm = WindowManager::new(gateway);
    wm.run()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = Config::config_path()?;
    let config = Config::load_from(&config_path)?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Perch window manager");
    if config_path.exists() {
        info!("Configuration loaded from {:?}", config_path);
    } else {
        info!("Config file not found at {:?}, using defaults", config_path);
    }
    debug!("Config: {:?}", config);

    let (result_tx, result_rx) = tokio::sync::oneshot::channel();
    let display = config.display.clone();
    std::thread::Builder::new()
        .name("perch-wm".into())
        .spawn(move || {
            let _ = result_tx.send(run_window_manager(display));
        })
        .context("Failed to spawn window manager thread")?;

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            result = result_rx => finish(result)?,
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            result = result_rx => finish(result)?,
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C, shutting down"),
        }
    }

    Ok(())
}

/// Turn the manager thread's outcome into the process result.
fn finish(result: Result<Result<(), WmError>, RecvError>) -> Result<()> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("Window manager error: {}", e);
            Err(e.into())
        }
        Err(_) => anyhow::bail!("Window manager thread exited without a result"),
    }
}
