//! keypressed: background daemon that shows recently pressed keys
//!
//! - Global keyboard hook (CGEventTap on macOS, rdev elsewhere)
//! - Key symbolization and repeat collapsing
//! - Idle-hide timer
//! - IPC server the overlay window subscribes to

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use keypressed::config::Config;
use keypressed::events::DisplayEvent;
use keypressed::lifecycle::ShutdownSignal;
use keypressed::listener::KeyListener;
use keypressed::overlay::Presenter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "keypressed starting");

    // Load configuration
    let config = Config::load()?;
    info!(
        platform = %config.platform,
        max_same_key = config.max_same_key,
        hide_after_ms = config.hide_after.as_millis() as u64,
        socket_path = ?config.socket_path,
        "configuration loaded"
    );

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Listener thread -> presenter
    let (symbol_tx, symbol_rx) = mpsc::unbounded_channel();
    // IPC -> presenter
    let (command_tx, command_rx) = mpsc::channel(8);
    // Presenter -> overlay window
    let (event_tx, _event_rx) = broadcast::channel::<DisplayEvent>(64);

    let mut presenter = Presenter::new(&config, event_tx.clone());

    // Without the hook there is nothing to show
    let listener = KeyListener::new(symbol_tx, config.platform);
    if let Err(e) = listener.start() {
        error!(?e, "failed to start key listener");
        return Err(e).context("keyboard hook unavailable - check input/accessibility permissions");
    }
    info!("key listener started");

    #[cfg(unix)]
    let server = {
        let server = keypressed::ipc::Server::new(&config.socket_path, event_tx.clone(), command_tx)?;
        server.set_listener_running(true).await;
        server
    };
    #[cfg(unix)]
    let ipc_task = ipc::run(&server, event_tx.subscribe());
    #[cfg(not(unix))]
    let ipc_task = {
        drop(command_tx);
        std::future::pending::<Result<()>>()
    };

    info!("daemon initialized, entering main loop");

    tokio::select! {
        _ = presenter.run(symbol_rx, command_rx) => {
            info!("presenter exited");
        }

        result = ipc_task => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        result = shutdown.wait() => match result {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => error!(?e, "failed to wait for shutdown signal"),
        }
    }

    // Cleanup
    info!("shutting down...");

    listener.stop();
    #[cfg(unix)]
    server.shutdown().await;

    info!("keypressed stopped");

    Ok(())
}

#[cfg(unix)]
mod ipc {
    use anyhow::Result;
    use tokio::sync::broadcast;
    use tracing::warn;

    use keypressed::events::DisplayEvent;
    use keypressed::ipc::Server;

    /// Serve clients while keeping the server's status in sync with the display
    pub async fn run(server: &Server, mut display_rx: broadcast::Receiver<DisplayEvent>) -> Result<()> {
        let track = async {
            loop {
                match display_rx.recv().await {
                    Ok(event) => server.apply_event(&event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "display event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        tokio::select! {
            result = server.run() => result,
            _ = track => Ok(()),
        }
    }
}
