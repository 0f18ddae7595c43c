//! Global keyboard listener
//!
//! Runs the platform keyboard hook on a dedicated thread. The symbolizer
//! lives on that thread too; only finished symbols cross over to the
//! presenter, one message per symbol, in the order the keys were pressed.
//!
//! Backends: CGEventTap on macOS, rdev on Windows and Linux.

#[cfg(any(target_os = "macos", test))]
mod mac_keymap;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(not(target_os = "macos"))]
mod rdev_backend;

#[cfg(target_os = "macos")]
use macos as backend;
#[cfg(not(target_os = "macos"))]
use rdev_backend as backend;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::keys::{Key, KeySymbolizer, Platform};

/// How long `start` waits for the hook to report an installation failure
const STARTUP_GRACE: Duration = Duration::from_millis(250);

/// Backend → `start` handshake
type Ready = SyncSender<Result<(), ListenerError>>;

/// A key event as delivered by the hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawKeyEvent {
    Press(Key),
    Release(Key),
}

/// One `start`..`stop` run of the listener.
///
/// A hook that outlives its session (rdev cannot be unhooked) stays muted
/// for good, even after the listener is started again.
#[derive(Debug, Clone)]
struct Session {
    generation: u64,
    /// Generation of the active session, 0 when stopped
    active: Arc<AtomicU64>,
}

impl Session {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) == self.generation
    }

    /// End this session unless a newer one has replaced it
    fn end(&self) -> bool {
        self.active
            .compare_exchange(self.generation, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Global keyboard listener that turns key events into display symbols
pub struct KeyListener {
    symbol_tx: mpsc::UnboundedSender<String>,
    active: Arc<AtomicU64>,
    last_generation: AtomicU64,
    platform: Platform,
}

impl KeyListener {
    /// Create a new key listener
    pub fn new(symbol_tx: mpsc::UnboundedSender<String>, platform: Platform) -> Self {
        Self {
            symbol_tx,
            active: Arc::new(AtomicU64::new(0)),
            last_generation: AtomicU64::new(0),
            platform,
        }
    }

    /// Start the key listener
    ///
    /// Spawns the hook thread and waits briefly for the hook to come up.
    /// A hook that cannot be installed is reported here.
    pub fn start(&self) -> Result<(), ListenerError> {
        let session = self.begin_session()?;
        let pipeline_session = session.clone();
        let pipeline = Pipeline::new(
            KeySymbolizer::new(self.platform),
            self.symbol_tx.clone(),
            session.clone(),
        );
        let (ready_tx, ready_rx) = sync_channel(1);

        let spawned = thread::Builder::new()
            .name("key-listener".to_string())
            .spawn(move || {
                info!("key listener thread started");

                if let Err(e) = backend::run(pipeline, &ready_tx) {
                    error!(?e, "key listener error");
                    let _ = ready_tx.try_send(Err(e));
                }

                session.end();
                info!("key listener thread stopped");
            });

        if let Err(e) = spawned {
            pipeline_session.end();
            return Err(ListenerError::ThreadSpawn(e.to_string()));
        }

        match ready_rx.recv_timeout(STARTUP_GRACE) {
            Ok(result) => result,
            // rdev has no "installed" signal, silence means it is listening
            Err(RecvTimeoutError::Timeout) => Ok(()),
            Err(RecvTimeoutError::Disconnected) => Err(ListenerError::HookInstall(
                "listener thread exited during startup".to_string(),
            )),
        }
    }

    /// Stop the key listener. Events still in flight are not waited for.
    pub fn stop(&self) {
        if self.active.swap(0, Ordering::SeqCst) != 0 {
            debug!("key listener stop requested");
        }
    }

    /// Check if the listener is currently running
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst) != 0
    }

    fn begin_session(&self) -> Result<Session, ListenerError> {
        let generation = self.last_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.active
            .compare_exchange(0, generation, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ListenerError::AlreadyRunning)?;

        Ok(Session {
            generation,
            active: Arc::clone(&self.active),
        })
    }
}

/// Errors that can occur in the key listener
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("key listener is already running")]
    AlreadyRunning,

    #[error("failed to install keyboard hook: {0}")]
    HookInstall(String),

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[error("symbol channel closed")]
    ChannelClosed,
}

/// Hook-thread side of the pipeline: symbolize and hand off
struct Pipeline {
    symbolizer: KeySymbolizer,
    symbol_tx: mpsc::UnboundedSender<String>,
    session: Session,
}

impl Pipeline {
    fn new(
        symbolizer: KeySymbolizer,
        symbol_tx: mpsc::UnboundedSender<String>,
        session: Session,
    ) -> Self {
        Self {
            symbolizer,
            symbol_tx,
            session,
        }
    }

    /// Whether this pipeline's session is still the listener's active one
    fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Forget held modifiers after the hook may have lost events
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    fn resync_modifiers(&mut self) {
        self.symbolizer.reset_modifiers();
    }

    /// Process one hook event. Events of an ended session are dropped.
    fn handle(&mut self, event: RawKeyEvent) -> Result<(), ListenerError> {
        if !self.is_active() {
            return Ok(());
        }

        match event {
            RawKeyEvent::Press(key) => {
                if let Some(symbol) = self.symbolizer.on_press(&key) {
                    debug!(%symbol, "symbol emitted");
                    if self.symbol_tx.send(symbol).is_err() {
                        warn!("failed to send symbol - channel closed?");
                        self.session.end();
                        return Err(ListenerError::ChannelClosed);
                    }
                }
            }
            RawKeyEvent::Release(key) => self.symbolizer.on_release(&key),
        }
        Ok(())
    }
}
