//! Consumer side of the key pipeline
//!
//! Applies symbols from the listener thread to the key sequence, publishes
//! display updates and hides the overlay after a period of inactivity.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::events::DisplayEvent;

use super::sequence::KeySequence;

/// Requests to the presenter from outside the key pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterCommand {
    /// Clear the sequence and hide now
    Clear,
}

/// Owns the key sequence and the idle-hide timer
pub struct Presenter {
    sequence: KeySequence,
    /// Inactivity before hiding
    hide_after: Duration,
    /// Whether the last event sent was a `Show`
    visible: bool,
    /// Channel for emitting display events
    event_tx: broadcast::Sender<DisplayEvent>,
}

impl Presenter {
    pub fn new(config: &Config, event_tx: broadcast::Sender<DisplayEvent>) -> Self {
        Self {
            sequence: KeySequence::new(config.max_same_key, config.marker_font_size()),
            hide_after: config.hide_after,
            visible: false,
            event_tx,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Run until the symbol channel closes
    pub async fn run(
        &mut self,
        mut symbol_rx: mpsc::UnboundedReceiver<String>,
        mut command_rx: mpsc::Receiver<PresenterCommand>,
    ) {
        info!(hide_after_ms = self.hide_after.as_millis() as u64, "presenter started");

        let mut hide_at: Option<Instant> = None;

        loop {
            let idle = async move {
                match hide_at {
                    Some(deadline) => time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                symbol = symbol_rx.recv() => match symbol {
                    Some(symbol) => {
                        self.handle_symbol(&symbol);
                        hide_at = Some(Instant::now() + self.hide_after);
                    }
                    None => break,
                },

                Some(command) = command_rx.recv() => match command {
                    PresenterCommand::Clear => {
                        debug!("clear requested");
                        self.hide();
                        hide_at = None;
                    }
                },

                _ = idle => {
                    debug!("idle timeout");
                    self.hide();
                    hide_at = None;
                }
            }
        }

        info!("presenter stopped");
    }

    /// Apply one symbol and publish the new text
    fn handle_symbol(&mut self, symbol: &str) {
        self.sequence.accept(symbol);
        self.visible = true;
        self.emit(DisplayEvent::Show {
            text: self.sequence.render_markup(),
        });
    }

    /// Clear the sequence, hiding the overlay if it is shown
    fn hide(&mut self) {
        self.sequence.clear();
        if self.visible {
            self.visible = false;
            self.emit(DisplayEvent::Hide);
        }
    }

    fn emit(&self, event: DisplayEvent) {
        debug!(%event, "emitting display event");
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(hide_after_ms: u64) -> Config {
        Config {
            hide_after: Duration::from_millis(hide_after_ms),
            ..Config::default()
        }
    }

    fn create_presenter(hide_after_ms: u64) -> (Presenter, broadcast::Receiver<DisplayEvent>) {
        let (tx, rx) = broadcast::channel(16);
        (Presenter::new(&config(hide_after_ms), tx), rx)
    }

    async fn next(rx: &mut broadcast::Receiver<DisplayEvent>) -> DisplayEvent {
        time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for display event")
            .expect("display channel closed")
    }

    fn show(text: &str) -> DisplayEvent {
        DisplayEvent::Show {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_initially_hidden() {
        let (presenter, _) = create_presenter(3000);
        assert!(!presenter.is_visible());
    }

    #[test]
    fn test_hide_when_hidden_emits_nothing() {
        let (mut presenter, mut rx) = create_presenter(3000);
        presenter.hide();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_symbols_are_shown_in_order() {
        let (mut presenter, mut rx) = create_presenter(3000);
        let (symbol_tx, symbol_rx) = mpsc::unbounded_channel();
        let (_command_tx, command_rx) = mpsc::channel(4);

        for symbol in ["Ctrl+c", "Ctrl+v", "<"] {
            symbol_tx.send(symbol.to_string()).unwrap();
        }
        drop(symbol_tx);

        presenter.run(symbol_rx, command_rx).await;

        assert_eq!(next(&mut rx).await, show("Ctrl+c"));
        assert_eq!(next(&mut rx).await, show("Ctrl+cCtrl+v"));
        assert_eq!(next(&mut rx).await, show("Ctrl+cCtrl+v&lt;"));
        assert!(presenter.is_visible());
    }

    #[tokio::test]
    async fn test_idle_timeout_hides_and_clears() {
        let (mut presenter, mut rx) = create_presenter(20);
        let (symbol_tx, symbol_rx) = mpsc::unbounded_channel();
        let (_command_tx, command_rx) = mpsc::channel(4);

        let task = tokio::spawn(async move {
            presenter.run(symbol_rx, command_rx).await;
        });

        symbol_tx.send("a".to_string()).unwrap();
        assert_eq!(next(&mut rx).await, show("a"));
        assert_eq!(next(&mut rx).await, DisplayEvent::Hide);

        symbol_tx.send("b".to_string()).unwrap();
        assert_eq!(next(&mut rx).await, show("b"));

        drop(symbol_tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_command() {
        let (mut presenter, mut rx) = create_presenter(60_000);
        let (symbol_tx, symbol_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(4);

        let task = tokio::spawn(async move {
            presenter.run(symbol_rx, command_rx).await;
        });

        symbol_tx.send("x".to_string()).unwrap();
        assert_eq!(next(&mut rx).await, show("x"));

        command_tx.send(PresenterCommand::Clear).await.unwrap();
        assert_eq!(next(&mut rx).await, DisplayEvent::Hide);

        symbol_tx.send("x".to_string()).unwrap();
        assert_eq!(next(&mut rx).await, show("x"));

        drop(symbol_tx);
        task.await.unwrap();
    }
}
