//! Unix domain socket server for IPC
//!
//! Provides request-response communication and pushes display events to
//! subscribed clients (the overlay window).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::events::DisplayEvent;
use crate::overlay::PresenterCommand;

use super::protocol::{DaemonStatus, Notification, Request, Response, MAX_FRAME_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    state: Arc<RwLock<ServerState>>,
    shutdown_tx: broadcast::Sender<()>,
    /// Source of display events for subscribed clients
    event_tx: broadcast::Sender<DisplayEvent>,
    /// Requests forwarded to the presenter
    command_tx: mpsc::Sender<PresenterCommand>,
}

/// Shared server state
struct ServerState {
    status: DaemonStatus,
    start_time: std::time::Instant,
}

/// Per-connection handles shared with the client task
#[derive(Clone)]
struct ClientContext {
    state: Arc<RwLock<ServerState>>,
    event_tx: broadcast::Sender<DisplayEvent>,
    command_tx: mpsc::Sender<PresenterCommand>,
}

type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        event_tx: broadcast::Sender<DisplayEvent>,
        command_tx: mpsc::Sender<PresenterCommand>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))
                .context("failed to set socket permissions")?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(RwLock::new(ServerState {
            status: DaemonStatus::default(),
            start_time: std::time::Instant::now(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            state,
            shutdown_tx,
            event_tx,
            command_tx,
        })
    }

    /// Record whether the keyboard hook is installed
    pub async fn set_listener_running(&self, running: bool) {
        self.state.write().await.status.listener_running = running;
    }

    /// Update the server's view of what the overlay shows
    pub async fn apply_event(&self, event: &DisplayEvent) {
        self.state.write().await.status.apply(event);
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let ctx = ClientContext {
                        state: Arc::clone(&self.state),
                        event_tx: self.event_tx.clone(),
                        command_tx: self.command_tx.clone(),
                    };
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, ctx) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, ctx: ClientContext) -> Result<()> {
        let (mut reader, writer) = stream.into_split();
        let writer: SharedWriter = Arc::new(Mutex::new(writer));
        let mut forwarder: Option<JoinHandle<()>> = None;

        let result: Result<()> = async {
            while let Some(body) = read_frame(&mut reader).await? {
                let mut subscription = None;

                let response = match serde_json::from_slice::<Request>(&body) {
                    Ok(request) => {
                        debug!(?request, "received request");
                        if request == Request::Subscribe && forwarder.is_none() {
                            // subscribe before answering so no event is missed
                            subscription = Some(ctx.event_tx.subscribe());
                        }
                        Self::process_request(request, &ctx).await
                    }
                    Err(e) => {
                        warn!(?e, "failed to parse request");
                        Response::Error {
                            code: "bad_request".to_string(),
                            message: e.to_string(),
                        }
                    }
                };

                send_message(&mut *writer.lock().await, &response).await?;

                if let Some(event_rx) = subscription {
                    debug!("client subscribed to notifications");
                    forwarder = Some(spawn_forwarder(event_rx, Arc::clone(&writer)));
                }
            }
            Ok::<(), anyhow::Error>(())
        }
        .await;

        if let Some(forwarder) = forwarder {
            forwarder.abort();
        }
        result
    }

    /// Process a request and return a response
    async fn process_request(request: Request, ctx: &ClientContext) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let mut state = ctx.state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                Response::Status(state.status.clone())
            }

            Request::Subscribe => Response::Subscribed,

            Request::Clear => match ctx.command_tx.send(PresenterCommand::Clear).await {
                Ok(()) => {
                    info!("clear requested via IPC");
                    Response::Cleared
                }
                Err(_) => Response::Error {
                    code: "unavailable".to_string(),
                    message: "presenter is not running".to_string(),
                },
            },
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Push display events to one subscribed client until it goes away
fn spawn_forwarder(
    mut event_rx: broadcast::Receiver<DisplayEvent>,
    writer: SharedWriter,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    let notification = Notification::Display { event };
                    if let Err(e) = send_message(&mut *writer.lock().await, &notification).await {
                        debug!(?e, "subscriber write failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Read one length-prefixed frame. `None` on disconnect or oversized frame.
async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            debug!("client disconnected");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        warn!(len, "message too large, disconnecting");
        return Ok(None);
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Send a length-prefixed JSON message
async fn send_message<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn frame(json: &str) -> Vec<u8> {
        let mut bytes = (json.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(json.as_bytes());
        bytes
    }

    #[tokio::test]
    async fn test_send_message_framing() {
        let body = br#"{"type":"pong"}"#;
        let mut mock = tokio_test::io::Builder::new()
            .write(&(body.len() as u32).to_le_bytes())
            .write(body)
            .build();

        send_message(&mut mock, &Response::Pong).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_frame_until_eof() {
        let mut mock = tokio_test::io::Builder::new()
            .read(&frame(r#"{"type":"ping"}"#))
            .build();

        let body = read_frame(&mut mock).await.unwrap().unwrap();
        assert_eq!(body, br#"{"type":"ping"}"#);
        assert!(read_frame(&mut mock).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_disconnects() {
        let len = (MAX_FRAME_LEN as u32 + 1).to_le_bytes();
        let mut mock = tokio_test::io::Builder::new().read(&len).build();
        assert!(read_frame(&mut mock).await.unwrap().is_none());
    }

    async fn request(stream: &mut UnixStream, json: &str) -> serde_json::Value {
        stream.write_all(&frame(json)).await.unwrap();
        next_message(stream).await
    }

    async fn next_message(stream: &mut UnixStream) -> serde_json::Value {
        let body = tokio::time::timeout(Duration::from_secs(2), read_frame(stream))
            .await
            .expect("timed out waiting for message")
            .unwrap()
            .expect("server closed connection");
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_client_session() {
        let socket_path = std::env::temp_dir().join(format!(
            "keypressed-test-{}-session.sock",
            std::process::id()
        ));
        let (event_tx, _) = broadcast::channel(16);
        let (command_tx, mut command_rx) = mpsc::channel(4);

        let server = Arc::new(Server::new(&socket_path, event_tx.clone(), command_tx).unwrap());
        let running = Arc::clone(&server);
        tokio::spawn(async move { running.run().await });

        let mut client = UnixStream::connect(&socket_path).await.unwrap();

        assert_eq!(request(&mut client, r#"{"type":"ping"}"#).await["type"], "pong");

        let reply = request(&mut client, "not json").await;
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["code"], "bad_request");

        assert_eq!(request(&mut client, r#"{"type":"subscribe"}"#).await["type"], "subscribed");
        event_tx
            .send(DisplayEvent::Show {
                text: "Ctrl+z".to_string(),
            })
            .unwrap();
        let note = next_message(&mut client).await;
        assert_eq!(note["type"], "display");
        assert_eq!(note["event"]["text"], "Ctrl+z");

        assert_eq!(request(&mut client, r#"{"type":"clear"}"#).await["type"], "cleared");
        assert_eq!(command_rx.recv().await, Some(PresenterCommand::Clear));

        server.set_listener_running(true).await;
        server
            .apply_event(&DisplayEvent::Show {
                text: "q".to_string(),
            })
            .await;
        let status = request(&mut client, r#"{"type":"get_status"}"#).await;
        assert_eq!(status["type"], "status");
        assert_eq!(status["listener_running"], true);
        assert_eq!(status["visible"], true);
        assert_eq!(status["text"], "q");

        server.shutdown().await;
        assert!(!socket_path.exists());
    }
}
