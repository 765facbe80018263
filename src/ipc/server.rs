//! Unix domain socket server for IPC
//!
//! Provides request-response access to the state machine and pushes state
//! events to subscribed clients.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::unix::OwnedReadHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::events::StateEvent;
use crate::state::{Command, ReflectionError, ReflectionState};
use crate::view::ViewModel;

use super::protocol::{Request, Response, MAX_MESSAGE_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<StateEvent>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Create a new IPC server bound to `socket_path`
    pub fn new(
        socket_path: &Path,
        commands: mpsc::Sender<Command>,
        events: broadcast::Sender<StateEvent>,
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

        // Owner-only access
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))
                .context("failed to set socket permissions")?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            commands,
            events,
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let commands = self.commands.clone();
                    let events = self.events.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, commands, events) => {
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
    async fn handle_client(
        stream: UnixStream,
        commands: mpsc::Sender<Command>,
        events: broadcast::Sender<StateEvent>,
    ) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let (request_tx, mut request_rx) = mpsc::channel(16);
        let reader_task = tokio::spawn(Self::read_requests(reader, request_tx));
        let mut event_rx: Option<broadcast::Receiver<StateEvent>> = None;

        let result = loop {
            tokio::select! {
                request = request_rx.recv() => {
                    let response = match request {
                        Some(Ok(request)) => {
                            debug!(?request, "received request");
                            if request == Request::Subscribe && event_rx.is_none() {
                                event_rx = Some(events.subscribe());
                                debug!("client subscribed to notifications");
                            }
                            Self::process_request(request, &commands).await
                        }
                        Some(Err(message)) => Response::Error {
                            code: "bad_request".to_string(),
                            message,
                        },
                        None => break Ok(()),
                    };
                    if let Err(e) = Self::send_message(&mut writer, &response).await {
                        break Err(e);
                    }
                }
                event = Self::next_event(&mut event_rx) => match event {
                    Ok(event) => {
                        let push = Response::Event { event };
                        if let Err(e) = Self::send_message(&mut writer, &push).await {
                            break Err(e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "client event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        event_rx = None;
                    }
                },
            }
        };

        reader_task.abort();
        result
    }

    /// Read length-prefixed requests until the client disconnects
    async fn read_requests(
        mut reader: OwnedReadHalf,
        request_tx: mpsc::Sender<Result<Request, String>>,
    ) {
        loop {
            let body = match read_message(&mut reader).await {
                Ok(Some(body)) => body,
                Ok(None) => {
                    debug!("client disconnected");
                    return;
                }
                Err(e) => {
                    warn!(?e, "failed to read request, disconnecting");
                    return;
                }
            };

            let request = serde_json::from_slice::<Request>(&body)
                .map_err(|e| format!("failed to parse request: {}", e));
            if request_tx.send(request).await.is_err() {
                return;
            }
        }
    }

    async fn next_event(
        event_rx: &mut Option<broadcast::Receiver<StateEvent>>,
    ) -> Result<StateEvent, broadcast::error::RecvError> {
        match event_rx {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
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

    /// Forward a request to the state machine and build the response
    async fn process_request(request: Request, commands: &mpsc::Sender<Command>) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetState => match Self::snapshot(commands).await {
                Some(state) => Response::State(state),
                None => Self::unavailable(),
            },

            Request::GetView => match Self::snapshot(commands).await {
                Some(state) => Response::View(ViewModel::from_state(&state)),
                None => Self::unavailable(),
            },

            Request::SetText { text } => {
                Self::send_command(commands, Command::SetText { text }).await
            }

            Request::Resize { width } => {
                Self::send_command(commands, Command::Resize { width }).await
            }

            Request::Submit => {
                Self::action(commands, |reply| Command::Submit { reply }).await
            }

            Request::StartDictation => {
                Self::action(commands, |reply| Command::StartDictation { reply }).await
            }

            Request::Subscribe => Response::Subscribed,
        }
    }

    async fn send_command(commands: &mpsc::Sender<Command>, command: Command) -> Response {
        match commands.send(command).await {
            Ok(()) => Response::Ok,
            Err(_) => Self::unavailable(),
        }
    }

    async fn action<F>(commands: &mpsc::Sender<Command>, build: F) -> Response
    where
        F: FnOnce(oneshot::Sender<Result<(), ReflectionError>>) -> Command,
    {
        let (reply, outcome) = oneshot::channel();
        if commands.send(build(reply)).await.is_err() {
            return Self::unavailable();
        }
        match outcome.await {
            Ok(Ok(())) => Response::Ok,
            Ok(Err(kind)) => kind.into(),
            Err(_) => Self::unavailable(),
        }
    }

    async fn snapshot(commands: &mpsc::Sender<Command>) -> Option<ReflectionState> {
        let (reply, snapshot) = oneshot::channel();
        commands.send(Command::Snapshot { reply }).await.ok()?;
        snapshot.await.ok()
    }

    fn unavailable() -> Response {
        Response::Error {
            code: "unavailable".to_string(),
            message: "state machine is not running".to_string(),
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

/// Read one length-prefixed message. `Ok(None)` on clean EOF.
async fn read_message<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        anyhow::bail!("message too large ({} bytes)", len);
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}
