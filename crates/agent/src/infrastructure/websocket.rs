//! Game server channel using tokio-tungstenite.
//!
//! The connection is split into a reader task, which decodes frames and feeds
//! the dispatcher's inbound queue, and a writer task, which drains the outbound
//! command queue. Keepalive pings are answered from the reader through a
//! priority control queue. There is no reconnection: when the channel closes
//! the inbound queue ends and the session is over.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use pokerbot_shared::{ClientMessage, ProtocolError, ServerMessage};

/// Buffer size for the inbound and outbound message queues.
pub const CHANNEL_BUFFER: usize = 256;

const CONTROL_BUFFER: usize = 16;

/// How long `close` waits for the writer to flush the close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Failed to connect to {url}: {message}")]
    Connect { url: String, message: String },
}

/// What the bot does once the channel is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeMode {
    /// Ask for the table listing straight away.
    RequestTables,
    /// Wait for the server to announce our identity.
    AwaitIdentity,
}

impl fmt::Display for HandshakeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeMode::RequestTables => write!(f, "request_tables"),
            HandshakeMode::AwaitIdentity => write!(f, "await_identity"),
        }
    }
}

impl FromStr for HandshakeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "request_tables" | "tables" => Ok(HandshakeMode::RequestTables),
            "await_identity" | "identity" | "wait" => Ok(HandshakeMode::AwaitIdentity),
            other => Err(format!(
                "expected request_tables or await_identity, got '{other}'"
            )),
        }
    }
}

/// Frames the reader asks the writer to send ahead of queued commands.
#[derive(Debug)]
enum Control {
    Pong(Vec<u8>),
    Close,
}

/// Opens and owns the game server channel.
pub struct ConnectionManager {
    url: String,
    handshake: HandshakeMode,
}

/// An open channel: the inbound queue for the dispatcher, the outbound queue
/// for commands, and a handle to tear it down.
pub struct Connection {
    pub inbound: mpsc::Receiver<ServerMessage>,
    pub outbound: mpsc::Sender<ClientMessage>,
    pub handle: ConnectionHandle,
}

pub struct ConnectionHandle {
    control: mpsc::Sender<Control>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>, handshake: HandshakeMode) -> Self {
        Self {
            url: url.into(),
            handshake,
        }
    }

    pub async fn open(&self) -> Result<Connection, ConnectionError> {
        let (ws_stream, _) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| ConnectionError::Connect {
                    url: self.url.clone(),
                    message: e.to_string(),
                })?;
        tracing::info!(url = %self.url, handshake = %self.handshake, "Connected to the game server");

        let (mut write, mut read) = ws_stream.split();

        let (inbound_tx, inbound_rx) = mpsc::channel::<ServerMessage>(CHANNEL_BUFFER);
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<ClientMessage>(CHANNEL_BUFFER);
        let (control_tx, mut control_rx) = mpsc::channel::<Control>(CONTROL_BUFFER);

        let reader_control = control_tx.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match ServerMessage::decode(&text) {
                        Ok(msg) => {
                            tracing::debug!(key = msg.key(), "Received server message");
                            if inbound_tx.send(msg).await.is_err() {
                                tracing::debug!("Dispatcher gone, stopping reader");
                                break;
                            }
                        }
                        Err(ProtocolError::UnknownKey(key)) => {
                            tracing::warn!(key = %key, "Ignoring unrecognized message key");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to decode server frame");
                        }
                    },
                    Ok(Message::Ping(payload)) => {
                        // Answer before looking at the next frame.
                        if reader_control.send(Control::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        match frame {
                            Some(frame) => tracing::info!(
                                code = u16::from(frame.code),
                                reason = %frame.reason,
                                "Connection closed by server"
                            ),
                            None => tracing::info!("Connection closed by server without a close frame"),
                        }
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "WebSocket transport error");
                        break;
                    }
                }
            }
            tracing::info!("Server channel ended");
        });

        let writer = tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    biased;
                    control = control_rx.recv() => match control {
                        Some(Control::Pong(payload)) => Message::Pong(payload),
                        Some(Control::Close) => {
                            if let Err(e) = write.send(Message::Close(None)).await {
                                tracing::debug!(error = %e, "Close frame not sent");
                            }
                            break;
                        }
                        None => break,
                    },
                    command = outbound_rx.recv() => match command {
                        Some(command) => match command.to_json() {
                            Ok(json) => {
                                tracing::debug!(key = command.key(), "Sending command");
                                Message::Text(json)
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to serialize command");
                                continue;
                            }
                        },
                        None => break,
                    },
                };

                if let Err(e) = write.send(frame).await {
                    tracing::error!(error = %e, "Failed to send frame");
                    break;
                }
            }
        });

        if self.handshake == HandshakeMode::RequestTables
            && outbound_tx.send(ClientMessage::GetTables).await.is_err()
        {
            tracing::warn!("Writer stopped before the handshake request was queued");
        }

        Ok(Connection {
            inbound: inbound_rx,
            outbound: outbound_tx,
            handle: ConnectionHandle {
                control: control_tx,
                reader,
                writer,
            },
        })
    }
}

impl ConnectionHandle {
    /// Send a close frame and stop both tasks.
    pub async fn close(self) {
        let _ = self.control.send(Control::Close).await;
        drop(self.control);
        if tokio::time::timeout(CLOSE_GRACE, self.writer).await.is_err() {
            tracing::debug!("Writer did not finish within the close grace period");
        }
        self.reader.abort();
        tracing::info!("Connection closed");
    }
}
