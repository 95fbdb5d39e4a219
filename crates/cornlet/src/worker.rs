//! Connection loop - runs one worker connection to the host.
//!
//! Lifecycle:
//! - **Connecting**: dial the host on loopback
//! - **Ready**: application resolved and held for the connection's lifetime
//! - **ReadHeader / ReadPayload / Dispatch**: one request at a time, response
//!   fully written before the next header is read
//! - **Disconnected**: host closed, framing error, timeout, or I/O failure
//!
//! There is no reconnection; a supervisor outside this process restarts it.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::Instrument;

use crate::adapter;
use crate::app::App;
use crate::bridge::codec::{Frame, FrameCodec, FrameError};
use crate::bridge::protocol::{MessageType, ResponseMessage};
use crate::bridge::transport;
use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::registry::AppRegistry;
use crate::response;
use crate::scope;

/// Identifier for one host connection, used to correlate logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a connection stopped.
#[derive(Debug)]
pub enum Disconnect {
    /// Stream ended between frames.
    HostClosed,
    /// Stream ended mid-frame, or the host sent an invalid header.
    Framing(FrameError),
    /// A started frame or a response write stalled past the I/O timeout.
    Timeout(Duration),
    /// Transport or encoding failure.
    Io(io::Error),
}

impl Disconnect {
    /// Whether the connection ended abnormally.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Io(_))
    }

    fn from_write(err: FrameError) -> Self {
        match err {
            FrameError::Io(e) => Self::Io(e),
            other => Self::Io(io::Error::new(io::ErrorKind::InvalidData, other)),
        }
    }
}

impl From<FrameError> for Disconnect {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(e) => Self::Io(e),
            other => Self::Framing(other),
        }
    }
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostClosed => write!(f, "host closed the connection"),
            Self::Framing(e) => write!(f, "framing error: {e}"),
            Self::Timeout(limit) => write!(f, "I/O stalled for {limit:?}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

/// Serves requests from one host stream with a resolved application.
pub struct Connection {
    id: ConnectionId,
    app: Arc<dyn App>,
    io_timeout: Option<Duration>,
    served: u64,
}

impl Connection {
    pub fn new(app: Arc<dyn App>, io_timeout: Option<Duration>) -> Self {
        Self {
            id: ConnectionId::new(),
            app,
            io_timeout,
            served: 0,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Requests answered so far.
    pub fn served(&self) -> u64 {
        self.served
    }

    /// Run the read → dispatch → write loop until the connection ends.
    pub async fn serve<S>(&mut self, stream: S) -> Disconnect
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (reader, writer) = tokio::io::split(stream);
        let mut reader = FramedRead::new(reader, FrameCodec::new());
        let mut writer = FramedWrite::new(writer, FrameCodec::new());

        loop {
            let frame = match next_frame(&mut reader, self.io_timeout).await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Disconnect::HostClosed,
                Err(disconnect) => return disconnect,
            };

            let seq = self.served + 1;
            let span = tracing::debug_span!("request", seq);
            let response = self.handle(frame).instrument(span).await;

            let frame = match response::encode(&response) {
                Ok(frame) => frame,
                Err(e) => return Disconnect::Io(e),
            };
            let write = writer.send(frame);
            let written = match self.io_timeout {
                Some(limit) => match tokio::time::timeout(limit, write).await {
                    Ok(result) => result,
                    Err(_) => return Disconnect::Timeout(limit),
                },
                None => write.await,
            };
            if let Err(e) = written {
                return Disconnect::from_write(e);
            }
            self.served = seq;
        }
    }

    async fn handle(&self, frame: Frame) -> ResponseMessage {
        match frame.message_type {
            MessageType::Json => match scope::decode(&frame.payload) {
                Ok(scope) => {
                    tracing::debug!(
                        method = %scope.method,
                        path = %scope.path,
                        "Dispatching request"
                    );
                    let response = adapter::dispatch(self.app.as_ref(), &scope).await;
                    tracing::debug!(
                        status = response.status,
                        body_bytes = response.body.len(),
                        "Request complete"
                    );
                    response
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed request payload");
                    response::internal_error(e.to_string())
                }
            },
            other => {
                tracing::warn!(message_type = %other, "Unsupported message type");
                response::internal_error(format!("unsupported message type: {other}"))
            }
        }
    }
}

/// Read the next frame.
///
/// Waiting for a frame to start is unbounded. A frame that has started gets at
/// least one full `io_timeout` window, and at most two, to complete.
async fn next_frame<R>(
    reader: &mut FramedRead<R, FrameCodec>,
    io_timeout: Option<Duration>,
) -> Result<Option<Frame>, Disconnect>
where
    R: AsyncRead + Unpin,
{
    let Some(limit) = io_timeout else {
        return reader.next().await.transpose().map_err(Disconnect::from);
    };

    let mut started = false;
    loop {
        match tokio::time::timeout(limit, reader.next()).await {
            Ok(next) => return next.transpose().map_err(Disconnect::from),
            Err(_) => {
                let partial = reader.decoder().in_frame() || !reader.read_buffer().is_empty();
                if partial && started {
                    return Err(Disconnect::Timeout(limit));
                }
                started = partial;
            }
        }
    }
}

/// Connect to the host, load the configured application, and serve until the
/// connection ends.
///
/// Startup failures are returned as errors; once serving, the reason the
/// connection ended is returned as a [`Disconnect`].
pub async fn run_worker(
    config: WorkerConfig,
    registry: &AppRegistry,
) -> Result<Disconnect, WorkerError> {
    let addr = transport::host_addr(config.port);
    tracing::info!(%addr, "Connecting to host");
    let stream = transport::connect(config.port)
        .await
        .map_err(|source| WorkerError::Connect { addr, source })?;
    tracing::info!(%addr, "Connected to host");

    let app = registry
        .resolve(&config.app_ref)
        .map_err(|source| WorkerError::Resolve {
            app_ref: config.app_ref.clone(),
            source,
        })?;
    tracing::info!(app = %config.app_ref, "Loaded application");

    let mut conn = Connection::new(app, config.io_timeout);
    let span = tracing::info_span!("connection", id = %conn.id());
    let disconnect = conn.serve(stream).instrument(span).await;

    match &disconnect {
        Disconnect::HostClosed => {
            tracing::info!(served = conn.served(), "Host disconnected")
        }
        Disconnect::Framing(e) => {
            tracing::warn!(served = conn.served(), error = %e, "Host closed mid-frame")
        }
        Disconnect::Timeout(_) | Disconnect::Io(_) => {
            tracing::error!(served = conn.served(), reason = %disconnect, "Connection failed")
        }
    }
    Ok(disconnect)
}
