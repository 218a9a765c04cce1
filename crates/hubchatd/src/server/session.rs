//! Per-connection session.
//!
//! A session owns the read half of one client transport. It decodes the
//! byte stream into requests, answers validation failures itself, and hands
//! everything else to the hub. It is the only place a client's registered
//! handle is remembered outside the hub.
//!
//! The session always deregisters from the hub on the way out, whether the
//! stream ended cleanly or failed.

use std::time::Duration;

use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::time::timeout;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use hubchat_protocol::{wire, CommandCodec, Frame, Handle, Request, ValidationError};

use crate::config::SessionConfig;
use crate::hub::{HubError, HubHandle};
use crate::sink::{ClientSink, SinkError};

/// One client's command loop.
pub struct Session<R> {
    framed: FramedRead<R, CommandCodec>,
    sink: ClientSink,
    hub: HubHandle,
    /// Set once the hub confirms a REG
    handle: Option<Handle>,
    body_timeout: Duration,
}

impl<R> Session<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, sink: ClientSink, hub: HubHandle, config: &SessionConfig) -> Self {
        let codec = CommandCodec::with_limits(config.max_line_bytes, config.max_body_bytes);
        Self {
            framed: FramedRead::new(reader, codec),
            sink,
            hub,
            handle: None,
            body_timeout: config.body_timeout(),
        }
    }

    /// Runs until the client disconnects or the transport fails.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let client_id = self.sink.id();
        debug!(client_id, "Session started");

        let result = self.process_frames().await;

        if let Err(e) = self.hub.deregister(client_id).await {
            debug!(client_id, error = %e, "Deregister after disconnect failed");
        }
        if let Err(e) = self.sink.shutdown().await {
            debug!(client_id, error = %e, "Failed to shut down writer");
        }

        match &result {
            Ok(()) => info!(client_id, handle = ?self.handle, "Client disconnected"),
            Err(e) => warn!(client_id, handle = ?self.handle, error = %e, "Session ended with error"),
        }
        result
    }

    async fn process_frames(&mut self) -> Result<(), SessionError> {
        let mut awaiting_body: Option<usize> = None;

        'frames: loop {
            let next = match awaiting_body.take() {
                Some(length) => {
                    // Idle timeout: keep waiting as long as body bytes arrive
                    let mut buffered = self.framed.read_buffer().len();
                    loop {
                        match timeout(self.body_timeout, self.framed.next()).await {
                            Ok(next) => break next,
                            Err(_) => {
                                let now = self.framed.read_buffer().len();
                                if now > buffered {
                                    buffered = now;
                                    continue;
                                }
                                self.abandon_body(length).await?;
                                continue 'frames;
                            }
                        }
                    }
                }
                None => self.framed.next().await,
            };

            let Some(frame) = next else {
                return Ok(());
            };

            match frame.map_err(|e| SessionError::Io(e.to_string()))? {
                Frame::Request(request) => self.handle_request(request).await?,
                Frame::Invalid(err) => self.reject(&err).await?,
                Frame::AwaitingBody { length } => awaiting_body = Some(length),
            }
        }
    }

    async fn handle_request(&mut self, request: Request) -> Result<(), SessionError> {
        let client_id = self.sink.id();
        debug!(client_id, command = %request.kind(), "Received command");

        match request {
            Request::Register(handle) => {
                match self.hub.register(self.sink.clone(), handle.clone()).await {
                    Ok(()) => self.handle = Some(handle),
                    Err(HubError::ChannelClosed) => return Err(SessionError::HubClosed),
                    // Already reported to the client by the hub
                    Err(e) => debug!(client_id, error = %e, "Registration refused"),
                }
            }
            request => {
                let command = request.into_command(self.handle.clone());
                self.hub
                    .submit(self.sink.clone(), command)
                    .await
                    .map_err(|_| SessionError::HubClosed)?;
            }
        }

        Ok(())
    }

    async fn reject(&self, err: &ValidationError) -> Result<(), SessionError> {
        debug!(client_id = self.sink.id(), error = %err, "Invalid command");
        self.sink.send(&wire::error_line(err)).await?;
        Ok(())
    }

    /// No SEND body bytes arrived for a whole `body_timeout`. Reports the
    /// short body and drops the buffered part; the codec skips the rest of
    /// the declared length if it turns up later.
    async fn abandon_body(&mut self, expected: usize) -> Result<(), SessionError> {
        let buffered = self.framed.read_buffer().len();
        debug!(client_id = self.sink.id(), expected, buffered, "Body read timed out");

        let err = self
            .framed
            .decoder_mut()
            .abandon_body(buffered)
            .unwrap_or(ValidationError::ShortBody {
                expected,
                actual: buffered,
            });
        self.framed.read_buffer_mut().clear();

        self.reject(&err).await
    }
}

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Write failed: {0}")]
    Write(#[from] SinkError),

    #[error("Hub is not running")]
    HubClosed,
}
