//! Outbound half of a client connection.
//!
//! A `ClientSink` is shared between the connection's own session (for
//! validation errors) and the hub (for replies and deliveries). The writer
//! mutex only serializes writes to this one transport; hub state is never
//! behind it.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Connection number assigned at accept time.
pub type ClientId = u64;

type BoxedWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Shared, cheap-to-clone writer for one client transport.
#[derive(Clone)]
pub struct ClientSink {
    id: ClientId,
    writer: Arc<Mutex<BufWriter<BoxedWriter>>>,
    write_timeout: Duration,
}

impl ClientSink {
    /// Wraps the write half of a transport.
    pub fn new<W>(id: ClientId, writer: W, write_timeout: Duration) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        let writer: BoxedWriter = Box::pin(writer);
        Self {
            id,
            writer: Arc::new(Mutex::new(BufWriter::new(writer))),
            write_timeout,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Writes `line` (already `\n`-terminated) and flushes.
    ///
    /// Fails with [`SinkError::Timeout`] if the client does not drain the
    /// bytes within the configured write timeout.
    pub async fn send(&self, line: &[u8]) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().await;

        match timeout(self.write_timeout, async {
            writer.write_all(line).await?;
            writer.flush().await?;
            Ok::<(), std::io::Error>(())
        })
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SinkError::Io(e.to_string())),
            Err(_) => Err(SinkError::Timeout),
        }
    }

    /// Shuts down the write direction of the transport.
    pub async fn shutdown(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().await;
        writer
            .shutdown()
            .await
            .map_err(|e| SinkError::Io(e.to_string()))
    }
}

impl fmt::Debug for ClientSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSink").field("id", &self.id).finish()
    }
}

/// Errors writing to a client transport.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Write timeout")]
    Timeout,
}
