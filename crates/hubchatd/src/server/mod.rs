//! TCP server for the chat daemon.
//!
//! The server:
//! - Listens on a TCP address for client connections
//! - Wraps each connection's write half in a `ClientSink`
//! - Spawns a `Session` per client, all sharing one `HubHandle`
//! - Stops accepting when its `CancellationToken` fires
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   ChatServer    │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │     Session     │────▶│    HubHandle    │
//! │   (per client)  │     │                 │
//! └─────────────────┘     └─────────────────┘
//! ```

mod session;

pub use session::{Session, SessionError};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::hub::HubHandle;
use crate::sink::ClientSink;

/// TCP server accepting chat clients.
pub struct ChatServer {
    listener: TcpListener,

    hub: HubHandle,

    session_config: SessionConfig,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter for generating client IDs
    connection_counter: AtomicU64,
}

impl ChatServer {
    /// Binds the listener. Use port 0 to let the OS pick one.
    pub async fn bind(
        addr: &str,
        hub: HubHandle,
        session_config: SessionConfig,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_string(),
                error: e.to_string(),
            })?;

        Ok(Self {
            listener,
            hub,
            session_config,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::LocalAddr(e.to_string()))
    }

    /// Accepts connections until the cancellation token is triggered.
    ///
    /// Sessions already running are not interrupted; they end when their
    /// clients disconnect.
    pub async fn run(&self) -> Result<(), ServerError> {
        info!(addr = ?self.listener.local_addr().ok(), "Chat server listening");

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let id = self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            debug!(client_id = id, peer = %peer, "Accepted connection");
                            self.handle_connection(stream, id);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_connection(&self, stream: TcpStream, client_id: u64) {
        if !self.hub.is_connected() {
            warn!(client_id, "Hub is not running, dropping connection");
            return;
        }

        if let Err(e) = stream.set_nodelay(true) {
            debug!(client_id, error = %e, "Failed to set TCP_NODELAY");
        }

        let (reader, writer) = stream.into_split();
        let sink = ClientSink::new(client_id, writer, self.session_config.write_timeout());
        let session = Session::new(reader, sink, self.hub.clone(), &self.session_config);

        tokio::spawn(async move {
            // Outcome is logged by the session itself
            let _ = session.run().await;
        });
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: String, error: String },

    #[error("Failed to read local address: {0}")]
    LocalAddr(String),
}
