//! Client interface for the hub actor.
//!
//! `HubHandle` is cheap to clone; every session holds one. All methods
//! enqueue a `HubEvent` on the shared inbox, and the query methods wait for
//! the actor's reply on a oneshot channel.
//!
//! Channel errors are mapped to `HubError::ChannelClosed`.

use tokio::sync::{mpsc, oneshot};

use hubchat_protocol::{ChannelName, Command, Handle};

use super::events::{HubError, HubEvent};
use crate::sink::{ClientId, ClientSink};

// ============================================================================
// Hub Handle
// ============================================================================

/// Handle for interacting with the hub actor.
///
/// ```ignore
/// let hub = spawn_hub(&config.hub);
///
/// hub.register(sink.clone(), Handle::parse("@alice")?).await?;
/// hub.submit(sink, command).await?;
///
/// let users = hub.users().await?;
/// ```
#[derive(Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubEvent>,
}

impl HubHandle {
    pub fn new(sender: mpsc::Sender<HubEvent>) -> Self {
        Self { sender }
    }

    /// Claims `handle` for `client` and waits for the outcome.
    ///
    /// The hub has already written `OK` or `ERR <reason>` to the client by
    /// the time this returns.
    ///
    /// # Errors
    ///
    /// - `HubError::UsernameTaken` if another client holds the handle
    /// - `HubError::AlreadyRegistered` if `client` already registered
    /// - `HubError::ChannelClosed` if the hub has shut down
    pub async fn register(&self, client: ClientSink, handle: Handle) -> Result<(), HubError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(HubEvent::Register {
                client,
                handle,
                respond_to: tx,
            })
            .await
            .map_err(|_| HubError::ChannelClosed)?;

        rx.await.map_err(|_| HubError::ChannelClosed)?
    }

    /// Removes the client and all of its channel memberships.
    ///
    /// Fire-and-forget. Safe to call for a client that never registered.
    pub async fn deregister(&self, client_id: ClientId) -> Result<(), HubError> {
        self.sender
            .send(HubEvent::Deregister { client_id })
            .await
            .map_err(|_| HubError::ChannelClosed)
    }

    /// Hands a validated command to the hub.
    ///
    /// Returns once the command is queued; any outcome is written to
    /// `client` by the hub.
    pub async fn submit(&self, client: ClientSink, command: Command) -> Result<(), HubError> {
        self.sender
            .send(HubEvent::Command { client, command })
            .await
            .map_err(|_| HubError::ChannelClosed)
    }

    /// Registered handles, sorted.
    pub async fn users(&self) -> Result<Vec<Handle>, HubError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(HubEvent::GetUsers { respond_to: tx })
            .await
            .map_err(|_| HubError::ChannelClosed)?;

        rx.await.map_err(|_| HubError::ChannelClosed)
    }

    /// Existing channel names, sorted.
    pub async fn channels(&self) -> Result<Vec<ChannelName>, HubError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(HubEvent::GetChannels { respond_to: tx })
            .await
            .map_err(|_| HubError::ChannelClosed)?;

        rx.await.map_err(|_| HubError::ChannelClosed)
    }

    /// Members of `channel`, sorted, or `None` if there is no such channel.
    pub async fn channel_members(
        &self,
        channel: ChannelName,
    ) -> Result<Option<Vec<Handle>>, HubError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(HubEvent::GetChannelMembers {
                channel,
                respond_to: tx,
            })
            .await
            .map_err(|_| HubError::ChannelClosed)?;

        rx.await.map_err(|_| HubError::ChannelClosed)
    }

    /// Check if the hub is still running.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}
