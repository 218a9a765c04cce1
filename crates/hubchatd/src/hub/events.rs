//! Hub inbox events and errors.
//!
//! - `HubEvent`: everything a session (or a test) can ask of the hub
//! - `HubError`: state-level failures, reported to the triggering client
//!
//! All sessions share one inbox, so the hub sees registrations,
//! deregistrations and commands in a single arrival order.

use hubchat_protocol::{ChannelName, Command, CommandKind, Handle};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::sink::{ClientId, ClientSink};

// ============================================================================
// Hub Events
// ============================================================================

/// Events sent to the hub actor.
#[derive(Debug)]
pub enum HubEvent {
    /// Claim `handle` for the client behind `client`.
    ///
    /// The hub writes `OK` or the error line to the client itself and also
    /// reports the outcome on `respond_to` so the session can record its
    /// identity before reading the next command.
    ///
    /// # Errors
    /// - `HubError::UsernameTaken` if another client holds the handle
    /// - `HubError::AlreadyRegistered` if this client already has a handle
    Register {
        client: ClientSink,
        handle: Handle,
        respond_to: oneshot::Sender<Result<(), HubError>>,
    },

    /// Forget the client: drop its handle and every channel membership.
    ///
    /// Fire-and-forget; a no-op for unknown or already removed clients.
    Deregister { client_id: ClientId },

    /// A validated command from the client behind `client`.
    ///
    /// Failures are written to `client` as `ERR <reason>` lines.
    Command { client: ClientSink, command: Command },

    /// Snapshot of registered handles, sorted.
    GetUsers {
        respond_to: oneshot::Sender<Vec<Handle>>,
    },

    /// Snapshot of channel names, sorted.
    GetChannels {
        respond_to: oneshot::Sender<Vec<ChannelName>>,
    },

    /// Snapshot of one channel's members, sorted. `None` if it doesn't exist.
    GetChannelMembers {
        channel: ChannelName,
        respond_to: oneshot::Sender<Option<Vec<Handle>>>,
    },
}

// ============================================================================
// Hub Errors
// ============================================================================

/// Errors produced while the hub handles an event.
///
/// The `Display` text is the reason sent after `ERR `.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("username taken")]
    UsernameTaken(Handle),

    #[error("already registered as {0}")]
    AlreadyRegistered(Handle),

    #[error("must register first")]
    NotRegistered,

    #[error("no channels found")]
    NoChannels,

    #[error("no such channel {0}")]
    NoSuchChannel(ChannelName),

    #[error("no such user {0}")]
    NoSuchUser(Handle),

    #[error("not a member of {0}")]
    NotAMember(ChannelName),

    /// A command whose fields don't fit its kind, e.g. JOIN without a channel.
    #[error("malformed {0} command")]
    Malformed(CommandKind),

    /// The hub task has stopped.
    #[error("hub channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_error_display() {
        let err = HubError::UsernameTaken(Handle::parse("@a").unwrap());
        assert_eq!(err.to_string(), "username taken");

        let err = HubError::AlreadyRegistered(Handle::parse("@a").unwrap());
        assert_eq!(err.to_string(), "already registered as @a");

        assert_eq!(HubError::NotRegistered.to_string(), "must register first");
        assert_eq!(HubError::NoChannels.to_string(), "no channels found");

        let err = HubError::NotAMember(ChannelName::parse("#x").unwrap());
        assert_eq!(err.to_string(), "not a member of #x");

        let err = HubError::Malformed(CommandKind::Join);
        assert_eq!(err.to_string(), "malformed JOIN command");
    }

    #[tokio::test]
    async fn test_respond_to_dropped() {
        let (tx, rx) = oneshot::channel::<Result<(), HubError>>();
        drop(tx);
        assert!(rx.await.is_err());
    }
}
