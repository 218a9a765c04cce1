//! Chat hub using the actor pattern.
//!
//! The hub is the single owner of the handle registry and the channel
//! registry. Sessions never touch either map; they send `HubEvent`s to one
//! shared inbox and the actor applies them in arrival order.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐                     ┌─────────────┐     ┌──────────────┐
//! │  Session 1  │──┐                  │             │────▶│ ClientSink 1 │
//! └─────────────┘  │    HubEvent      │  HubActor   │     └──────────────┘
//! ┌─────────────┐  ├──(mpsc inbox)───▶│             │     ┌──────────────┐
//! │  Session N  │──┘                  │             │────▶│ ClientSink N │
//! └─────────────┘                     └─────────────┘     └──────────────┘
//!                                            │
//!                                            ▼
//!                               HashMap<Handle, ClientSink>
//!                               HashMap<ChannelName, Channel>
//! ```

use tokio::sync::mpsc;

use crate::config::HubConfig;

mod actor;
mod channel;
mod events;
mod handle;

pub use actor::HubActor;
pub use channel::Channel;
pub use events::{HubError, HubEvent};
pub use handle::HubHandle;

/// Spawn the hub actor and return a handle for interaction.
///
/// The actor stops once every `HubHandle` clone has been dropped.
pub fn spawn_hub(config: &HubConfig) -> HubHandle {
    let (tx, rx) = mpsc::channel(config.inbox_capacity.max(1));

    let actor = HubActor::new(rx, config);
    tokio::spawn(actor.run());

    HubHandle::new(tx)
}
