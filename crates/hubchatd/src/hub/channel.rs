//! A named channel and its member set.

use std::collections::{HashMap, HashSet};

use hubchat_protocol::{wire, ChannelName, Handle};
use tracing::debug;

use crate::sink::ClientSink;

/// A channel owned by the hub.
///
/// Members are stored as handles, never as sinks; writes resolve each handle
/// through the hub's client registry at delivery time.
#[derive(Debug)]
pub struct Channel {
    name: ChannelName,
    members: HashSet<Handle>,
}

impl Channel {
    pub fn new(name: ChannelName) -> Self {
        Self {
            name,
            members: HashSet::new(),
        }
    }

    pub fn name(&self) -> &ChannelName {
        &self.name
    }

    /// Adds a member. Returns false if it was already present.
    pub fn join(&mut self, handle: Handle) -> bool {
        self.members.insert(handle)
    }

    /// Removes a member. Returns false if it was not present.
    pub fn leave(&mut self, handle: &Handle) -> bool {
        self.members.remove(handle)
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.members.contains(handle)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> impl Iterator<Item = &Handle> {
        self.members.iter()
    }

    /// Writes `"<sender>: <body>\n"` to every member, the sender included.
    ///
    /// A failed write to one member is logged and skipped; it never stops
    /// delivery to the rest. Returns how many members were written to.
    pub async fn broadcast(
        &self,
        clients: &HashMap<Handle, ClientSink>,
        sender: &Handle,
        body: &[u8],
    ) -> usize {
        let line = wire::channel_line(sender, body);
        let mut delivered = 0;

        for member in &self.members {
            let Some(sink) = clients.get(member) else {
                debug!(channel = %self.name, member = %member, "Member has no sink, skipping");
                continue;
            };

            match sink.send(&line).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    debug!(
                        channel = %self.name,
                        member = %member,
                        error = %e,
                        "Failed to deliver channel message"
                    );
                }
            }
        }

        delivered
    }
}
