//! Hub actor - owns all client and channel state and processes events.
//!
//! The HubActor is the single owner of the client registry and the channel
//! registry. Events arrive on one mpsc inbox and are handled strictly one at
//! a time, so no lock guards either map.
//!
//! Writes to clients that belong to an event (replies, deliveries) are
//! awaited inside that event's handling. A slow client therefore delays the
//! hub, bounded by each sink's write timeout.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use hubchat_protocol::{wire, ChannelName, Command, CommandKind, Handle, Target};

use super::channel::Channel;
use super::events::{HubError, HubEvent};
use crate::config::HubConfig;
use crate::sink::{ClientId, ClientSink};

// ============================================================================
// Hub Actor
// ============================================================================

/// The hub actor - owns all registries.
///
/// # Ownership
///
/// - `clients`: registered handle -> that client's sink (the only place
///   sinks are stored)
/// - `handles`: connection id -> registered handle, for deregistration
/// - `channels`: channel name -> member handles
pub struct HubActor {
    receiver: mpsc::Receiver<HubEvent>,

    clients: HashMap<Handle, ClientSink>,

    handles: HashMap<ClientId, Handle>,

    channels: HashMap<ChannelName, Channel>,

    /// Delete channels when their last member goes away
    prune_empty_channels: bool,
}

impl HubActor {
    pub fn new(receiver: mpsc::Receiver<HubEvent>, config: &HubConfig) -> Self {
        Self {
            receiver,
            clients: HashMap::new(),
            handles: HashMap::new(),
            channels: HashMap::new(),
            prune_empty_channels: config.prune_empty_channels,
        }
    }

    /// Runs the event loop until every sender is dropped.
    pub async fn run(mut self) {
        info!("Hub starting");

        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event).await;
        }

        info!(
            clients = self.clients.len(),
            channels = self.channels.len(),
            "Hub stopped"
        );
    }

    async fn handle_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::Register {
                client,
                handle,
                respond_to,
            } => {
                let result = self.handle_register(&client, handle).await;
                // Session may have gone away; nothing to do then
                let _ = respond_to.send(result);
            }
            HubEvent::Deregister { client_id } => {
                self.handle_deregister(client_id);
            }
            HubEvent::Command { client, command } => {
                if let Err(e) = self.handle_command(&client, command).await {
                    debug!(client_id = client.id(), error = %e, "Command rejected");
                    reply(&client, &wire::error_line(&e)).await;
                }
            }
            HubEvent::GetUsers { respond_to } => {
                let _ = respond_to.send(self.sorted_users());
            }
            HubEvent::GetChannels { respond_to } => {
                let _ = respond_to.send(self.sorted_channels());
            }
            HubEvent::GetChannelMembers {
                channel,
                respond_to,
            } => {
                let members = self.channels.get(&channel).map(|ch| {
                    let mut members: Vec<Handle> = ch.members().cloned().collect();
                    members.sort();
                    members
                });
                let _ = respond_to.send(members);
            }
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Claims a handle. The outcome line is written to the client here.
    async fn handle_register(
        &mut self,
        client: &ClientSink,
        handle: Handle,
    ) -> Result<(), HubError> {
        let result = self.try_register(client, handle);

        match &result {
            Ok(()) => reply(client, wire::OK_LINE).await,
            Err(e) => reply(client, &wire::error_line(e)).await,
        }

        result
    }

    fn try_register(&mut self, client: &ClientSink, handle: Handle) -> Result<(), HubError> {
        if let Some(current) = self.handles.get(&client.id()) {
            return Err(HubError::AlreadyRegistered(current.clone()));
        }

        if self.clients.contains_key(&handle) {
            debug!(client_id = client.id(), handle = %handle, "Handle already taken");
            return Err(HubError::UsernameTaken(handle));
        }

        info!(client_id = client.id(), handle = %handle, "Client registered");
        self.handles.insert(client.id(), handle.clone());
        self.clients.insert(handle, client.clone());
        Ok(())
    }

    fn handle_deregister(&mut self, client_id: ClientId) {
        let Some(handle) = self.handles.remove(&client_id) else {
            debug!(client_id, "Deregister for unregistered client");
            return;
        };

        self.clients.remove(&handle);

        for channel in self.channels.values_mut() {
            channel.leave(&handle);
        }
        if self.prune_empty_channels {
            self.channels.retain(|_, channel| !channel.is_empty());
        }

        info!(client_id, handle = %handle, "Client deregistered");
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn handle_command(
        &mut self,
        client: &ClientSink,
        command: Command,
    ) -> Result<(), HubError> {
        let Command {
            kind,
            sender,
            target,
            body,
        } = command;

        if kind == CommandKind::Register {
            let Some(Target::User(handle)) = target else {
                return Err(HubError::Malformed(kind));
            };
            // Outcome already written to the client
            let _ = self.handle_register(client, handle).await;
            return Ok(());
        }

        let sender = self.resolve_sender(client, sender)?;

        match (kind, target, body) {
            (CommandKind::Join, Some(Target::Channel(channel)), _) => {
                self.join_channel(sender, channel);
                Ok(())
            }
            (CommandKind::Leave, Some(Target::Channel(channel)), _) => {
                self.leave_channel(&sender, &channel);
                Ok(())
            }
            (CommandKind::Send, Some(target), Some(body)) => {
                self.message(&sender, target, &body).await
            }
            (CommandKind::ListChannels, _, _) => {
                self.list_channels(client).await;
                Ok(())
            }
            (CommandKind::ListUsers, _, _) => {
                self.list_users(client).await;
                Ok(())
            }
            (kind, _, _) => {
                warn!(client_id = client.id(), kind = %kind, "Malformed command");
                Err(HubError::Malformed(kind))
            }
        }
    }

    /// The sender must be registered, and registered by this very client.
    fn resolve_sender(
        &self,
        client: &ClientSink,
        sender: Option<Handle>,
    ) -> Result<Handle, HubError> {
        let sender = sender.ok_or(HubError::NotRegistered)?;
        match self.clients.get(&sender) {
            Some(sink) if sink.id() == client.id() => Ok(sender),
            _ => Err(HubError::NotRegistered),
        }
    }

    fn join_channel(&mut self, handle: Handle, name: ChannelName) {
        let channel = self.channels.entry(name.clone()).or_insert_with(|| {
            info!(channel = %name, "Channel created");
            Channel::new(name)
        });

        if channel.join(handle.clone()) {
            debug!(channel = %channel.name(), handle = %handle, members = channel.len(), "Joined channel");
        }
    }

    fn leave_channel(&mut self, handle: &Handle, name: &ChannelName) {
        let Some(channel) = self.channels.get_mut(name) else {
            return;
        };

        if channel.leave(handle) {
            debug!(channel = %name, handle = %handle, "Left channel");
        }

        if self.prune_empty_channels && channel.is_empty() {
            self.channels.remove(name);
            info!(channel = %name, "Removed empty channel");
        }
    }

    async fn message(
        &self,
        sender: &Handle,
        target: Target,
        body: &[u8],
    ) -> Result<(), HubError> {
        match target {
            Target::Channel(name) => {
                let channel = self
                    .channels
                    .get(&name)
                    .ok_or_else(|| HubError::NoSuchChannel(name.clone()))?;

                if !channel.contains(sender) {
                    return Err(HubError::NotAMember(name));
                }

                let delivered = channel.broadcast(&self.clients, sender, body).await;
                debug!(
                    channel = %name,
                    sender = %sender,
                    bytes = body.len(),
                    delivered,
                    "Channel message"
                );
                Ok(())
            }
            Target::User(handle) => {
                let recipient = self
                    .clients
                    .get(&handle)
                    .ok_or_else(|| HubError::NoSuchUser(handle.clone()))?;

                if let Err(e) = recipient.send(&wire::direct_line(body)).await {
                    debug!(recipient = %handle, error = %e, "Failed to deliver direct message");
                }
                debug!(sender = %sender, recipient = %handle, bytes = body.len(), "Direct message");
                Ok(())
            }
        }
    }

    /// Writes the channel list. With no channels at all, the `ERR` line comes
    /// first and the (empty) list line still follows.
    async fn list_channels(&self, client: &ClientSink) {
        if self.channels.is_empty() {
            reply(client, &wire::error_line(HubError::NoChannels)).await;
        }

        let names = self.sorted_channels();
        reply(client, &wire::list_line(names.iter().map(ChannelName::as_str))).await;
    }

    async fn list_users(&self, client: &ClientSink) {
        let handles = self.sorted_users();
        reply(client, &wire::list_line(handles.iter().map(Handle::as_str))).await;
    }

    fn sorted_users(&self) -> Vec<Handle> {
        let mut handles: Vec<Handle> = self.clients.keys().cloned().collect();
        handles.sort();
        handles
    }

    fn sorted_channels(&self) -> Vec<ChannelName> {
        let mut names: Vec<ChannelName> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Writes one line to a client, logging rather than propagating failure.
async fn reply(client: &ClientSink, line: &[u8]) {
    if let Err(e) = client.send(line).await {
        debug!(client_id = client.id(), error = %e, "Failed to write reply");
    }
}
