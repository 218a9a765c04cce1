//! The `Command` value handed from a session to the hub.

use std::fmt;

use crate::{ChannelName, Handle, Target};

/// Kind of a client command, one per protocol keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Register,
    Join,
    Leave,
    Send,
    ListChannels,
    ListUsers,
}

impl CommandKind {
    /// Looks up a keyword. The caller is expected to have uppercased it.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "REG" => Some(Self::Register),
            "JOIN" => Some(Self::Join),
            "LEAVE" => Some(Self::Leave),
            "SEND" => Some(Self::Send),
            "CHNS" => Some(Self::ListChannels),
            "USRS" => Some(Self::ListUsers),
            _ => None,
        }
    }

    /// The wire keyword for this kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Register => "REG",
            Self::Join => "JOIN",
            Self::Leave => "LEAVE",
            Self::Send => "SEND",
            Self::ListChannels => "CHNS",
            Self::ListUsers => "USRS",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A validated command.
///
/// `sender` is the issuing session's registered handle, or `None` while the
/// session is unregistered; the hub decides which kinds need one. `body` is
/// opaque bytes and is only set for [`CommandKind::Send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub sender: Option<Handle>,
    pub target: Option<Target>,
    pub body: Option<Vec<u8>>,
}

impl Command {
    pub fn register(sender: Option<Handle>, handle: Handle) -> Self {
        Self {
            kind: CommandKind::Register,
            sender,
            target: Some(Target::User(handle)),
            body: None,
        }
    }

    pub fn join(sender: Option<Handle>, channel: ChannelName) -> Self {
        Self {
            kind: CommandKind::Join,
            sender,
            target: Some(Target::Channel(channel)),
            body: None,
        }
    }

    pub fn leave(sender: Option<Handle>, channel: ChannelName) -> Self {
        Self {
            kind: CommandKind::Leave,
            sender,
            target: Some(Target::Channel(channel)),
            body: None,
        }
    }

    pub fn send(sender: Option<Handle>, target: Target, body: Vec<u8>) -> Self {
        Self {
            kind: CommandKind::Send,
            sender,
            target: Some(target),
            body: Some(body),
        }
    }

    pub fn list_channels(sender: Option<Handle>) -> Self {
        Self {
            kind: CommandKind::ListChannels,
            sender,
            target: None,
            body: None,
        }
    }

    pub fn list_users(sender: Option<Handle>) -> Self {
        Self {
            kind: CommandKind::ListUsers,
            sender,
            target: None,
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_matches_display() {
        for kind in [
            CommandKind::Register,
            CommandKind::Join,
            CommandKind::Leave,
            CommandKind::Send,
            CommandKind::ListChannels,
            CommandKind::ListUsers,
        ] {
            assert_eq!(CommandKind::from_keyword(&kind.to_string()), Some(kind));
        }
        assert_eq!(CommandKind::from_keyword("MSG"), None);
        assert_eq!(CommandKind::from_keyword("reg"), None);
    }

    #[test]
    fn test_send_carries_body() {
        let cmd = Command::send(
            Handle::parse("@a").ok(),
            Target::parse("#c").unwrap(),
            b"hi".to_vec(),
        );
        assert_eq!(cmd.kind, CommandKind::Send);
        assert_eq!(cmd.body.as_deref(), Some(&b"hi"[..]));
    }
}
