//! Sigil-prefixed identifiers: user handles and channel names.

use std::fmt;

use crate::ValidationError;

/// Leading character of every user handle.
pub const USER_SIGIL: char = '@';

/// Leading character of every channel name.
pub const CHANNEL_SIGIL: char = '#';

// ============================================================================
// Handle
// ============================================================================

/// A client's registered name, always starting with [`USER_SIGIL`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(String);

impl Handle {
    /// Validates a raw handle. Surrounding whitespace is trimmed.
    ///
    /// Emptiness is checked before the sigil so a blank argument reports
    /// [`ValidationError::EmptyHandle`] rather than a sigil error.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptyHandle);
        }
        if !raw.starts_with(USER_SIGIL) {
            return Err(ValidationError::HandleSigil);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Channel Name
// ============================================================================

/// A channel identifier, always starting with [`CHANNEL_SIGIL`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelName(String);

impl ChannelName {
    /// Validates a raw channel name. Surrounding whitespace is trimmed.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptyChannel);
        }
        if !raw.starts_with(CHANNEL_SIGIL) {
            return Err(ValidationError::ChannelSigil);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Target
// ============================================================================

/// Where a command is aimed: a channel or a single user.
///
/// The two namespaces never overlap because they are told apart by sigil.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Channel(ChannelName),
    User(Handle),
}

impl Target {
    /// Parses a SEND recipient token.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptyRecipient);
        }
        if raw.starts_with(CHANNEL_SIGIL) {
            Ok(Self::Channel(ChannelName(raw.to_string())))
        } else if raw.starts_with(USER_SIGIL) {
            Ok(Self::User(Handle(raw.to_string())))
        } else {
            Err(ValidationError::RecipientSigil)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Channel(name) => name.as_str(),
            Self::User(handle) => handle.as_str(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
