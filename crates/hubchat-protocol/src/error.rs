//! Validation errors produced while parsing client input.

use thiserror::Error;

/// A constraint violated by one line (or frame) of client input.
///
/// The `Display` text is what the client sees after the `ERR ` prefix, so
/// every variant reads as a complete sentence on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Keyword did not match any known command.
    #[error("Unknown command {0}")]
    UnknownCommand(String),

    /// `REG` without a handle.
    #[error("Username can't be blank")]
    EmptyHandle,

    /// Handle present but not starting with `@`.
    #[error("Username must begin with @")]
    HandleSigil,

    /// `JOIN`/`LEAVE` without a channel.
    #[error("Channel ID can't be blank")]
    EmptyChannel,

    /// Channel present but not starting with `#`.
    #[error("Channel ID must begin with #")]
    ChannelSigil,

    /// `SEND` without a recipient.
    #[error("recipient must have a name")]
    EmptyRecipient,

    /// Recipient present but starting with neither sigil.
    #[error("recipient must be a channel ('#name') or user ('@user')")]
    RecipientSigil,

    /// `SEND <recipient>` with nothing after the recipient.
    #[error("body length must be present")]
    MissingLength,

    /// Length token is not a non-negative integer.
    #[error("body length must be a non-negative integer, got '{0}'")]
    InvalidLength(String),

    /// Length parsed but is zero.
    #[error("body length must be at least 1")]
    ZeroLength,

    /// Fewer body bytes arrived than the header declared.
    #[error("message body shorter than declared length ({actual} of {expected} bytes)")]
    ShortBody { expected: usize, actual: usize },

    /// Declared body length is over the configured maximum.
    #[error("body length {length} exceeds maximum of {max} bytes")]
    BodyTooLarge { length: usize, max: usize },

    /// A header line grew past the configured maximum without a terminator.
    #[error("line exceeds maximum of {max} bytes")]
    LineTooLong { max: usize },

    /// Arguments other than the body must be UTF-8.
    #[error("command arguments must be valid UTF-8")]
    InvalidUtf8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_display_carries_keyword() {
        let err = ValidationError::UnknownCommand("PING".to_string());
        assert_eq!(err.to_string(), "Unknown command PING");
    }

    #[test]
    fn test_empty_and_sigil_errors_differ() {
        assert_ne!(
            ValidationError::EmptyHandle.to_string(),
            ValidationError::HandleSigil.to_string()
        );
        assert_ne!(
            ValidationError::EmptyChannel.to_string(),
            ValidationError::ChannelSigil.to_string()
        );
        assert_ne!(
            ValidationError::EmptyRecipient.to_string(),
            ValidationError::RecipientSigil.to_string()
        );
    }

    #[test]
    fn test_short_body_display() {
        let err = ValidationError::ShortBody {
            expected: 10,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "message body shorter than declared length (3 of 10 bytes)"
        );
    }
}
