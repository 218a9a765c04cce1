//! Line parser for the client command protocol.
//!
//! Every command is one line except `SEND`, whose header line declares a
//! byte length and is followed by exactly that many raw body bytes:
//!
//! ```text
//! REG @alice
//! JOIN #general
//! SEND #general 5\r\nhello
//! ```
//!
//! [`parse_line`] handles one header line and reports when a body is still
//! owed; [`parse_command`] handles a whole frame already held in memory.
//! Neither touches shared state.

use crate::{ChannelName, Command, CommandKind, Handle, Target, ValidationError};

/// A parsed request, before the session stamps its sender onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Register(Handle),
    Join(ChannelName),
    Leave(ChannelName),
    Send { target: Target, body: Vec<u8> },
    ListChannels,
    ListUsers,
}

impl Request {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Register(_) => CommandKind::Register,
            Self::Join(_) => CommandKind::Join,
            Self::Leave(_) => CommandKind::Leave,
            Self::Send { .. } => CommandKind::Send,
            Self::ListChannels => CommandKind::ListChannels,
            Self::ListUsers => CommandKind::ListUsers,
        }
    }

    /// Builds the hub-facing command with `sender` as the issuing handle.
    pub fn into_command(self, sender: Option<Handle>) -> Command {
        match self {
            Self::Register(handle) => Command::register(sender, handle),
            Self::Join(channel) => Command::join(sender, channel),
            Self::Leave(channel) => Command::leave(sender, channel),
            Self::Send { target, body } => Command::send(sender, target, body),
            Self::ListChannels => Command::list_channels(sender),
            Self::ListUsers => Command::list_users(sender),
        }
    }
}

/// A `SEND` header whose body has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub target: Target,
    /// Exact number of body bytes that follow the header. Always >= 1.
    pub length: usize,
}

impl PendingSend {
    pub fn complete(self, body: Vec<u8>) -> Request {
        Request::Send {
            target: self.target,
            body,
        }
    }
}

/// Outcome of parsing one header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Complete(Request),
    AwaitingBody(PendingSend),
}

/// Parses one line. A trailing `\n` or `\r\n` is stripped if present.
pub fn parse_line(line: &[u8]) -> Result<Parsed, ValidationError> {
    let line = strip_terminator(line);
    let (keyword, rest) = split_keyword(line);

    // Only the keyword is case-folded; arguments keep their bytes.
    let keyword = String::from_utf8_lossy(keyword).to_ascii_uppercase();
    let kind = match CommandKind::from_keyword(&keyword) {
        Some(kind) => kind,
        None => return Err(ValidationError::UnknownCommand(keyword)),
    };

    let args = std::str::from_utf8(rest)
        .map_err(|_| ValidationError::InvalidUtf8)?
        .trim();

    let request = match kind {
        CommandKind::Register => Request::Register(Handle::parse(args)?),
        CommandKind::Join => Request::Join(ChannelName::parse(args)?),
        CommandKind::Leave => Request::Leave(ChannelName::parse(args)?),
        CommandKind::Send => return parse_send_header(args).map(Parsed::AwaitingBody),
        CommandKind::ListChannels => Request::ListChannels,
        CommandKind::ListUsers => Request::ListUsers,
    };

    Ok(Parsed::Complete(request))
}

/// Parses a complete frame held in one buffer: the header line and, for
/// `SEND`, the body bytes after its terminator.
///
/// Bytes past the declared body length are ignored.
pub fn parse_command(input: &[u8], sender: Option<&Handle>) -> Result<Command, ValidationError> {
    let (header, rest) = match input.iter().position(|b| *b == b'\n') {
        Some(newline) => input.split_at(newline + 1),
        None => (input, &[][..]),
    };

    let request = match parse_line(header)? {
        Parsed::Complete(request) => request,
        Parsed::AwaitingBody(pending) => {
            let body = rest
                .get(..pending.length)
                .ok_or(ValidationError::ShortBody {
                    expected: pending.length,
                    actual: rest.len(),
                })?
                .to_vec();
            pending.complete(body)
        }
    };

    Ok(request.into_command(sender.cloned()))
}

/// True for lines holding nothing but whitespace.
pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

fn parse_send_header(args: &str) -> Result<PendingSend, ValidationError> {
    let (recipient, rest) = match args.split_once(char::is_whitespace) {
        Some((recipient, rest)) => (recipient, rest.trim()),
        None => (args, ""),
    };

    let target = Target::parse(recipient)?;

    if rest.is_empty() {
        return Err(ValidationError::MissingLength);
    }

    let length: usize = rest
        .parse()
        .map_err(|_| ValidationError::InvalidLength(rest.to_string()))?;

    if length == 0 {
        return Err(ValidationError::ZeroLength);
    }

    Ok(PendingSend { target, length })
}

pub(crate) fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Splits at the first whitespace run after skipping leading whitespace.
fn split_keyword(line: &[u8]) -> (&[u8], &[u8]) {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let (_, line) = line.split_at(start);

    match line.iter().position(u8::is_ascii_whitespace) {
        Some(end) => line.split_at(end),
        None => (line, &[][..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(line: &str) -> Request {
        match parse_line(line.as_bytes()) {
            Ok(Parsed::Complete(request)) => request,
            other => panic!("expected complete request for {line:?}, got {other:?}"),
        }
    }

    fn pending(line: &str) -> PendingSend {
        match parse_line(line.as_bytes()) {
            Ok(Parsed::AwaitingBody(pending)) => pending,
            other => panic!("expected pending send for {line:?}, got {other:?}"),
        }
    }

    fn error(line: &str) -> ValidationError {
        match parse_line(line.as_bytes()) {
            Err(err) => err,
            Ok(parsed) => panic!("expected error for {line:?}, got {parsed:?}"),
        }
    }

    #[test]
    fn test_register() {
        assert_eq!(
            complete("REG @alice\r\n"),
            Request::Register(Handle::parse("@alice").unwrap())
        );
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        assert_eq!(complete("reg @alice").kind(), CommandKind::Register);
        assert_eq!(complete("Join #rust").kind(), CommandKind::Join);
        assert_eq!(complete("chns").kind(), CommandKind::ListChannels);
    }

    #[test]
    fn test_arguments_keep_their_case() {
        assert_eq!(
            complete("join #RustLang"),
            Request::Join(ChannelName::parse("#RustLang").unwrap())
        );
    }

    #[test]
    fn test_register_empty_vs_sigil() {
        assert_eq!(error("REG"), ValidationError::EmptyHandle);
        assert_eq!(error("REG    \r\n"), ValidationError::EmptyHandle);
        assert_eq!(error("REG alice"), ValidationError::HandleSigil);
    }

    #[test]
    fn test_join_and_leave_require_channel_sigil() {
        assert_eq!(error("JOIN general"), ValidationError::ChannelSigil);
        assert_eq!(error("LEAVE general"), ValidationError::ChannelSigil);
        assert_eq!(error("JOIN"), ValidationError::EmptyChannel);
        assert_eq!(error("LEAVE  "), ValidationError::EmptyChannel);
        assert_eq!(
            complete("LEAVE #general"),
            Request::Leave(ChannelName::parse("#general").unwrap())
        );
    }

    #[test]
    fn test_send_header() {
        let send = pending("SEND #general 5\r\n");
        assert_eq!(send.target, Target::parse("#general").unwrap());
        assert_eq!(send.length, 5);

        let send = pending("send @bob   12");
        assert_eq!(send.target, Target::parse("@bob").unwrap());
        assert_eq!(send.length, 12);
    }

    #[test]
    fn test_send_recipient_errors() {
        assert_eq!(error("SEND"), ValidationError::EmptyRecipient);
        assert_eq!(error("SEND bob 5"), ValidationError::RecipientSigil);
    }

    #[test]
    fn test_send_length_errors_are_distinct() {
        assert_eq!(error("SEND #general"), ValidationError::MissingLength);
        assert_eq!(
            error("SEND #general five"),
            ValidationError::InvalidLength("five".to_string())
        );
        assert_eq!(
            error("SEND #general -3"),
            ValidationError::InvalidLength("-3".to_string())
        );
        assert_eq!(error("SEND #general 0"), ValidationError::ZeroLength);
    }

    #[test]
    fn test_list_commands_ignore_arguments() {
        assert_eq!(complete("CHNS"), Request::ListChannels);
        assert_eq!(complete("USRS extra words"), Request::ListUsers);
    }

    #[test]
    fn test_unknown_command_reports_uppercased_keyword() {
        assert_eq!(
            error("msg #general 5"),
            ValidationError::UnknownCommand("MSG".to_string())
        );
    }

    #[test]
    fn test_leading_whitespace_before_keyword() {
        assert_eq!(complete("   USRS").kind(), CommandKind::ListUsers);
    }

    #[test]
    fn test_non_utf8_arguments_rejected() {
        assert_eq!(
            parse_line(b"REG @\xff\xfe"),
            Err(ValidationError::InvalidUtf8)
        );
    }

    #[test]
    fn test_parse_command_with_inline_body() {
        let alice = Handle::parse("@alice").unwrap();
        let cmd = parse_command(b"SEND #general 5\r\nhello", Some(&alice)).unwrap();

        assert_eq!(cmd.kind, CommandKind::Send);
        assert_eq!(cmd.sender, Some(alice));
        assert_eq!(cmd.target, Some(Target::parse("#general").unwrap()));
        assert_eq!(cmd.body, Some(b"hello".to_vec()));
    }

    #[test]
    fn test_parse_command_body_may_contain_newlines() {
        let cmd = parse_command(b"SEND @bob 11\r\nline1\nline2", None).unwrap();
        assert_eq!(cmd.body, Some(b"line1\nline2".to_vec()));
    }

    #[test]
    fn test_parse_command_short_body() {
        assert_eq!(
            parse_command(b"SEND @bob 10\r\nhi", None),
            Err(ValidationError::ShortBody {
                expected: 10,
                actual: 2
            })
        );
        assert_eq!(
            parse_command(b"SEND @bob 3", None),
            Err(ValidationError::ShortBody {
                expected: 3,
                actual: 0
            })
        );
    }

    #[test]
    fn test_parse_command_without_sender() {
        let cmd = parse_command(b"CHNS\n", None).unwrap();
        assert_eq!(cmd.kind, CommandKind::ListChannels);
        assert!(cmd.sender.is_none());
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(b""));
        assert!(is_blank(b" \r\n"));
        assert!(!is_blank(b" x "));
    }
}
