//! Server-to-client line formatting.
//!
//! Every reply is a single `\n`-terminated line. Message bodies are copied
//! verbatim, so a delivered line is only text if the body was.

use std::fmt::Display;

use crate::Handle;

/// Prefix of every error reply.
pub const ERROR_PREFIX: &str = "ERR ";

/// Reply to a successful registration.
pub const OK_LINE: &[u8] = b"OK\n";

/// `ERR <reason>\n`
pub fn error_line(reason: impl Display) -> Vec<u8> {
    format!("{ERROR_PREFIX}{reason}\n").into_bytes()
}

/// `<sender>: <body>\n`, the line every channel member receives.
pub fn channel_line(sender: &Handle, body: &[u8]) -> Vec<u8> {
    let sender = sender.as_str().as_bytes();
    let mut line = Vec::with_capacity(sender.len() + body.len() + 3);
    line.extend_from_slice(sender);
    line.extend_from_slice(b": ");
    line.extend_from_slice(body);
    line.push(b'\n');
    line
}

/// `<body>\n`, the line a direct message recipient receives.
pub fn direct_line(body: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(body.len() + 1);
    line.extend_from_slice(body);
    line.push(b'\n');
    line
}

/// Name listing: each name followed by a space, joined with `", "`.
///
/// `["#a", "#b"]` becomes `"#a , #b \n"`; no names becomes `"\n"`.
pub fn list_line<I, S>(names: I) -> Vec<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = names
        .into_iter()
        .map(|name| format!("{} ", name.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");
    line.push('\n');
    line.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_line() {
        assert_eq!(error_line("username taken"), b"ERR username taken\n");
    }

    #[test]
    fn test_channel_line_keeps_body_bytes() {
        let sender = Handle::parse("@alice").unwrap();
        assert_eq!(channel_line(&sender, b"hi\x00there"), b"@alice: hi\x00there\n");
    }

    #[test]
    fn test_direct_line() {
        assert_eq!(direct_line(b"hello"), b"hello\n");
    }

    #[test]
    fn test_list_line_format() {
        assert_eq!(list_line(["#a", "#b"]), b"#a , #b \n");
        assert_eq!(list_line(["@solo"]), b"@solo \n");
        assert_eq!(list_line(Vec::<String>::new()), b"\n");
    }
}
