//! hubchat protocol - commands, parsing and framing for the chat wire format
//!
//! This crate turns the raw client byte stream into validated commands and
//! formats the lines the server writes back. It holds no shared state, so
//! every function here is safe to call from any number of sessions at once.
//!
//! ```text
//! REG <@handle>                     -> "OK\n" | "ERR username taken\n"
//! JOIN <#channel> / LEAVE <#channel>
//! SEND <#channel|@handle> <len>\r\n<len bytes of body>
//! CHNS / USRS
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod ident;
pub mod parse;
pub mod wire;

pub use codec::{CommandCodec, Frame};
pub use command::{Command, CommandKind};
pub use error::ValidationError;
pub use ident::{ChannelName, Handle, Target, CHANNEL_SIGIL, USER_SIGIL};
pub use parse::{parse_command, parse_line, Parsed, PendingSend, Request};
