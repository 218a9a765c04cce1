//! Streaming frame decoder for tokio.
//!
//! Wraps [`parse_line`] so a connection can be read with
//! `FramedRead<R, CommandCodec>`: header lines are split on `\n`, and after a
//! valid `SEND` header the decoder switches to counting out exactly the
//! declared number of body bytes, newlines included.
//!
//! Validation problems are yielded as [`Frame::Invalid`] items instead of
//! decoder errors, since a decoder error ends the stream and a bad command
//! must not end the connection.

use std::io;
use std::mem;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::parse::{is_blank, parse_line, strip_terminator, Parsed, PendingSend, Request};
use crate::ValidationError;

/// Default maximum header line length in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 4096;

/// Default maximum SEND body length in bytes (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1_048_576;

/// One item produced by [`CommandCodec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A fully parsed request.
    Request(Request),

    /// A line or body that failed validation. The stream continues.
    Invalid(ValidationError),

    /// A SEND header was accepted and its body is not fully buffered yet.
    /// The next item is the completed request or a short-body error.
    AwaitingBody { length: usize },
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Header,
    Body(PendingSend),
    /// Skipping the body of a rejected SEND.
    DiscardBody { remaining: usize },
    /// Skipping the tail of an over-long line.
    DiscardLine,
}

/// Decoder for the client command stream.
#[derive(Debug)]
pub struct CommandCodec {
    state: State,
    /// Index of next byte to check for newline
    next_index: usize,
    max_line_bytes: usize,
    max_body_bytes: usize,
}

impl CommandCodec {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_LINE_BYTES, DEFAULT_MAX_BODY_BYTES)
    }

    pub fn with_limits(max_line_bytes: usize, max_body_bytes: usize) -> Self {
        Self {
            state: State::Header,
            next_index: 0,
            max_line_bytes,
            max_body_bytes,
        }
    }

    /// Declared length of the body being waited for, if any.
    pub fn pending_body_len(&self) -> Option<usize> {
        match &self.state {
            State::Body(pending) => Some(pending.length),
            _ => None,
        }
    }

    /// Gives up on the pending body after `buffered` of its bytes were read.
    ///
    /// The caller drops those buffered bytes. The rest of the declared length
    /// is skipped as it arrives, so body bytes are never parsed as commands.
    /// Returns the short-body error to report, or `None` if no body was
    /// pending.
    pub fn abandon_body(&mut self, buffered: usize) -> Option<ValidationError> {
        let expected = self.pending_body_len()?;
        let actual = buffered.min(expected);
        let remaining = expected - actual;
        trace!(expected, actual, remaining, "abandoning body");

        self.state = if remaining > 0 {
            State::DiscardBody { remaining }
        } else {
            State::Header
        };
        self.next_index = 0;

        Some(ValidationError::ShortBody { expected, actual })
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<Frame> {
        let content = strip_terminator(line);
        if content.len() > self.max_line_bytes {
            return Some(Frame::Invalid(ValidationError::LineTooLong {
                max: self.max_line_bytes,
            }));
        }
        if is_blank(content) {
            return None;
        }

        match parse_line(content) {
            Ok(Parsed::Complete(request)) => Some(Frame::Request(request)),
            Ok(Parsed::AwaitingBody(pending)) if pending.length > self.max_body_bytes => {
                let length = pending.length;
                trace!(length, "discarding oversized body");
                self.state = State::DiscardBody { remaining: length };
                Some(Frame::Invalid(ValidationError::BodyTooLarge {
                    length,
                    max: self.max_body_bytes,
                }))
            }
            Ok(Parsed::AwaitingBody(pending)) => {
                self.state = State::Body(pending);
                None
            }
            Err(err) => Some(Frame::Invalid(err)),
        }
    }
}

impl Default for CommandCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for CommandCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        loop {
            match mem::take(&mut self.state) {
                State::Header => {
                    let search_from = self.next_index.min(src.len());
                    let newline = src
                        .get(search_from..)
                        .and_then(|tail| tail.iter().position(|b| *b == b'\n'));

                    let Some(offset) = newline else {
                        if src.len() > self.max_line_bytes {
                            src.clear();
                            self.next_index = 0;
                            self.state = State::DiscardLine;
                            return Ok(Some(Frame::Invalid(ValidationError::LineTooLong {
                                max: self.max_line_bytes,
                            })));
                        }
                        self.next_index = src.len();
                        return Ok(None);
                    };

                    let line = src.split_to(search_from + offset + 1);
                    self.next_index = 0;

                    if let Some(frame) = self.decode_line(&line) {
                        return Ok(Some(frame));
                    }
                    if let Some(length) = self.pending_body_len() {
                        if src.len() < length {
                            return Ok(Some(Frame::AwaitingBody { length }));
                        }
                    }
                }
                State::Body(pending) => {
                    if src.len() < pending.length {
                        src.reserve(pending.length - src.len());
                        self.state = State::Body(pending);
                        return Ok(None);
                    }
                    let body = src.split_to(pending.length).to_vec();
                    return Ok(Some(Frame::Request(pending.complete(body))));
                }
                State::DiscardBody { remaining } => {
                    let skip = remaining.min(src.len());
                    src.advance(skip);
                    if skip < remaining {
                        self.state = State::DiscardBody {
                            remaining: remaining - skip,
                        };
                        return Ok(None);
                    }
                }
                State::DiscardLine => match src.iter().position(|b| *b == b'\n') {
                    Some(newline) => src.advance(newline + 1),
                    None => {
                        src.clear();
                        self.state = State::DiscardLine;
                        return Ok(None);
                    }
                },
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        match mem::take(&mut self.state) {
            State::Body(pending) => {
                let actual = src.len();
                src.clear();
                Ok(Some(Frame::Invalid(ValidationError::ShortBody {
                    expected: pending.length,
                    actual,
                })))
            }
            State::DiscardBody { .. } | State::DiscardLine => {
                src.clear();
                Ok(None)
            }
            State::Header if src.is_empty() => Ok(None),
            State::Header => {
                // Final line without a terminator.
                let line = src.split_to(src.len());
                self.next_index = 0;
                match self.decode_line(&line) {
                    Some(frame) => Ok(Some(frame)),
                    None => match mem::take(&mut self.state) {
                        State::Body(pending) => Ok(Some(Frame::Invalid(ValidationError::ShortBody {
                            expected: pending.length,
                            actual: 0,
                        }))),
                        _ => Ok(None),
                    },
                }
            }
        }
    }
}
